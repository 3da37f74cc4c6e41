//! The embedder side of the XEmbed protocol.

use tracing::{debug, info, trace};

use super::{Reactor, Result};
use crate::sys::event::ClientMessage;
use crate::sys::window_server::{Recipient, WindowId};
use crate::sys::xembed::{EmbedMessage, FocusDetail, XEmbedMessage};

impl Reactor {
    /// Hands the active state to `handle`, deactivating the client that held
    /// it before if that one is still embedded.
    pub(super) fn activate(&mut self, handle: WindowId, detail: FocusDetail) -> Result<()> {
        if let Some(previous) = self.active.filter(|&window| window != handle) {
            if self.registry.find(previous).is_some() {
                self.send_to_client(previous, EmbedMessage::new(XEmbedMessage::WindowDeactivate))?;
                self.send_to_client(previous, EmbedMessage::new(XEmbedMessage::FocusOut))?;
            }
        }
        self.send_to_client(handle, EmbedMessage::new(XEmbedMessage::WindowActivate))?;
        self.send_to_client(handle, EmbedMessage::focus_in(detail))?;
        self.active = Some(handle);
        Ok(())
    }

    pub(super) fn announce_embedded(&mut self, handle: WindowId) -> Result<()> {
        let frame = self.server.frame();
        self.server.send_embed(Recipient::Root, handle, EmbedMessage::embedded_notify(frame))?;
        Ok(())
    }

    fn send_to_client(&mut self, window: WindowId, message: EmbedMessage) -> Result<()> {
        self.server.send_embed(Recipient::Client, window, message)?;
        Ok(())
    }

    /// Asks the selected client to close. Clients that do not speak
    /// `WM_DELETE_WINDOW`, or were already asked once, are killed.
    pub(super) fn close_selected(&mut self) -> Result<()> {
        let Some(index) = self.selection.current() else { return Ok(()) };
        let Some(client) = self.registry.get(index) else { return Ok(()) };
        let (handle, asked) = (client.handle, client.close_requested);

        if !asked && self.server.supports_delete(handle)? {
            debug!(window = handle, "requesting close");
            self.server.send_delete(handle)?;
            if let Some(client) = self.registry.get_mut(index) {
                client.close_requested = true;
            }
        } else {
            debug!(window = handle, "killing client");
            self.server.kill_client(handle)?;
        }
        Ok(())
    }

    pub(super) fn handle_client_message(
        &mut self,
        window: WindowId,
        message: ClientMessage,
    ) -> Result<()> {
        match message {
            ClientMessage::DeleteWindow if window == self.server.frame() => {
                info!("frame closed, shutting down");
                self.running = false;
                Ok(())
            }
            ClientMessage::XEmbed(message) => self.handle_embed_message(window, message),
            _ => {
                trace!(window, ?message, "ignoring client message");
                Ok(())
            }
        }
    }

    fn handle_embed_message(&mut self, window: WindowId, message: EmbedMessage) -> Result<()> {
        let Some(index) = self.registry.find(window) else {
            trace!(window, "embedding message from an unknown window");
            return Ok(());
        };
        match message.kind {
            XEmbedMessage::RequestFocus => self.select(index),
            XEmbedMessage::FocusNext => self.focus_neighbour(index, 1, FocusDetail::First),
            XEmbedMessage::FocusPrev => self.focus_neighbour(index, -1, FocusDetail::Last),
            kind => {
                debug!(window, ?kind, "ignoring embedding message");
                Ok(())
            }
        }
    }

    /// Moves focus out of a client that ran off one end of its focus chain.
    fn focus_neighbour(&mut self, index: usize, step: i32, detail: FocusDetail) -> Result<()> {
        let len = self.registry.len();
        let target = (index as i64 + i64::from(step)).rem_euclid(len as i64) as usize;
        self.selection.select(target, len);
        self.focus_current(detail)
    }
}
