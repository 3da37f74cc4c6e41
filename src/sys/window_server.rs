//! The narrow interface the reactor uses to talk to the window system.

use thiserror::Error;

use super::event::Event;
use super::geometry::Rect;
use super::hotkey::{Hotkey, Keysym, Modifiers};
use super::xembed::EmbedMessage;

/// Window identifier assigned by the X server.
pub type WindowId = u32;

#[derive(Debug, Error)]
pub enum WindowServerError {
    #[error("connection to the X server failed: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),
    #[error("X request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),
    #[error("could not allocate an X resource: {0}")]
    Resource(#[from] x11rb::errors::ReplyOrIdError),
}

pub type Result<T, E = WindowServerError> = std::result::Result<T, E>;

/// Where an embedding message is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The client window the message is about.
    Client,
    /// The root window, with the client named in the message's window field.
    Root,
}

/// Requests are fire-and-forget: failures caused by a window that has since
/// been destroyed come back later as [`Event::Error`]. Queries that race a
/// destroyed window report "nothing" instead of failing.
pub trait WindowServer {
    /// The frame window hosting the tab bar and the clients.
    fn frame(&self) -> WindowId;

    /// Blocks until the next event arrives.
    fn next_event(&mut self) -> Result<Event>;

    fn reparent(&mut self, window: WindowId, parent: WindowId, x: i32, y: i32) -> Result<()>;
    fn reparent_to_root(&mut self, window: WindowId) -> Result<()>;
    fn map(&mut self, window: WindowId) -> Result<()>;
    fn unmap(&mut self, window: WindowId) -> Result<()>;
    fn raise(&mut self, window: WindowId) -> Result<()>;
    fn lower(&mut self, window: WindowId) -> Result<()>;

    /// Forces a window's geometry, with no border.
    fn configure(&mut self, window: WindowId, rect: Rect) -> Result<()>;

    /// Resizes a client and tells it so with a synthetic configure event.
    fn resize_client(&mut self, window: WindowId, rect: Rect) -> Result<()>;

    /// Subscribes to property, structure and enter notifications of a client.
    fn select_client_input(&mut self, window: WindowId) -> Result<()>;

    fn fetch_title(&mut self, window: WindowId) -> Result<Option<String>>;
    fn set_frame_title(&mut self, title: &str) -> Result<()>;

    fn set_input_focus(&mut self, window: WindowId) -> Result<()>;
    fn input_focus(&mut self) -> Result<Option<WindowId>>;

    fn send_embed(
        &mut self,
        recipient: Recipient,
        window: WindowId,
        message: EmbedMessage,
    ) -> Result<()>;

    /// Whether the client advertises `WM_DELETE_WINDOW` in `WM_PROTOCOLS`.
    fn supports_delete(&mut self, window: WindowId) -> Result<bool>;
    fn send_delete(&mut self, window: WindowId) -> Result<()>;
    fn kill_client(&mut self, window: WindowId) -> Result<()>;

    /// Grabs every hotkey on `window` with each lock-modifier variant.
    fn grab_keys(&mut self, window: WindowId, hotkeys: &[Hotkey], numlock: Modifiers)
    -> Result<()>;

    /// The modifier bit NumLock is currently mapped to.
    fn numlock_mask(&mut self) -> Result<Modifiers>;
    fn keysym(&mut self, keycode: u8) -> Keysym;
    fn refresh_keyboard_mapping(&mut self) -> Result<()>;

    fn destroy_frame(&mut self) -> Result<()>;

    /// Flushes pending requests and waits until the server processed them.
    fn sync(&mut self) -> Result<()>;
}
