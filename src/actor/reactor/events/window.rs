use tracing::{debug, trace};

use crate::actor::reactor::{Reactor, Result};
use crate::model::Title;
use crate::sys::event::Property;
use crate::sys::geometry::Size;
use crate::sys::window_server::WindowId;
use crate::sys::xembed::FocusDetail;

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_create_notify(reactor: &mut Reactor, window: WindowId) -> Result<()> {
        if window == reactor.server.frame() || reactor.registry.find(window).is_some() {
            return Ok(());
        }
        Self::manage(reactor, window)
    }

    pub fn handle_destroy_notify(reactor: &mut Reactor, window: WindowId) -> Result<()> {
        match reactor.registry.find(window) {
            Some(index) => Self::unmanage(reactor, index),
            None => Ok(()),
        }
    }

    pub fn handle_map_request(reactor: &mut Reactor, window: WindowId) -> Result<()> {
        if reactor.registry.find(window).is_some() {
            reactor.server.map(window)?;
            return Ok(());
        }
        Self::handle_create_notify(reactor, window)
    }

    pub fn handle_mapped(reactor: &mut Reactor, window: WindowId, mapped: bool) -> Result<()> {
        if let Some(client) = reactor.registry.find(window).and_then(|i| reactor.registry.get_mut(i))
        {
            client.mapped = mapped;
        }
        Ok(())
    }

    pub fn handle_configure_request(reactor: &mut Reactor, window: WindowId) -> Result<()> {
        if reactor.registry.find(window).is_none() {
            trace!(window, "ignoring configure request of an unmanaged window");
            return Ok(());
        }
        let area = reactor.client_area();
        reactor.server.configure(window, area)?;
        Ok(())
    }

    pub fn handle_configure_notify(reactor: &mut Reactor, window: WindowId, size: Size) -> Result<()> {
        if window != reactor.server.frame() || size == reactor.size {
            return Ok(());
        }
        debug!(?size, "frame resized");
        reactor.size = size;
        reactor.renderer.resize_buffer(size)?;
        let selected = reactor.selection.current().and_then(|i| reactor.registry.get(i));
        if let Some(handle) = selected.map(|client| client.handle) {
            let area = reactor.client_area();
            reactor.server.resize_client(handle, area)?;
        }
        reactor.server.sync()?;
        Ok(())
    }

    pub fn handle_expose(reactor: &mut Reactor, window: WindowId, count: u16) -> Result<()> {
        if count == 0 && window == reactor.server.frame() {
            reactor.draw_bar()?;
        }
        Ok(())
    }

    /// The frame got the input focus back, e.g. from the window manager;
    /// pass it on to the selected client.
    pub fn handle_focus_in(reactor: &mut Reactor, ungrab: bool) -> Result<()> {
        if ungrab || reactor.server.input_focus()? != Some(reactor.server.frame()) {
            return Ok(());
        }
        reactor.focus_current(FocusDetail::Current)
    }

    pub fn handle_property_notify(
        reactor: &mut Reactor,
        window: WindowId,
        property: Property,
        deleted: bool,
    ) -> Result<()> {
        if deleted || property != Property::Title {
            return Ok(());
        }
        match reactor.registry.find(window) {
            Some(index) => Self::update_title(reactor, index),
            None => Ok(()),
        }
    }

    fn update_title(reactor: &mut Reactor, index: usize) -> Result<()> {
        let Some(handle) = reactor.registry.get(index).map(|c| c.handle) else { return Ok(()) };
        let title = Title::new(&reactor.server.fetch_title(handle)?.unwrap_or_default());
        if reactor.selection.current() == Some(index) {
            reactor.server.set_frame_title(title.as_str())?;
        }
        if let Some(client) = reactor.registry.get_mut(index) {
            client.title = title;
        }
        reactor.draw_bar()
    }

    /// Takes `window` over as a new leftmost tab.
    pub fn manage(reactor: &mut Reactor, window: WindowId) -> Result<()> {
        reactor.numlock = reactor.server.numlock_mask()?;
        let frame = reactor.server.frame();
        reactor.server.unmap(window)?;
        reactor.server.reparent(window, frame, 0, reactor.bar_height as i32)?;
        reactor.server.select_client_input(window)?;
        reactor.server.sync()?;
        let hotkeys = reactor.config.hotkeys();
        reactor.server.grab_keys(window, &hotkeys, reactor.numlock)?;

        if let Err(err) = reactor.registry.insert_front(window) {
            debug!("{err}");
            return Ok(());
        }
        reactor.selection.on_insert_front();
        debug!(window, clients = reactor.registry.len(), "managing window");

        let title = Title::new(&reactor.server.fetch_title(window)?.unwrap_or_default());
        if let Some(client) = reactor.registry.get_mut(0) {
            client.title = title;
        }
        reactor.server.lower(window)?;
        reactor.server.map(window)?;
        reactor.announce_embedded(window)?;
        reactor.server.sync()?;

        let target = match (reactor.next_focus, reactor.selection.current()) {
            (false, Some(current)) => current,
            _ => 0,
        };
        reactor.next_focus = reactor.config.settings.foreground;
        reactor.select(target)
    }

    /// Forgets the client at `index` after its window went away and moves
    /// the selection on.
    pub fn unmanage(reactor: &mut Reactor, index: usize) -> Result<()> {
        let Some(client) = reactor.registry.remove(index) else {
            return reactor.draw_bar();
        };
        debug!(window = client.handle, clients = reactor.registry.len(), "released window");
        if reactor.active == Some(client.handle) {
            reactor.active = None;
        }
        reactor.selection.on_remove(index, reactor.registry.len());
        reactor.focus_current(FocusDetail::Current)?;

        if reactor.registry.is_empty() && reactor.options.fill_again {
            reactor.spawn();
        }
        reactor.server.sync()?;
        Ok(())
    }
}
