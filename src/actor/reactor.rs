//! The Reactor's job is to keep the tab bar coherent with the embedded
//! clients.
//!
//! It takes window-system events one at a time, updates the registry and the
//! selection, talks back to the clients through the embedding protocol and
//! redraws the bar after every change that could affect it.

mod embed;
mod error;
mod events;

#[cfg(test)]
mod testing;

pub use error::ReactorError;
use events::{CommandEventHandler, PointerEventHandler, WindowEventHandler};
use serde::Deserialize;
use tracing::{debug, error, instrument, trace};

use crate::common::config::Config;
use crate::layout_engine::{BarStyle, layout_tab_bar};
use crate::model::{Registry, Selection};
use crate::sys::event::{Event, RequestError};
use crate::sys::geometry::{Rect, Size};
use crate::sys::hotkey::Modifiers;
use crate::sys::process::Launcher;
use crate::sys::window_server::{WindowId, WindowServer};
use crate::sys::xembed::FocusDetail;
use crate::ui::Renderer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub type Result<T, E = ReactorError> = std::result::Result<T, E>;

/// Actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Launch another instance of the embedded command.
    Spawn,
    /// Select the tab `step` positions over; `0` goes back to the last one.
    Rotate(i32),
    /// Move the selected tab `step` positions over.
    MoveTab(i32),
    Select(usize),
    /// Ask the selected client to close, and kill it when asked again.
    KillClient,
    /// Let the next new client take focus even in background mode.
    FocusOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Launch the command again whenever the last tab closes.
    pub fill_again: bool,
    /// Launch the command once at startup.
    pub initial_spawn: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            fill_again: false,
            initial_spawn: true,
        }
    }
}

/// Scroll indicators of the last drawn bar.
#[derive(Debug, Clone, Copy, Default)]
struct Indicators {
    left: Option<Rect>,
    right: Option<Rect>,
}

pub struct Reactor {
    config: Config,
    options: Options,
    server: Box<dyn WindowServer>,
    renderer: Box<dyn Renderer>,
    launcher: Launcher,
    registry: Registry,
    selection: Selection,
    /// The client that holds the embedding "active" state.
    active: Option<WindowId>,
    size: Size,
    bar_height: u32,
    numlock: Modifiers,
    /// Whether the next managed client gets selected.
    next_focus: bool,
    /// Frame title while no client is embedded.
    identity: String,
    /// Frame id in the form handed to spawned clients.
    window_id: String,
    indicators: Indicators,
    running: bool,
}

impl Reactor {
    pub fn new(
        config: Config,
        options: Options,
        launcher: Launcher,
        server: Box<dyn WindowServer>,
        renderer: Box<dyn Renderer>,
        size: Size,
    ) -> Reactor {
        let bar_height = renderer.font_height() + 2;
        let mut identity = format!("tabbed-{VERSION} ::");
        for arg in launcher.command() {
            identity.push(' ');
            identity.push_str(arg);
        }
        let window_id = server.frame().to_string();
        let next_focus = config.settings.foreground;
        Reactor {
            config,
            options,
            server,
            renderer,
            launcher,
            registry: Registry::new(),
            selection: Selection::new(),
            active: None,
            size,
            bar_height,
            numlock: Modifiers::empty(),
            next_focus,
            identity,
            window_id,
            indicators: Indicators::default(),
            running: true,
        }
    }

    pub fn frame(&self) -> WindowId { self.server.frame() }

    /// Processes events until the frame is asked to close, then releases
    /// every client.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        while self.running {
            let event = self.server.next_event()?;
            self.handle_event(event)?;
        }
        self.shutdown()
    }

    /// Shows the frame's identity and launches the first client.
    pub fn start(&mut self) -> Result<()> {
        self.server.sync()?;
        self.select_none()?;
        if self.options.initial_spawn {
            self.spawn();
        }
        Ok(())
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::Expose { .. } | Event::PropertyNotify { .. } | Event::Ignored => {
                trace!(?event, "Event")
            }
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self, event), fields(kind = event.kind()))]
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        self.log_event(&event);
        match event {
            Event::ButtonPress { window, x, y, button } => {
                PointerEventHandler::handle_button_press(self, window, x, y, button)
            }
            Event::ConfigureNotify { window, width, height } => {
                WindowEventHandler::handle_configure_notify(self, window, Size::new(width, height))
            }
            Event::ConfigureRequest { window } => {
                WindowEventHandler::handle_configure_request(self, window)
            }
            Event::CreateNotify { window } => WindowEventHandler::handle_create_notify(self, window),
            Event::DestroyNotify { window } => {
                WindowEventHandler::handle_destroy_notify(self, window)
            }
            Event::Expose { window, count } => WindowEventHandler::handle_expose(self, window, count),
            Event::FocusIn { ungrab, .. } => WindowEventHandler::handle_focus_in(self, ungrab),
            Event::KeyPress { keycode, state } => {
                CommandEventHandler::handle_key_press(self, keycode, state)
            }
            Event::MapRequest { window } => WindowEventHandler::handle_map_request(self, window),
            Event::MapNotify { window } => WindowEventHandler::handle_mapped(self, window, true),
            Event::UnmapNotify { window } => WindowEventHandler::handle_mapped(self, window, false),
            Event::PropertyNotify { window, property, deleted } => {
                WindowEventHandler::handle_property_notify(self, window, property, deleted)
            }
            Event::ClientMessage { window, message } => self.handle_client_message(window, message),
            Event::MappingNotify => {
                self.server.refresh_keyboard_mapping()?;
                Ok(())
            }
            Event::Error(err) => self.handle_request_error(err),
            Event::Ignored => Ok(()),
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        CommandEventHandler::handle_command(self, command)
    }

    fn handle_request_error(&mut self, err: RequestError) -> Result<()> {
        if err.is_benign() {
            trace!(%err, "ignoring X error");
            return Ok(());
        }
        error!("fatal error: {err}");
        Err(ReactorError::Fatal(err))
    }

    /// Makes client `index` current and hands it the focus.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if !self.selection.select(index, self.registry.len()) {
            trace!(index, "ignoring selection of a missing tab");
            return Ok(());
        }
        self.focus_current(FocusDetail::Current)
    }

    pub fn rotate(&mut self, step: i32) -> Result<()> {
        match self.selection.rotate_target(step, self.registry.len()) {
            Some(target) => self.select(target),
            None => Ok(()),
        }
    }

    pub fn move_tab(&mut self, step: i32) -> Result<()> {
        let Some((from, to)) = self.selection.move_by(step, self.registry.len()) else {
            return Ok(());
        };
        self.registry.swap(from, to);
        self.draw_bar()
    }

    pub fn spawn(&self) { self.launcher.spawn_or_log(&self.window_id); }

    /// Gives the current client the frame: geometry, stacking, input focus
    /// and the embedding active state. Falls back to the empty frame when
    /// nothing is selected.
    fn focus_current(&mut self, detail: FocusDetail) -> Result<()> {
        let Some(client) = self.selection.current().and_then(|i| self.registry.get(i)) else {
            return self.select_none();
        };
        let (handle, title) = (client.handle, client.title.clone());

        let area = self.client_area();
        self.server.resize_client(handle, area)?;
        self.server.raise(handle)?;
        self.server.set_input_focus(handle)?;
        self.activate(handle, detail)?;
        self.server.set_frame_title(title.as_str())?;
        self.draw_bar()
    }

    fn select_none(&mut self) -> Result<()> {
        self.selection.clear();
        self.active = None;
        self.server.set_frame_title(&self.identity)?;
        let frame = self.server.frame();
        self.server.raise(frame)?;
        self.draw_bar()
    }

    /// The region below the bar that the selected client covers.
    fn client_area(&self) -> Rect {
        Rect::new(
            0,
            self.bar_height as i32,
            self.size.width,
            self.size.height.saturating_sub(self.bar_height),
        )
    }

    pub fn draw_bar(&mut self) -> Result<()> {
        let settings = &self.config.settings;
        let style = BarStyle {
            width: self.size.width,
            height: self.bar_height,
            tab_width: settings.tab_width,
            before: &settings.before,
            after: &settings.after,
        };
        let titles = self.registry.titles();
        let layout =
            layout_tab_bar(&*self.renderer, &style, &titles, self.selection.current(), &self.identity);

        for client in self.registry.iter_mut() {
            client.tab_end = None;
        }
        for slot in &layout.tabs {
            if let Some(client) = self.registry.get_mut(slot.index) {
                client.tab_end = Some(slot.end());
            }
        }
        self.indicators = Indicators {
            left: layout.left,
            right: layout.right,
        };

        for command in &layout.commands {
            self.renderer.draw(command)?;
        }
        self.renderer.present(Rect::new(0, 0, self.size.width, self.bar_height))?;
        Ok(())
    }

    /// Closes every client, hands the windows back to the root and destroys
    /// the frame.
    pub fn shutdown(&mut self) -> Result<()> {
        self.options.fill_again = false;
        for handle in self.registry.handles() {
            let Some(index) = self.registry.find(handle) else { continue };
            self.select(index)?;
            self.close_selected()?;
            self.close_selected()?;
            self.server.reparent_to_root(handle)?;
            WindowEventHandler::unmanage(self, index)?;
        }
        self.server.destroy_frame()?;
        self.server.sync()?;
        Ok(())
    }
}
