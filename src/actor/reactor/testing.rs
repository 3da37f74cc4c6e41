use std::cell::RefCell;
use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;

use super::{Options, Reactor};
use crate::common::collections::{HashMap, HashSet};
use crate::common::config::Config;
use crate::layout_engine::{DrawCommand, TextMeasure};
use crate::sys::event::{ClientMessage, Event};
use crate::sys::geometry::{Rect, Size};
use crate::sys::hotkey::{Hotkey, Keysym, Modifiers};
use crate::sys::process::Launcher;
use crate::sys::window_server::{Recipient, Result, WindowId, WindowServer};
use crate::sys::xembed::{EmbedMessage, XEmbedMessage};
use crate::ui::Renderer;

pub const FRAME: WindowId = 0x100;

/// Everything the reactor asked the window server to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Reparent {
        window: WindowId,
        parent: WindowId,
        x: i32,
        y: i32,
    },
    ReparentToRoot(WindowId),
    Map(WindowId),
    Unmap(WindowId),
    Raise(WindowId),
    Lower(WindowId),
    Configure(WindowId, Rect),
    ResizeClient(WindowId, Rect),
    SelectInput(WindowId),
    SetFrameTitle(String),
    SetInputFocus(WindowId),
    Embed(Recipient, WindowId, EmbedMessage),
    Delete(WindowId),
    Kill(WindowId),
    /// Window and number of hotkeys grabbed.
    GrabKeys(WindowId, usize),
    DestroyFrame,
    Sync,
}

#[derive(Default)]
pub struct FakeState {
    pub requests: Vec<Request>,
    /// Delivered in order; once empty the frame is closed.
    pub events: VecDeque<Event>,
    pub titles: HashMap<WindowId, String>,
    pub supports_delete: HashSet<WindowId>,
    pub input_focus: Option<WindowId>,
    pub keysyms: HashMap<u8, Keysym>,
    pub numlock: Modifiers,
    pub drawn: Vec<DrawCommand>,
    pub buffer: Option<Size>,
}

pub type Shared = Rc<RefCell<FakeState>>;

pub struct FakeServer(Shared);

impl FakeServer {
    fn record(&mut self, request: Request) -> Result<()> {
        self.0.borrow_mut().requests.push(request);
        Ok(())
    }
}

impl WindowServer for FakeServer {
    fn frame(&self) -> WindowId { FRAME }

    fn next_event(&mut self) -> Result<Event> {
        Ok(self.0.borrow_mut().events.pop_front().unwrap_or(Event::ClientMessage {
            window: FRAME,
            message: ClientMessage::DeleteWindow,
        }))
    }

    fn reparent(&mut self, window: WindowId, parent: WindowId, x: i32, y: i32) -> Result<()> {
        self.record(Request::Reparent { window, parent, x, y })
    }

    fn reparent_to_root(&mut self, window: WindowId) -> Result<()> {
        self.record(Request::ReparentToRoot(window))
    }

    fn map(&mut self, window: WindowId) -> Result<()> { self.record(Request::Map(window)) }

    fn unmap(&mut self, window: WindowId) -> Result<()> { self.record(Request::Unmap(window)) }

    fn raise(&mut self, window: WindowId) -> Result<()> { self.record(Request::Raise(window)) }

    fn lower(&mut self, window: WindowId) -> Result<()> { self.record(Request::Lower(window)) }

    fn configure(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        self.record(Request::Configure(window, rect))
    }

    fn resize_client(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        self.record(Request::ResizeClient(window, rect))
    }

    fn select_client_input(&mut self, window: WindowId) -> Result<()> {
        self.record(Request::SelectInput(window))
    }

    fn fetch_title(&mut self, window: WindowId) -> Result<Option<String>> {
        Ok(self.0.borrow().titles.get(&window).cloned())
    }

    fn set_frame_title(&mut self, title: &str) -> Result<()> {
        self.record(Request::SetFrameTitle(title.to_string()))
    }

    fn set_input_focus(&mut self, window: WindowId) -> Result<()> {
        self.record(Request::SetInputFocus(window))
    }

    fn input_focus(&mut self) -> Result<Option<WindowId>> { Ok(self.0.borrow().input_focus) }

    fn send_embed(
        &mut self,
        recipient: Recipient,
        window: WindowId,
        message: EmbedMessage,
    ) -> Result<()> {
        self.record(Request::Embed(recipient, window, message))
    }

    fn supports_delete(&mut self, window: WindowId) -> Result<bool> {
        Ok(self.0.borrow().supports_delete.contains(&window))
    }

    fn send_delete(&mut self, window: WindowId) -> Result<()> { self.record(Request::Delete(window)) }

    fn kill_client(&mut self, window: WindowId) -> Result<()> { self.record(Request::Kill(window)) }

    fn grab_keys(&mut self, window: WindowId, hotkeys: &[Hotkey], _: Modifiers) -> Result<()> {
        self.record(Request::GrabKeys(window, hotkeys.len()))
    }

    fn numlock_mask(&mut self) -> Result<Modifiers> { Ok(self.0.borrow().numlock) }

    fn keysym(&mut self, keycode: u8) -> Keysym {
        self.0.borrow().keysyms.get(&keycode).copied().unwrap_or(0)
    }

    fn refresh_keyboard_mapping(&mut self) -> Result<()> { Ok(()) }

    fn destroy_frame(&mut self) -> Result<()> { self.record(Request::DestroyFrame) }

    fn sync(&mut self) -> Result<()> { self.record(Request::Sync) }
}

/// 6px per char, 10px font: the bar is 12px tall.
pub struct FakeRenderer(Shared);

impl TextMeasure for FakeRenderer {
    fn text_width(&self, text: &str) -> u32 { 6 * text.chars().count() as u32 }

    fn font_height(&self) -> u32 { 10 }

    fn font_ascent(&self) -> u32 { 8 }
}

impl Renderer for FakeRenderer {
    fn resize_buffer(&mut self, size: Size) -> Result<()> {
        self.0.borrow_mut().buffer = Some(size);
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<()> {
        self.0.borrow_mut().drawn.push(command.clone());
        Ok(())
    }

    fn present(&mut self, _: Rect) -> Result<()> { Ok(()) }
}

/// A reactor on an 800x600 frame running `st -w`, wired to fakes.
pub struct Harness {
    pub reactor: Reactor,
    pub state: Shared,
}

impl Harness {
    pub fn new() -> Harness { Self::with_config(Config::builtin().unwrap()) }

    pub fn with_config(config: Config) -> Harness {
        let state = Shared::default();
        let options = Options {
            fill_again: false,
            initial_spawn: false,
        };
        let launcher = Launcher::new(vec!["st".to_string(), "-w".to_string()], 0);
        let reactor = Reactor::new(
            config,
            options,
            launcher,
            Box::new(FakeServer(state.clone())),
            Box::new(FakeRenderer(state.clone())),
            Size::new(800, 600),
        );
        Harness { reactor, state }
    }

    /// Creates a client window titled `title` inside the frame.
    pub fn embed(&mut self, window: WindowId, title: &str) {
        self.state.borrow_mut().titles.insert(window, title.to_string());
        self.reactor.handle_event(Event::CreateNotify { window }).unwrap();
    }

    pub fn handles(&self) -> Vec<WindowId> { self.reactor.registry.handles() }

    pub fn take_requests(&mut self) -> Vec<Request> {
        mem::take(&mut self.state.borrow_mut().requests)
    }

    pub fn take_drawn(&mut self) -> Vec<DrawCommand> { mem::take(&mut self.state.borrow_mut().drawn) }
}

/// Kinds of the embedding messages `window` received, in order.
pub fn embed_messages(requests: &[Request], window: WindowId) -> Vec<XEmbedMessage> {
    requests
        .iter()
        .filter_map(|request| match request {
            Request::Embed(Recipient::Client, w, message) if *w == window => Some(message.kind),
            _ => None,
        })
        .collect()
}
