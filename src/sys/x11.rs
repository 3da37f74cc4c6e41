//! X11 implementation of the window-server gateway, on top of `x11rb`.

mod renderer;

use std::rc::Rc;

use anyhow::Context;
pub use renderer::X11Renderer;
use tracing::{debug, info, trace};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::Event as XEvent;
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureNotifyEvent,
    ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, GrabMode, InputFocus,
    Keycode, ModMask, NotifyMode, PropMode, Property as XProperty, StackMode, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::event::{ClientMessage, Event, Property, RequestError};
use super::geometry::{Rect, Size};
use super::hotkey::{Hotkey, Keysym, Modifiers, keysym};
use super::window_server::{Recipient, Result, WindowId, WindowServer};
use super::xembed::{CURRENT_TIME, EmbedMessage};
use crate::common::config::Settings;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _XEMBED,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

/// Initial frame size before the window manager configures it.
pub const INITIAL_SIZE: Size = Size::new(800, 600);

fn frame_events() -> EventMask {
    EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::FOCUS_CHANGE
        | EventMask::BUTTON_PRESS
        | EventMask::EXPOSURE
        | EventMask::KEY_PRESS
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::SUBSTRUCTURE_REDIRECT
}

fn client_events() -> EventMask {
    EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY | EventMask::ENTER_WINDOW
}

/// Opens the display and creates the frame window.
///
/// Every failure here is fatal: without a font, colors or a frame there is
/// nothing useful to run.
pub fn connect(
    settings: &Settings,
    wm_name: &str,
) -> anyhow::Result<(X11WindowServer, X11Renderer)> {
    let (conn, screen_num) = x11rb::connect(None).context("cannot open display")?;
    let conn = Rc::new(conn);
    let screen = conn.setup().roots[screen_num].clone();
    info!(
        screen = screen_num,
        root = format_args!("{:#x}", screen.root),
        "connected to X server"
    );

    let atoms = Atoms::new(conn.as_ref())?.reply()?;
    let colors = settings.colors.specs()?;
    let palette = renderer::alloc_palette(conn.as_ref(), screen.default_colormap, &colors)?;

    let frame = conn.generate_id()?;
    conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        frame,
        screen.root,
        0,
        0,
        INITIAL_SIZE.width as u16,
        INITIAL_SIZE.height as u16,
        0,
        WindowClass::INPUT_OUTPUT,
        x11rb::COPY_FROM_PARENT,
        &CreateWindowAux::new()
            .background_pixel(palette.normal.background)
            .border_pixel(palette.normal.foreground),
    )?;
    conn.map_window(frame)?;
    conn.configure_window(frame, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
    conn.change_window_attributes(
        frame,
        &ChangeWindowAttributesAux::new().event_mask(frame_events()),
    )?;

    let class = format!("{wm_name}\0tabbed\0");
    conn.change_property8(
        PropMode::REPLACE,
        frame,
        AtomEnum::WM_CLASS,
        AtomEnum::STRING,
        class.as_bytes(),
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        frame,
        atoms.WM_PROTOCOLS,
        AtomEnum::ATOM,
        &[atoms.WM_DELETE_WINDOW],
    )?;
    conn.flush()?;

    let renderer =
        X11Renderer::new(conn.clone(), &screen, frame, &settings.font, palette, INITIAL_SIZE)?;
    let mut server = X11WindowServer {
        conn,
        root: screen.root,
        frame,
        atoms,
        keymap: Keymap::default(),
    };
    server.refresh_keyboard_mapping()?;
    Ok((server, renderer))
}

/// Keycode to keysym table, as returned by `GetKeyboardMapping`.
#[derive(Debug, Default)]
struct Keymap {
    min_keycode: Keycode,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    /// Group 0, level 0.
    fn keysym(&self, keycode: Keycode) -> Keysym {
        let Some(offset) = keycode.checked_sub(self.min_keycode) else {
            return 0;
        };
        self.keysyms.get(offset as usize * self.keysyms_per_keycode).copied().unwrap_or(0)
    }

    fn keycode(&self, sym: Keysym) -> Option<Keycode> {
        if self.keysyms_per_keycode == 0 {
            return None;
        }
        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .position(|syms| syms.contains(&sym))
            .and_then(|i| Keycode::try_from(i).ok())
            .map(|i| self.min_keycode + i)
    }
}

pub struct X11WindowServer {
    conn: Rc<RustConnection>,
    root: Window,
    frame: Window,
    atoms: Atoms,
    keymap: Keymap,
}

impl X11WindowServer {
    fn translate(&self, event: XEvent) -> Event {
        match event {
            XEvent::ButtonPress(e) => Event::ButtonPress {
                window: e.event,
                x: i32::from(e.event_x),
                y: i32::from(e.event_y),
                button: e.detail,
            },
            XEvent::ConfigureNotify(e) => Event::ConfigureNotify {
                window: e.window,
                width: u32::from(e.width),
                height: u32::from(e.height),
            },
            XEvent::ConfigureRequest(e) => Event::ConfigureRequest { window: e.window },
            XEvent::CreateNotify(e) => Event::CreateNotify { window: e.window },
            XEvent::DestroyNotify(e) => Event::DestroyNotify { window: e.window },
            XEvent::Expose(e) => Event::Expose { window: e.window, count: e.count },
            XEvent::FocusIn(e) => Event::FocusIn {
                window: e.event,
                ungrab: e.mode == NotifyMode::UNGRAB,
            },
            XEvent::KeyPress(e) => Event::KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
            },
            XEvent::MapRequest(e) => Event::MapRequest { window: e.window },
            XEvent::MapNotify(e) => Event::MapNotify { window: e.window },
            XEvent::UnmapNotify(e) => Event::UnmapNotify { window: e.window },
            XEvent::PropertyNotify(e) => {
                let property = if e.atom == u32::from(AtomEnum::WM_NAME)
                    || e.atom == self.atoms._NET_WM_NAME
                {
                    Property::Title
                } else {
                    Property::Other
                };
                Event::PropertyNotify {
                    window: e.window,
                    property,
                    deleted: e.state == XProperty::DELETE,
                }
            }
            XEvent::ClientMessage(e) => Event::ClientMessage {
                window: e.window,
                message: self.translate_client_message(&e),
            },
            XEvent::MappingNotify(_) => Event::MappingNotify,
            XEvent::Error(e) => Event::Error(RequestError::new(e.major_opcode, e.error_code)),
            _ => Event::Ignored,
        }
    }

    fn translate_client_message(&self, e: &ClientMessageEvent) -> ClientMessage {
        if e.format != 32 {
            return ClientMessage::Other;
        }
        let data = e.data.as_data32();
        if e.type_ == self.atoms.WM_PROTOCOLS && data[0] == self.atoms.WM_DELETE_WINDOW {
            return ClientMessage::DeleteWindow;
        }
        if e.type_ == self.atoms._XEMBED {
            return match EmbedMessage::from_data32(data) {
                Ok(message) => ClientMessage::XEmbed(message),
                Err(err) => {
                    debug!(window = e.window, "{err}");
                    ClientMessage::Other
                }
            };
        }
        ClientMessage::Other
    }

    /// Reads a text property, or `None` if it is unset or the window is gone.
    fn text_property(&self, window: Window, property: u32, ty: u32) -> Result<Option<String>> {
        let reply = self.conn.get_property(false, window, property, ty, 0, u32::MAX / 4)?.reply();
        let Some(reply) = tolerate_x11_error(reply)? else {
            return Ok(None);
        };
        if reply.value.is_empty() {
            return Ok(None);
        }
        let text = if reply.type_ == u32::from(AtomEnum::STRING) {
            reply.value.iter().map(|&b| char::from(b)).collect()
        } else {
            String::from_utf8_lossy(&reply.value).into_owned()
        };
        Ok(Some(text))
    }

    fn send_client_message(
        &self,
        destination: Window,
        mask: EventMask,
        event: ClientMessageEvent,
    ) -> Result<()> {
        self.conn.send_event(false, destination, mask, event)?;
        Ok(())
    }
}

/// X errors on a reply mean the window disappeared under us.
fn tolerate_x11_error<T>(reply: std::result::Result<T, ReplyError>) -> Result<Option<T>> {
    match reply {
        Ok(reply) => Ok(Some(reply)),
        Err(ReplyError::X11Error(err)) => {
            trace!(?err, "query raced a destroyed window");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn window_geometry(rect: Rect) -> ConfigureWindowAux {
    ConfigureWindowAux::new()
        .x(rect.x)
        .y(rect.y)
        .width(rect.width.max(1))
        .height(rect.height.max(1))
        .border_width(0)
}

impl WindowServer for X11WindowServer {
    fn frame(&self) -> WindowId { self.frame }

    fn next_event(&mut self) -> Result<Event> {
        self.conn.flush()?;
        let event = self.conn.wait_for_event()?;
        Ok(self.translate(event))
    }

    fn reparent(&mut self, window: WindowId, parent: WindowId, x: i32, y: i32) -> Result<()> {
        self.conn.reparent_window(window, parent, x as i16, y as i16)?;
        Ok(())
    }

    fn reparent_to_root(&mut self, window: WindowId) -> Result<()> {
        let root = self.root;
        self.reparent(window, root, 0, 0)
    }

    fn map(&mut self, window: WindowId) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap(&mut self, window: WindowId) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn raise(&mut self, window: WindowId) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn lower(&mut self, window: WindowId) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::BELOW))?;
        Ok(())
    }

    fn configure(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        self.conn.configure_window(window, &window_geometry(rect))?;
        Ok(())
    }

    fn resize_client(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        self.configure(window, rect)?;
        let notify = ConfigureNotifyEvent {
            response_type: x11rb::protocol::xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: rect.x as i16,
            y: rect.y as i16,
            width: rect.width as u16,
            height: rect.height as u16,
            border_width: 0,
            override_redirect: false,
        };
        self.conn.send_event(false, window, EventMask::STRUCTURE_NOTIFY, notify)?;
        Ok(())
    }

    fn select_client_input(&mut self, window: WindowId) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(client_events()),
        )?;
        Ok(())
    }

    fn fetch_title(&mut self, window: WindowId) -> Result<Option<String>> {
        let utf8 = self.atoms.UTF8_STRING;
        if let Some(title) = self.text_property(window, self.atoms._NET_WM_NAME, utf8)? {
            return Ok(Some(title));
        }
        self.text_property(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
    }

    fn set_frame_title(&mut self, title: &str) -> Result<()> {
        let latin1: Vec<u8> =
            title.chars().map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?')).collect();
        self.conn.change_property8(
            PropMode::REPLACE,
            self.frame,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            &latin1,
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            self.frame,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> Result<()> {
        self.conn.set_input_focus(InputFocus::PARENT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn input_focus(&mut self) -> Result<Option<WindowId>> {
        let reply = self.conn.get_input_focus()?.reply()?;
        Ok((reply.focus != x11rb::NONE).then_some(reply.focus))
    }

    fn send_embed(
        &mut self,
        recipient: Recipient,
        window: WindowId,
        message: EmbedMessage,
    ) -> Result<()> {
        let destination = match recipient {
            Recipient::Client => window,
            Recipient::Root => self.root,
        };
        trace!(window, ?recipient, ?message, "sending xembed message");
        let event = ClientMessageEvent::new(32, window, self.atoms._XEMBED, message.to_data32());
        self.send_client_message(destination, EventMask::NO_EVENT, event)
    }

    fn supports_delete(&mut self, window: WindowId) -> Result<bool> {
        let reply = self
            .conn
            .get_property(false, window, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM, 0, 32)?
            .reply();
        let Some(reply) = tolerate_x11_error(reply)? else {
            return Ok(false);
        };
        let delete = self.atoms.WM_DELETE_WINDOW;
        Ok(reply.value32().is_some_and(|mut atoms| atoms.any(|atom| atom == delete)))
    }

    fn send_delete(&mut self, window: WindowId) -> Result<()> {
        let data = [self.atoms.WM_DELETE_WINDOW, CURRENT_TIME, 0, 0, 0];
        let event = ClientMessageEvent::new(32, window, self.atoms.WM_PROTOCOLS, data);
        self.send_client_message(window, EventMask::NO_EVENT, event)
    }

    fn kill_client(&mut self, window: WindowId) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn grab_keys(&mut self, window: WindowId, hotkeys: &[Hotkey], numlock: Modifiers) -> Result<()> {
        for hotkey in hotkeys {
            let Some(keycode) = self.keymap.keycode(hotkey.keysym) else {
                debug!(%hotkey, "no keycode for binding, not grabbing");
                continue;
            };
            for lock in Modifiers::lock_variants(numlock) {
                self.conn.grab_key(
                    true,
                    window,
                    ModMask::from((hotkey.modifiers | lock).bits()),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }
        Ok(())
    }

    fn numlock_mask(&mut self) -> Result<Modifiers> {
        let Some(numlock) = self.keymap.keycode(keysym::NUM_LOCK) else {
            return Ok(Modifiers::empty());
        };
        let mapping = self.conn.get_modifier_mapping()?.reply()?;
        let per_modifier = usize::from(mapping.keycodes_per_modifier());
        if per_modifier == 0 {
            return Ok(Modifiers::empty());
        }
        let mask = mapping
            .keycodes
            .chunks(per_modifier)
            .take(8)
            .position(|codes| codes.contains(&numlock))
            .map_or(Modifiers::empty(), |bit| Modifiers::from_bits_truncate(1 << bit));
        Ok(mask)
    }

    fn keysym(&mut self, keycode: u8) -> Keysym { self.keymap.keysym(keycode) }

    fn refresh_keyboard_mapping(&mut self) -> Result<()> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let mapping = self.conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        self.keymap = Keymap {
            min_keycode: min,
            keysyms_per_keycode: usize::from(mapping.keysyms_per_keycode),
            keysyms: mapping.keysyms,
        };
        Ok(())
    }

    fn destroy_frame(&mut self) -> Result<()> {
        self.conn.destroy_window(self.frame)?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.conn.sync()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keymap() -> Keymap {
        // Two keysyms per keycode starting at keycode 8.
        Keymap {
            min_keycode: 8,
            keysyms_per_keycode: 2,
            keysyms: vec!['a' as u32, 'A' as u32, keysym::RETURN, 0, keysym::NUM_LOCK, 0],
        }
    }

    #[test]
    fn keymap_resolves_level_zero_keysyms() {
        let map = keymap();
        assert_eq!(map.keysym(8), 'a' as u32);
        assert_eq!(map.keysym(9), keysym::RETURN);
        assert_eq!(map.keysym(7), 0);
        assert_eq!(map.keysym(200), 0);
    }

    #[test]
    fn keymap_finds_keycodes_at_any_level() {
        let map = keymap();
        assert_eq!(map.keycode('A' as u32), Some(8));
        assert_eq!(map.keycode(keysym::NUM_LOCK), Some(10));
        assert_eq!(map.keycode(keysym::F1), None);
        assert_eq!(Keymap::default().keycode('a' as u32), None);
    }
}
