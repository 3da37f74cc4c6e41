//! Window-system notifications as seen by the reactor.
//!
//! The X11 backend translates raw protocol events into this sum type; kinds
//! the reactor has no handler for arrive as [`Event::Ignored`].

use strum::IntoStaticStr;

use super::window_server::WindowId;
use super::xembed::EmbedMessage;

pub mod request {
    pub const CONFIGURE_WINDOW: u8 = 12;
    pub const GRAB_BUTTON: u8 = 28;
    pub const GRAB_KEY: u8 = 33;
    pub const SET_INPUT_FOCUS: u8 = 42;
    pub const COPY_AREA: u8 = 62;
    pub const POLY_SEGMENT: u8 = 66;
    pub const POLY_FILL_RECTANGLE: u8 = 70;
    pub const POLY_TEXT8: u8 = 74;
    pub const IMAGE_TEXT8: u8 = 76;
}

pub mod button {
    pub const LEFT: u8 = 1;
    pub const MIDDLE: u8 = 2;
    pub const SCROLL_UP: u8 = 4;
    pub const SCROLL_DOWN: u8 = 5;
}

pub mod error_code {
    pub const WINDOW: u8 = 3;
    pub const MATCH: u8 = 8;
    pub const DRAWABLE: u8 = 9;
    pub const ACCESS: u8 = 10;
}

/// An asynchronous failure of an earlier request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestError {
    pub request: u8,
    pub code: u8,
}

impl RequestError {
    pub fn new(request: u8, code: u8) -> Self { Self { request, code } }

    /// Errors caused by racing a window's destruction. Anything else points
    /// at a real bug and should not be swallowed.
    pub fn is_benign(&self) -> bool {
        use error_code::*;
        use request::*;

        self.code == WINDOW
            || matches!(
                (self.request, self.code),
                (SET_INPUT_FOCUS, MATCH)
                    | (POLY_TEXT8, DRAWABLE)
                    | (IMAGE_TEXT8, DRAWABLE)
                    | (POLY_FILL_RECTANGLE, DRAWABLE)
                    | (POLY_SEGMENT, DRAWABLE)
                    | (CONFIGURE_WINDOW, MATCH)
                    | (GRAB_BUTTON, ACCESS)
                    | (GRAB_KEY, ACCESS)
                    | (COPY_AREA, DRAWABLE)
            )
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request code={}, error code={}", self.request, self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Title,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// `WM_PROTOCOLS` / `WM_DELETE_WINDOW`.
    DeleteWindow,
    XEmbed(EmbedMessage),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Event {
    ButtonPress {
        window: WindowId,
        x: i32,
        y: i32,
        button: u8,
    },
    ConfigureNotify {
        window: WindowId,
        width: u32,
        height: u32,
    },
    ConfigureRequest {
        window: WindowId,
    },
    CreateNotify {
        window: WindowId,
    },
    DestroyNotify {
        window: WindowId,
    },
    Expose {
        window: WindowId,
        count: u16,
    },
    /// `ungrab` is set for focus changes caused by a keyboard ungrab.
    FocusIn {
        window: WindowId,
        ungrab: bool,
    },
    KeyPress {
        keycode: u8,
        state: u16,
    },
    MapRequest {
        window: WindowId,
    },
    MapNotify {
        window: WindowId,
    },
    UnmapNotify {
        window: WindowId,
    },
    PropertyNotify {
        window: WindowId,
        property: Property,
        deleted: bool,
    },
    ClientMessage {
        window: WindowId,
        message: ClientMessage,
    },
    MappingNotify,
    Error(RequestError),
    Ignored,
}

impl Event {
    pub fn kind(&self) -> &'static str { self.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroyed_window_races_are_benign() {
        assert!(RequestError::new(request::CONFIGURE_WINDOW, error_code::WINDOW).is_benign());
        assert!(RequestError::new(request::SET_INPUT_FOCUS, error_code::MATCH).is_benign());
        assert!(RequestError::new(request::COPY_AREA, error_code::DRAWABLE).is_benign());
        assert!(RequestError::new(request::GRAB_KEY, error_code::ACCESS).is_benign());
    }

    #[test]
    fn unexpected_errors_are_not_benign() {
        // BadValue on CreateWindow.
        assert!(!RequestError::new(1, 2).is_benign());
        // BadMatch on CopyArea is a depth mismatch, not a race.
        assert!(!RequestError::new(request::COPY_AREA, error_code::MATCH).is_benign());
        assert!(!RequestError::new(request::SET_INPUT_FOCUS, error_code::ACCESS).is_benign());
    }

    #[test]
    fn kinds_are_named_after_variants() {
        assert_eq!(Event::MappingNotify.kind(), "MappingNotify");
        assert_eq!(Event::DestroyNotify { window: 1 }.kind(), "DestroyNotify");
    }
}
