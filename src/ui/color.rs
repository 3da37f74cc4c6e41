use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("empty color")]
    Empty,
    #[error("malformed hex color {0:?}, expected #rrggbb")]
    MalformedHex(String),
}

/// A color as written in the configuration: `#rrggbb` or an X color name
/// resolved by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    Rgb(u8, u8, u8),
    Named(String),
}

impl ColorSpec {
    /// 16-bit channels as the X server expects them.
    pub fn rgb16(&self) -> Option<(u16, u16, u16)> {
        match *self {
            ColorSpec::Rgb(r, g, b) => {
                let widen = |c: u8| u16::from(c) * 0x101;
                Some((widen(r), widen(g), widen(b)))
            }
            ColorSpec::Named(_) => None,
        }
    }
}

impl FromStr for ColorSpec {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorError::Empty);
        }
        let Some(hex) = s.strip_prefix('#') else {
            return Ok(ColorSpec::Named(s.to_string()));
        };
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::MalformedHex(s.to_string()));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(ColorSpec::Rgb(r, g, b)),
            _ => Err(ColorError::MalformedHex(s.to_string())),
        }
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpec::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            ColorSpec::Named(name) => f.write_str(name),
        }
    }
}
