use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Deserialize;

/// An X11 keysym value.
pub type Keysym = u32;

bitflags! {
    /// Core-protocol modifier mask bits, as found in key event state.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1 = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
    }
}

impl Modifiers {
    pub const ALT: Modifiers = Modifiers::MOD1;
    pub const SUPER: Modifiers = Modifiers::MOD4;

    /// Modifier bits from a raw event state; pointer button bits are dropped.
    pub fn from_state(state: u16) -> Self { Modifiers::from_bits_truncate(state) }

    /// Strips NumLock and CapsLock so bindings match regardless of lock state.
    pub fn clean(self, numlock: Modifiers) -> Modifiers { self - (numlock | Modifiers::LOCK) }

    /// The four lock variants every binding has to be grabbed with.
    pub fn lock_variants(numlock: Modifiers) -> [Modifiers; 4] {
        [Modifiers::empty(), Modifiers::LOCK, numlock, numlock | Modifiers::LOCK]
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.contains(Modifiers::CONTROL) {
            parts.push("Ctrl");
        }
        if self.contains(Modifiers::ALT) {
            parts.push("Alt");
        }
        if self.contains(Modifiers::SHIFT) {
            parts.push("Shift");
        }
        if self.contains(Modifiers::SUPER) {
            parts.push("Super");
        }
        write!(f, "{}", parts.join(" + "))
    }
}

pub mod keysym {
    use super::Keysym;

    pub const SPACE: Keysym = 0x0020;
    pub const RETURN: Keysym = 0xff0d;
    pub const TAB: Keysym = 0xff09;
    pub const ESCAPE: Keysym = 0xff1b;
    pub const BACKSPACE: Keysym = 0xff08;
    pub const DELETE: Keysym = 0xffff;
    pub const INSERT: Keysym = 0xff63;
    pub const HOME: Keysym = 0xff50;
    pub const LEFT: Keysym = 0xff51;
    pub const UP: Keysym = 0xff52;
    pub const RIGHT: Keysym = 0xff53;
    pub const DOWN: Keysym = 0xff54;
    pub const PRIOR: Keysym = 0xff55;
    pub const NEXT: Keysym = 0xff56;
    pub const END: Keysym = 0xff57;
    pub const NUM_LOCK: Keysym = 0xff7f;
    pub const F1: Keysym = 0xffbe;
    pub const F12: Keysym = 0xffc9;
}

const NAMED_KEYS: &[(&str, Keysym)] = &[
    ("space", keysym::SPACE),
    ("return", keysym::RETURN),
    ("enter", keysym::RETURN),
    ("tab", keysym::TAB),
    ("escape", keysym::ESCAPE),
    ("esc", keysym::ESCAPE),
    ("backspace", keysym::BACKSPACE),
    ("delete", keysym::DELETE),
    ("insert", keysym::INSERT),
    ("home", keysym::HOME),
    ("end", keysym::END),
    ("left", keysym::LEFT),
    ("up", keysym::UP),
    ("right", keysym::RIGHT),
    ("down", keysym::DOWN),
    ("prior", keysym::PRIOR),
    ("pageup", keysym::PRIOR),
    ("next", keysym::NEXT),
    ("pagedown", keysym::NEXT),
    ("minus", 0x2d),
    ("equal", 0x3d),
    ("comma", 0x2c),
    ("period", 0x2e),
    ("slash", 0x2f),
    ("semicolon", 0x3b),
    ("apostrophe", 0x27),
    ("grave", 0x60),
    ("backslash", 0x5c),
    ("bracketleft", 0x5b),
    ("bracketright", 0x5d),
];

/// Resolves a key name as written in the config file to its keysym.
///
/// Letters resolve to their lowercase keysym, since key events are looked up
/// at shift level zero.
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphanumeric() {
            return Some(ch.to_ascii_lowercase() as Keysym);
        }
        return match ch {
            '-' | '=' | ',' | '.' | '/' | ';' | '\'' | '`' | '\\' | '[' | ']' => {
                Some(ch as Keysym)
            }
            _ => None,
        };
    }

    let lower = name.to_ascii_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=12).contains(&n).then(|| keysym::F1 + n - 1);
    }
    NAMED_KEYS.iter().find(|(key, _)| *key == lower).map(|(_, sym)| *sym)
}

pub fn keysym_name(sym: Keysym) -> String {
    match sym {
        0x30..=0x39 | 0x61..=0x7a => char::from_u32(sym).map(String::from).unwrap_or_default(),
        keysym::F1..=keysym::F12 => format!("F{}", sym - keysym::F1 + 1),
        _ => NAMED_KEYS
            .iter()
            .find(|(_, s)| *s == sym)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| format!("{sym:#x}")),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub keysym: Keysym,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, keysym: Keysym) -> Self { Self { modifiers, keysym } }

    /// Whether a key event with this keysym and raw state triggers the binding.
    pub fn matches(&self, keysym: Keysym, state: u16, numlock: Modifiers) -> bool {
        self.keysym == keysym
            && self.modifiers.clean(numlock) == Modifiers::from_state(state).clean(numlock)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", keysym_name(self.keysym))
        } else {
            write!(f, "{} + {}", self.modifiers, keysym_name(self.keysym))
        }
    }
}

impl FromStr for Hotkey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
        let mut mods = Modifiers::empty();
        let mut key_opt: Option<Keysym> = None;

        for part in parts {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => mods.insert(Modifiers::CONTROL),
                "shift" => mods.insert(Modifiers::SHIFT),
                "alt" | "mod1" => mods.insert(Modifiers::ALT),
                "mod2" => mods.insert(Modifiers::MOD2),
                "mod3" => mods.insert(Modifiers::MOD3),
                "super" | "mod4" | "meta" => mods.insert(Modifiers::SUPER),
                "mod5" => mods.insert(Modifiers::MOD5),
                _ => {
                    let sym = keysym_from_name(part)
                        .ok_or_else(|| anyhow::anyhow!("Unrecognized key token: {}", part))?;
                    key_opt = Some(sym);
                }
            }
        }

        let keysym = key_opt.ok_or_else(|| anyhow::anyhow!("No key specified in hotkey: {}", s))?;
        Ok(Hotkey::new(mods, keysym))
    }
}

impl<'de> Deserialize<'de> for Hotkey {
    fn deserialize<D>(deserializer: D) -> Result<Hotkey, D::Error>
    where D: serde::Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        Hotkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifiers_and_keys() {
        let hk: Hotkey = "Ctrl + Shift + Return".parse().unwrap();
        assert_eq!(hk.modifiers, Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(hk.keysym, keysym::RETURN);

        let hk: Hotkey = "Ctrl+Shift+L".parse().unwrap();
        assert_eq!(hk.keysym, 'l' as Keysym);

        let hk: Hotkey = "Alt + F11".parse().unwrap();
        assert_eq!(hk.modifiers, Modifiers::ALT);
        assert_eq!(hk.keysym, keysym::F1 + 10);

        assert!("Ctrl + Shift".parse::<Hotkey>().is_err());
        assert!("Ctrl + F13".parse::<Hotkey>().is_err());
        assert!("Hyper + a".parse::<Hotkey>().is_err());
    }

    #[test]
    fn lock_modifiers_do_not_affect_matching() {
        let numlock = Modifiers::MOD2;
        let hk: Hotkey = "Ctrl + 1".parse().unwrap();
        let ctrl = Modifiers::CONTROL.bits();
        assert!(hk.matches('1' as Keysym, ctrl, numlock));
        assert!(hk.matches('1' as Keysym, ctrl | Modifiers::LOCK.bits(), numlock));
        assert!(hk.matches('1' as Keysym, ctrl | numlock.bits(), numlock));
        // Button1 held while pressing the key.
        assert!(hk.matches('1' as Keysym, ctrl | 0x100, numlock));
        assert!(!hk.matches('1' as Keysym, ctrl | Modifiers::SHIFT.bits(), numlock));
        assert!(!hk.matches('2' as Keysym, ctrl, numlock));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["Ctrl + Shift + l", "Ctrl + Tab", "F5", "Alt + period"] {
            let hk: Hotkey = text.parse().unwrap();
            let again: Hotkey = hk.to_string().parse().unwrap();
            assert_eq!(hk, again, "{text}");
        }
    }
}
