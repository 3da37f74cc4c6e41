use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::actor::reactor::Command;
use crate::common::collections::HashMap;
use crate::sys::hotkey::Hotkey;
use crate::ui::ColorSpec;

const BUILTIN_CONFIG: &str = include_str!("../../tabbed.default.toml");

/// `$XDG_CONFIG_HOME/tabbed/tabbed.toml`, if a config directory exists.
pub fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tabbed").join("tabbed.toml"))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    keys: HashMap<String, Command>,
    /// Reusable modifier prefixes, e.g. `mod = "Ctrl + Shift"` allows
    /// writing `"mod + l"` in `keys`.
    #[serde(default)]
    modifier_combinations: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub keys: Vec<(Hotkey, Command)>,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// X logical font description of the tab font.
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub colors: ColorSettings,
    /// Width of a non-selected tab in pixels.
    #[serde(default = "default_tab_width")]
    pub tab_width: u32,
    /// Indicator shown when tabs are hidden on the left.
    #[serde(default = "default_before")]
    pub before: String,
    /// Indicator shown when tabs are hidden on the right.
    #[serde(default = "default_after")]
    pub after: String,
    /// Give focus to newly embedded clients.
    #[serde(default = "yes")]
    pub foreground: bool,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ColorSettings {
    #[serde(default = "default_normal_background")]
    pub normal_background: String,
    #[serde(default = "default_normal_foreground")]
    pub normal_foreground: String,
    #[serde(default = "default_selected_background")]
    pub selected_background: String,
    #[serde(default = "default_selected_foreground")]
    pub selected_foreground: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            font: default_font(),
            colors: ColorSettings::default(),
            tab_width: default_tab_width(),
            before: default_before(),
            after: default_after(),
            foreground: yes(),
        }
    }
}

impl Default for ColorSettings {
    fn default() -> Self {
        ColorSettings {
            normal_background: default_normal_background(),
            normal_foreground: default_normal_foreground(),
            selected_background: default_selected_background(),
            selected_foreground: default_selected_foreground(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.tab_width == 0 {
            issues.push("tab_width must be positive, got 0".to_string());
        }

        if self.font.trim().is_empty() {
            issues.push("font must not be empty".to_string());
        }

        issues.extend(self.colors.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.tab_width == 0 {
            self.tab_width = default_tab_width();
            fixes += 1;
        }

        if self.font.trim().is_empty() {
            self.font = default_font();
            fixes += 1;
        }

        fixes += self.colors.auto_fix_values();

        fixes
    }
}

impl ColorSettings {
    fn entries_mut(&mut self) -> [(&'static str, &mut String, fn() -> String); 4] {
        [
            ("normal_background", &mut self.normal_background, default_normal_background),
            ("normal_foreground", &mut self.normal_foreground, default_normal_foreground),
            ("selected_background", &mut self.selected_background, default_selected_background),
            ("selected_foreground", &mut self.selected_foreground, default_selected_foreground),
        ]
    }

    pub fn validate(&self) -> Vec<String> {
        [
            ("normal_background", &self.normal_background),
            ("normal_foreground", &self.normal_foreground),
            ("selected_background", &self.selected_background),
            ("selected_foreground", &self.selected_foreground),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            ColorSpec::from_str(value).err().map(|err| format!("colors.{name}: {err}"))
        })
        .collect()
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;
        for (_, value, default) in self.entries_mut() {
            if ColorSpec::from_str(value).is_err() {
                *value = default();
                fixes += 1;
            }
        }
        fixes
    }

    /// Colors in `[normal bg, normal fg, selected bg, selected fg]` order.
    pub fn specs(&self) -> anyhow::Result<[ColorSpec; 4]> {
        let parse = |value: &str| {
            ColorSpec::from_str(value).with_context(|| format!("invalid color {value:?}"))
        };
        Ok([
            parse(&self.normal_background)?,
            parse(&self.normal_foreground)?,
            parse(&self.selected_background)?,
            parse(&self.selected_foreground)?,
        ])
    }
}

fn yes() -> bool { true }

fn default_font() -> String { "-*-*-medium-*-*-*-14-*-*-*-*-*-*-*".to_string() }

fn default_tab_width() -> u32 { 200 }

fn default_before() -> String { "<".to_string() }

fn default_after() -> String { ">".to_string() }

fn default_normal_background() -> String { "#222222".to_string() }

fn default_normal_foreground() -> String { "#cccccc".to_string() }

fn default_selected_background() -> String { "#555555".to_string() }

fn default_selected_foreground() -> String { "#ffffff".to_string() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing {}", path.display()))
    }

    /// The configuration compiled into the binary.
    pub fn builtin() -> anyhow::Result<Config> { Self::parse(BUILTIN_CONFIG) }

    /// The user's config file if there is one, else the builtin defaults.
    pub fn load() -> anyhow::Result<Config> {
        match config_file() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Self::builtin(),
        }
    }

    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }

    pub fn hotkeys(&self) -> Vec<Hotkey> { self.keys.iter().map(|(hotkey, _)| *hotkey).collect() }

    fn expand_modifier_combinations(key: &str, combinations: &HashMap<String, String>) -> String {
        if let Some(plus_pos) = key.find('+') {
            let potential_combo = key[..plus_pos].trim();
            if let Some(combo_value) = combinations.get(potential_combo) {
                let rest = key[plus_pos + 1..].trim();
                return format!("{} + {}", combo_value, rest);
            }
        }
        key.to_string()
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let c: ConfigFile = toml::from_str(buf)?;
        let mut keys = Vec::new();
        for (key, cmd) in c.keys {
            let expanded_key = Self::expand_modifier_combinations(&key, &c.modifier_combinations);
            let Ok(hotkey) = Hotkey::from_str(&expanded_key) else {
                bail!("Could not parse hotkey: {key}");
            };
            if let Some((_, existing)) = keys.iter().find(|(hk, _)| *hk == hotkey) {
                bail!("Hotkey {key} is bound twice ({existing:?} and {cmd:?})");
            }
            keys.push((hotkey, cmd));
        }
        Ok(Config { settings: c.settings, keys })
    }
}
