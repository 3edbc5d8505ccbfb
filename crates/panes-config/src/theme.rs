//! Terminal surface colors resolved from the display mode.
//!
//! A surface takes a [`TerminalTheme`] by value when it is constructed and
//! never looks at the ambient mode again.

use serde::{Deserialize, Serialize};

use crate::schema::{PanesConfig, ThemeMode};
use crate::settings::SettingsStore;

/// Colors handed to a terminal surface at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalTheme {
    pub mode: ThemeMode,
    pub background: String,
    pub foreground: String,
    pub cursor: String,
}

impl TerminalTheme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self {
                mode,
                background: "#000000".into(),
                foreground: "#ffffff".into(),
                cursor: "#ffffff".into(),
            },
            ThemeMode::Light => Self {
                mode,
                background: "#ffffff".into(),
                foreground: "#000000".into(),
                cursor: "#000000".into(),
            },
        }
    }

    /// SGR sequence that switches a VT-compatible renderer to this theme's
    /// foreground and background (24-bit color).
    pub fn sgr(&self) -> String {
        match (parse_hex(&self.foreground), parse_hex(&self.background)) {
            (Some((fr, fg, fb)), Some((br, bg, bb))) => {
                format!("\x1b[38;2;{fr};{fg};{fb}m\x1b[48;2;{br};{bg};{bb}m")
            }
            _ => String::new(),
        }
    }
}

impl Default for TerminalTheme {
    fn default() -> Self {
        Self::for_mode(ThemeMode::default())
    }
}

/// Pick the display mode: a stored `DARK_MODE` flag wins over the config
/// default.
pub fn resolve_theme_mode(config: &PanesConfig, settings: &SettingsStore) -> ThemeMode {
    match settings.dark_mode() {
        Some(dark) => ThemeMode::from_dark_flag(dark),
        None => config.theme.mode,
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
