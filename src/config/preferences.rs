//! User preferences persisted as a small TOML file next to the database.
//!
//! These are presentation-layer settings; the core logic treats them as
//! opaque configuration. A missing file simply yields the defaults, and
//! saving rewrites the whole file.

use crate::errors::{Error, Result};
use crate::session::presets::DatePreset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Visual theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Follow the operating system setting
    #[default]
    System,
    Light,
    Dark,
}

/// Card corner style used by the list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStyle {
    #[default]
    Rounded,
    Square,
}

/// All persisted user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// ISO 4217 currency code used for display
    pub currency: String,
    /// UI language tag, or "system" to follow the device locale
    pub language: String,
    /// Visual theme
    pub theme: Theme,
    /// Card visual style
    pub card_style: CardStyle,
    /// Date filter preset applied when the home screen first loads
    pub default_filter: DatePreset,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            language: "system".to_string(),
            theme: Theme::default(),
            card_style: CardStyle::default(),
            default_filter: DatePreset::default(),
        }
    }
}

impl Preferences {
    /// Loads preferences from `path`. A missing file yields the defaults;
    /// a present-but-unparseable file is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Writes the preferences to `path`, replacing the previous contents.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| Error::Config {
            message: format!("Failed to serialize preferences: {e}"),
        })?;
        std::fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Formats an amount in the selected currency, e.g. `$3.50`.
    ///
    /// Unknown currency codes fall back to a plain `CODE amount` rendering
    /// rather than failing the caller.
    #[must_use]
    pub fn format_amount(&self, amount: f64) -> String {
        match currency_symbol(&self.currency) {
            Some(symbol) => format!("{symbol}{amount:.2}"),
            None => format!("{} {amount:.2}", self.currency),
        }
    }
}

/// Symbol for the handful of currencies the UI renders compactly.
#[must_use]
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("\u{20ac}"),
        "GBP" => Some("\u{a3}"),
        "JPY" => Some("\u{a5}"),
        "CHF" => Some("Fr."),
        "INR" => Some("\u{20b9}"),
        _ => None,
    }
}
