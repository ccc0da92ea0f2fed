//! Application settings.
//!
//! Settings are tunable constants loaded from an optional JSON file at
//! `$XDG_CONFIG_HOME/btngrid/config.json`.  They are separate from the entry
//! file given on the command line, which describes *what* to show; this file
//! describes default sizes, icon lookup and refresh timing.
//!
//! # Example
//!
//! ```json
//! {
//!   "button": { "width": 120, "height": 140 },
//!   "infobar": { "font_size": 24 },
//!   "layout": { "max_row_len": 5 },
//!   "icons": { "theme": "Adwaita" },
//!   "refresh": { "interval_ms": 2000, "command_timeout_ms": 0 }
//! }
//! ```

use crate::dispatcher::Timing;
use crate::entry::EntryDefaults;
use crate::icon::IconResolver;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level settings.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub button: ButtonConfig,
    #[serde(default)]
    pub infobar: InfobarConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub icons: IconConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Button defaults, in unscaled pixels and points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub width: u32,
    pub height: u32,
    pub label_font_size: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            width: 150,
            height: 180,
            label_font_size: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfobarConfig {
    /// Font size (points) for infobars that do not set one.
    pub font_size: u32,
}

impl Default for InfobarConfig {
    fn default() -> Self {
        Self { font_size: 32 }
    }
}

/// Grid layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Most buttons placed on one row before wrapping.
    pub max_row_len: usize,
    /// Gap between rows, columns and buttons (unscaled pixels).
    pub spacing: u32,
    /// Screen size assumed when neither `--size` nor a display is available.
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_row_len: 7,
            spacing: 10,
            fallback_width: 800,
            fallback_height: 480,
        }
    }
}

/// Icon theme lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub base_dir: PathBuf,
    pub theme: String,
    /// Size directories wider than this are not searched.
    pub max_width: u32,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/usr/share/icons"),
            theme: "hicolor".into(),
            max_width: 256,
        }
    }
}

/// Infobar refresh timing, in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_ms: u64,
    /// Wait after a button click before infobars are polled again.
    pub settle_ms: u64,
    /// Longest an infobar command may run.  `0` disables the limit.
    pub command_timeout_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            settle_ms: 500,
            command_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load settings from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Sizes for entries that omit them.
    pub fn entry_defaults(&self) -> EntryDefaults {
        EntryDefaults {
            button_width: self.button.width,
            button_height: self.button.height,
            infobar_font_size: self.infobar.font_size,
        }
    }

    pub fn icon_resolver(&self) -> IconResolver {
        IconResolver::new(&self.icons.base_dir, &self.icons.theme, self.icons.max_width)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            interval: Duration::from_millis(self.refresh.interval_ms),
            settle: Duration::from_millis(self.refresh.settle_ms),
        }
    }

    /// Per-command limit for infobar commands, `None` when disabled.
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.refresh.command_timeout_ms > 0)
            .then(|| Duration::from_millis(self.refresh.command_timeout_ms))
    }
}

/// Error from loading or parsing a settings file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
