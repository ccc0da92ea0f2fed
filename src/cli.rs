//! Command-line interface.
//!
//! Malformed flags or a wrong number of positional arguments make clap print
//! usage to standard error and exit with status 2.  Mutually exclusive flag
//! pairs (`--landscape`/`--portrait`, `--fullscreen`/`--window`,
//! `--center`/`--left`) follow "last one wins".

use crate::grid::{Geometry, Orientation};
use crate::ipc;
use crate::markup::Alignment;
use clap::Parser;
use std::path::PathBuf;

/// Button-grid launcher: shows buttons that run shell commands and
/// infobars that display polled command output.
#[derive(Parser, Debug, Clone)]
#[command(name = "btngrid", version, about, long_about = None)]
pub struct Args {
    /// Entry file describing buttons, infobars and breaks
    #[arg(value_name = "CONFIG_FILE")]
    pub config_file: PathBuf,

    /// Keep the top of the UI along the longest screen edge (rotate 90° if the screen is taller than wide)
    #[arg(long, overrides_with = "portrait")]
    pub landscape: bool,

    /// Keep the top of the UI along the shortest screen edge (rotate 90° if the screen is wider than tall)
    #[arg(long, overrides_with = "landscape")]
    pub portrait: bool,

    /// Show the window fullscreen (default)
    #[arg(short = 'f', long, overrides_with = "window")]
    pub fullscreen: bool,

    /// Show a regular, non-fullscreen window
    #[arg(short = 'w', long, overrides_with = "fullscreen")]
    pub window: bool,

    /// Window and content size; also decides --landscape/--portrait rotation
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub size: Option<Geometry>,

    /// Multiply every widget and font size by this factor
    #[arg(long, value_name = "FLOAT", value_parser = parse_scale)]
    pub scale: Option<f64>,

    /// Center widgets in the window (default)
    #[arg(long, overrides_with = "left")]
    pub center: bool,

    /// Pack widgets into the top-left corner
    #[arg(long, overrides_with = "center")]
    pub left: bool,

    /// Keep refreshing infobars while the window is unfocused or hidden
    #[arg(long = "bg", alias = "run-in-background")]
    pub run_in_background: bool,

    /// Start hidden and accept show/hide/quit on the btngrid.SUFFIX endpoint;
    /// closing the window hides it instead of quitting
    #[arg(long, value_name = "SUFFIX", value_parser = parse_suffix)]
    pub dbus: Option<String>,

    /// Print the generated GtkBuilder markup and exit
    #[arg(long)]
    pub print_markup: bool,
}

impl Args {
    pub fn orientation(&self) -> Orientation {
        if self.landscape {
            Orientation::Landscape
        } else if self.portrait {
            Orientation::Portrait
        } else {
            Orientation::None
        }
    }

    pub fn fullscreen(&self) -> bool {
        !self.window
    }

    pub fn alignment(&self) -> Alignment {
        if self.left {
            Alignment::Fill
        } else {
            Alignment::Center
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale.unwrap_or(1.0)
    }
}

/// Largest accepted `--size` side; window sizes are `i32` in GTK.
const MAX_SIDE: u32 = i32::MAX as u32;

fn parse_size(s: &str) -> Result<Geometry, String> {
    let err = || format!("expected WIDTHxHEIGHT, e.g. 800x480, got {:?}", s);
    let (w, h) = s.split_once('x').ok_or_else(err)?;
    let digits = |v: &str| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit());
    if !digits(w) || !digits(h) {
        return Err(err());
    }
    let width: u32 = w.parse().map_err(|_| err())?;
    let height: u32 = h.parse().map_err(|_| err())?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got {:?}", s));
    }
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(format!("size must not exceed {} per side, got {:?}", MAX_SIDE, s));
    }
    Ok(Geometry::new(width, height))
}

fn parse_scale(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(format!("expected a positive number, got {:?}", s)),
    }
}

fn parse_suffix(s: &str) -> Result<String, String> {
    if ipc::is_valid_suffix(s) {
        Ok(s.to_string())
    } else {
        Err(format!("SUFFIX may contain only lowercase letters a-z, got {:?}", s))
    }
}
