//! Remote control over a Unix socket.
//!
//! A running launcher started with `--dbus=SUFFIX` listens on
//! [`socket_path`]`(SUFFIX)`; `btngrid-ctl` and scripts send it
//! newline-delimited JSON commands (`"show"`, `"hide"`, `"quit"`).

pub mod client;
pub mod listener;

use std::path::PathBuf;

/// Prefix shared by every instance's endpoint name.
pub const SERVICE_PREFIX: &str = "btngrid";

/// Whether `suffix` is a valid instance name (lowercase letters only).
pub fn is_valid_suffix(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_lowercase())
}

/// Full service name of an instance, e.g. `btngrid.powermenu`.
pub fn service_name(suffix: &str) -> String {
    format!("{}.{}", SERVICE_PREFIX, suffix)
}

/// Socket path for the instance named `suffix`.
pub fn socket_path(suffix: &str) -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join(format!("{}.sock", service_name(suffix)))
}
