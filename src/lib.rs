//! # btngrid
//!
//! A fullscreen button-grid launcher.  An entry file lists buttons (label,
//! icon, shell command) and infobars (shell command whose output is shown
//! as text), separated into rows and columns by `rowbreak` / `colbreak`.
//!
//! ## Architecture
//!
//! ```text
//!  entry file ──► entry::parse_entries ──► grid::Layout ──► markup::generate
//!                                                                │
//!                                                                ▼
//!   UnixSocketListener ──► RemoteCommand ─┐               frontend (GTK)
//!                                         ▼                      │
//!                                  Dispatcher ◄── Event ─────────┘
//!                                    │   │
//!                     ShellRunner ◄──┘   └──► UiUpdate ──► frontend
//! ```
//!
//! The [`traits::ShellRunner`] and [`traits::CommandSource`] traits keep the
//! dispatcher testable without spawning processes or opening sockets.

pub mod cli;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod entry;
pub mod frontend;
pub mod grid;
pub mod icon;
pub mod ipc;
pub mod markup;
pub mod shell;
pub mod traits;
