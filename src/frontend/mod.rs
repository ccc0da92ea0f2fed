//! Launcher frontends.
//!
//! When the `frontend-gtk` feature is enabled, [`gtk::run_main_loop`]
//! takes over the main thread and drives both the [`Dispatcher`] and the
//! widgets through the GLib main loop.
//!
//! [`Dispatcher`]: crate::dispatcher::Dispatcher

#[cfg(feature = "frontend-gtk")]
pub mod gtk;
