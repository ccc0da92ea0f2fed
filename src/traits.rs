//! Core traits that decouple btngrid from how shell commands are executed
//! and how remote-control requests arrive.
//!
//! The [`Dispatcher`](crate::dispatcher::Dispatcher) only depends on
//! [`ShellRunner`]; the binary wires a [`CommandSource`] to the UI loop.

use crate::command::RemoteCommand;
use std::sync::mpsc;

/// Runs command strings through a shell.
///
/// The real implementation is [`SystemShell`](crate::shell::SystemShell);
/// tests substitute a recorder that never spawns anything.
pub trait ShellRunner {
    /// The error type produced by this runner.
    type Error: std::error::Error + Send + 'static;

    /// Run `command` to completion and return its standard output.
    ///
    /// A non-zero exit status is an error.
    fn capture(&mut self, command: &str) -> Result<String, Self::Error>;

    /// Start `command` without waiting for it.
    ///
    /// Its exit status is never observed by the caller.
    fn launch(&mut self, command: &str) -> Result<(), Self::Error>;
}

/// A source of [`RemoteCommand`]s.
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command is sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming command into `sink`.
    fn run(&mut self, sink: mpsc::Sender<RemoteCommand>) -> Result<(), Self::Error>;
}
