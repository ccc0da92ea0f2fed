//! [`ShellRunner`] implementation backed by `sh -c`.
//!
//! Infobar commands are run to completion with their standard output
//! captured.  A command still running when the timeout expires is killed;
//! the refresh pass only ever waits that long for one command.
//!
//! Button commands are launched and left alone.  Finished children are
//! reaped the next time a command is launched.

use crate::traits::ShellRunner;
use log::debug;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::string::FromUtf8Error;
use std::sync::mpsc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Errors from running a shell command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn shell: {0}")]
    Spawn(std::io::Error),
    #[error("failed to wait for command: {0}")]
    Wait(std::io::Error),
    #[error("failed to read command output: {0}")]
    Read(std::io::Error),
    #[error("command exited with {0}")]
    NonZeroExit(ExitStatus),
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("command output is not valid UTF-8: {0}")]
    Decode(#[from] FromUtf8Error),
}

/// Runs commands with `/bin/sh -c`.
#[derive(Debug, Default)]
pub struct SystemShell {
    timeout: Option<Duration>,
    launched: Vec<Child>,
}

impl SystemShell {
    /// Create a shell runner.  `timeout` bounds each captured command;
    /// `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            launched: Vec::new(),
        }
    }

    fn spawn(command: &str, stdout: Stdio) -> Result<Child, ExecError> {
        Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(stdout)
            .spawn()
            .map_err(ExecError::Spawn)
    }

    /// Drop handles of launched commands that have exited.
    fn reap(&mut self) {
        self.launched
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_)) | Err(_)));
    }
}

impl ShellRunner for SystemShell {
    type Error = ExecError;

    fn capture(&mut self, command: &str) -> Result<String, ExecError> {
        let started = Instant::now();
        let mut child = Self::spawn(command, Stdio::piped())?;

        // Drain stdout off-thread so a chatty command cannot fill the pipe
        // while we poll for its exit.
        let (out_tx, out_rx) = mpsc::channel();
        if let Some(mut stdout) = child.stdout.take() {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = out_tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
            });
        }

        let deadline = self.timeout.map(|t| started + t);
        let status = loop {
            if let Some(status) = child.try_wait().map_err(ExecError::Wait)? {
                break status;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Timeout(self.timeout.unwrap_or_default()));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        // A backgrounded grandchild may keep stdout open after the shell
        // exits; do not wait for it past the deadline.
        let output = match deadline {
            Some(d) => out_rx.recv_timeout(d.saturating_duration_since(Instant::now())),
            None => out_rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };
        let bytes = match output {
            Ok(read) => read.map_err(ExecError::Read)?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(ExecError::Timeout(self.timeout.unwrap_or_default()))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Vec::new(),
        };

        debug!("{:?} finished in {:?} ({})", command, started.elapsed(), status);
        if !status.success() {
            return Err(ExecError::NonZeroExit(status));
        }
        Ok(String::from_utf8(bytes)?)
    }

    fn launch(&mut self, command: &str) -> Result<(), ExecError> {
        self.reap();
        let child = Self::spawn(command, Stdio::inherit())?;
        debug!("launched {:?} (pid {})", command, child.id());
        self.launched.push(child);
        Ok(())
    }
}

//  Tests
