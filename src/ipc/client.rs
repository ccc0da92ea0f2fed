//! Sending remote-control commands to a running instance.

use crate::command::RemoteCommand;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// Errors from delivering a command.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no instance listening on {}: {}", .0.display(), .1)]
    Connect(PathBuf, std::io::Error),
    #[error("failed to send command: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Send one command to the listener at `path`.
pub fn send(path: &Path, cmd: RemoteCommand) -> Result<(), ClientError> {
    let mut stream =
        UnixStream::connect(path).map_err(|e| ClientError::Connect(path.to_path_buf(), e))?;
    let line = serde_json::to_string(&cmd)?;
    writeln!(stream, "{}", line)?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::listener::UnixSocketListener;
    use crate::traits::CommandSource;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn send_reaches_listener() {
        let path = std::env::temp_dir().join(format!("btngrid-client-{}.sock", std::process::id()));
        let (tx, rx) = mpsc::channel();
        let listen_path = path.clone();
        std::thread::spawn(move || {
            let _ = UnixSocketListener::new(&listen_path).run(tx);
        });
        std::thread::sleep(Duration::from_millis(150));

        send(&path, RemoteCommand::Hide).unwrap();
        let cmd = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(cmd, RemoteCommand::Hide);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn send_without_listener_fails() {
        let path = std::env::temp_dir().join(format!("btngrid-nobody-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let err = send(&path, RemoteCommand::Show).unwrap_err();
        assert!(matches!(err, ClientError::Connect(..)));
    }
}
