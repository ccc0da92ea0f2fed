//! Remote control for a launcher started with `--dbus=SUFFIX`.
//!
//! Run with:
//!     btngrid-ctl powermenu show
//!
//! Exits with status 1 when no instance is listening.

use btngrid::command::{parse_remote_command, RemoteCommand};
use btngrid::ipc;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "btngrid-ctl", version, about = "Show, hide or quit a running btngrid")]
struct Args {
    /// Suffix the instance was started with
    #[arg(value_parser = parse_suffix)]
    suffix: String,

    /// show, hide or quit
    #[arg(value_parser = parse_command)]
    command: RemoteCommand,
}

fn parse_suffix(s: &str) -> Result<String, String> {
    if ipc::is_valid_suffix(s) {
        Ok(s.to_string())
    } else {
        Err(format!("SUFFIX may contain only lowercase letters a-z, got {:?}", s))
    }
}

fn parse_command(s: &str) -> Result<RemoteCommand, String> {
    parse_remote_command(s).ok_or_else(|| format!("expected show, hide or quit, got {:?}", s))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let path = ipc::socket_path(&args.suffix);
    log::debug!("sending {} to {}", args.command, path.display());
    if let Err(e) = ipc::client::send(&path, args.command) {
        eprintln!("btngrid-ctl: {}", e);
        std::process::exit(1);
    }
}
