//! Entry point for the **btngrid** launcher.
//!
//! Parses the command line and the entry file, builds the layout and its
//! markup, then hands a [`Dispatcher`] to the frontend.
//!
//! When the `frontend-gtk` feature is enabled the main thread runs the GLib
//! main loop (GTK4 requires it).  Without the feature, a headless loop
//! refreshes infobars and logs their text.

use btngrid::cli::Args;
use btngrid::command::RemoteCommand;
use btngrid::config::Config;
use btngrid::dispatcher::Dispatcher;
use btngrid::entry::{load_entries, Entry};
use btngrid::grid::{Geometry, Layout};
use btngrid::ipc::{self, listener::UnixSocketListener};
use btngrid::markup::{self, MarkupStyle};
use btngrid::shell::SystemShell;
use btngrid::traits::CommandSource;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;

/// Resolve the config directory (`$XDG_CONFIG_HOME/btngrid`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("btngrid")
}

/// Try to load settings from `$XDG_CONFIG_HOME/btngrid/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();
    let args = Args::parse();
    let config = load_config();

    let entries = match load_entries(
        &args.config_file,
        config.entry_defaults(),
        &config.icon_resolver(),
    ) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("btngrid: {}", e);
            std::process::exit(1);
        }
    };
    info!("{} entries from {}", entries.len(), args.config_file.display());

    let screen = screen_geometry(&args, &config);
    let layout = Layout::build(&entries, screen, args.orientation(), config.layout.max_row_len);
    if layout.grid.is_empty() {
        warn!("{} has no buttons or infobars", args.config_file.display());
    }
    info!(
        "layout: {} column(s) on {}x{}, rotation {}",
        layout.grid.columns.len(),
        screen.width,
        screen.height,
        layout.rotation
    );

    let style = MarkupStyle {
        scale: args.scale(),
        spacing: config.layout.spacing,
        label_font_size: config.button.label_font_size,
        alignment: args.alignment(),
    };
    let markup = match markup::generate(&layout, &entries, &style) {
        Ok(markup) => markup,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if args.print_markup {
        print!("{}", markup);
        return;
    }

    let mut dispatcher = Dispatcher::new(
        SystemShell::new(config.command_timeout()),
        &entries,
        config.timing(),
    );
    dispatcher.set_run_in_background(args.run_in_background);

    let remote_rx = args.dbus.as_deref().map(spawn_remote_listener);

    start_event_loop(dispatcher, &layout, &entries, &markup, remote_rx, &args);
}

/// Window size: `--size`, else the first monitor, else the configured fallback.
fn screen_geometry(args: &Args, config: &Config) -> Geometry {
    if let Some(size) = args.size {
        return size;
    }
    #[cfg(feature = "frontend-gtk")]
    {
        match btngrid::frontend::gtk::init() {
            Ok(()) => {
                if let Some(g) = btngrid::frontend::gtk::monitor_geometry() {
                    return g;
                }
                warn!("no monitor found");
            }
            Err(e) => warn!("{}", e),
        }
    }
    let fallback = Geometry::new(config.layout.fallback_width, config.layout.fallback_height);
    warn!("using fallback size {}x{}", fallback.width, fallback.height);
    fallback
}

//  Event loops

#[cfg(feature = "frontend-gtk")]
fn start_event_loop(
    dispatcher: Dispatcher<SystemShell>,
    layout: &Layout,
    entries: &[Entry],
    markup: &str,
    remote_rx: Option<mpsc::Receiver<RemoteCommand>>,
    args: &Args,
) {
    use btngrid::frontend::gtk;

    // Already initialised when the monitor was queried; a repeat is a no-op.
    if let Err(e) = gtk::init() {
        error!("{}", e);
        std::process::exit(1);
    }
    let options = gtk::WindowOptions {
        fullscreen: args.fullscreen(),
        remote_control: args.dbus.is_some(),
        css_path: Some(config_dir().join("style.css")),
    };
    if let Err(e) = gtk::run_main_loop(dispatcher, layout, entries, markup, remote_rx, options) {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "frontend-gtk"))]
fn start_event_loop(
    mut dispatcher: Dispatcher<SystemShell>,
    _layout: &Layout,
    _entries: &[Entry],
    _markup: &str,
    remote_rx: Option<mpsc::Receiver<RemoteCommand>>,
    _args: &Args,
) {
    use btngrid::command::{Event, UiUpdate, WindowState};
    use btngrid::dispatcher::Flow;
    use std::time::{Duration, Instant};

    let (ui_tx, ui_rx) = mpsc::channel();
    dispatcher.set_ui(ui_tx);
    dispatcher.set_state(WindowState::Active);
    info!("btngrid running headless");

    dispatcher.refresh();
    loop {
        let now = Instant::now();
        if let Some(rx) = &remote_rx {
            let mut quit = false;
            while let Ok(cmd) = rx.try_recv() {
                if dispatcher.handle(Event::Remote(cmd), now) == Flow::Quit {
                    quit = true;
                    break;
                }
            }
            if quit {
                break;
            }
        }
        dispatcher.poll(now);
        for update in ui_rx.try_iter() {
            if let UiUpdate::InfobarText { id, text } = update {
                info!("infobar {}: {}", id, text);
            }
        }

        let wait = dispatcher
            .next_deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_millis(50))
            .min(Duration::from_millis(50));
        std::thread::sleep(wait);
    }
    info!("quit requested, exiting");
}

//  Helpers

/// Start the remote-control listener on its own thread.
fn spawn_remote_listener(suffix: &str) -> mpsc::Receiver<RemoteCommand> {
    let (tx, rx) = mpsc::channel();
    let path = ipc::socket_path(suffix);
    info!("remote control as {}", ipc::service_name(suffix));
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
    rx
}
