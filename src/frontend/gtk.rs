//! GTK4 frontend that runs on the **main thread**.
//!
//! The widget tree comes from [`markup::generate`](crate::markup::generate)
//! and is loaded with a `GtkBuilder`.  This module only wires it up:
//!
//! * the `launcher.run` action turns button clicks into [`Event::Clicked`],
//! * a motion controller on every button reports hover enter/leave,
//! * the window's `is-active` property reports focus changes,
//! * a GLib timeout drains all channels into the [`Dispatcher`] and applies
//!   the resulting [`UiUpdate`]s.
//!
//! When the screen is taller than wide (or the reverse, with `--portrait`)
//! the grid is turned 90° clockwise inside the `GtkFixed` viewport.
//!
//! # CSS
//!
//! A built-in stylesheet covers the classes listed in
//! [`markup`](crate::markup).  `$XDG_CONFIG_HOME/btngrid/style.css`
//! replaces it entirely when present.

use crate::command::{Event, RemoteCommand, UiUpdate, WindowState};
use crate::dispatcher::{Dispatcher, Flow};
use crate::entry::{button_widget_name, infobar_widget_name, Entry, EntryId};
use crate::grid::{Geometry, Layout, Rotation};
use crate::markup::{ACTION_GROUP, GRID_ID, RUN_ACTION, RUN_ACTION_TYPE, VIEWPORT_ID};
use crate::traits::ShellRunner;
use gtk4::prelude::*;
use gtk4::{gdk, gio, glib, graphene, gsk};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// How often the main loop drains channels and polls the dispatcher.
const TICK: Duration = Duration::from_millis(50);

/// Class toggled on the button under the pointer.
const HOVER_CLASS: &str = "hover";

//  Default CSS

const DEFAULT_CSS: &str = r#"
window,
window.background {
    background-color: #202020;
}

.btngrid-button {
    padding: 0;
    border: 5px solid black;
    border-radius: 0;
    background-image: linear-gradient(to bottom, gray, white);
}

.btngrid-button:hover,
.btngrid-button.hover {
    background-image: linear-gradient(to bottom, #404040, white);
}

.btngrid-button:active {
    background-image: linear-gradient(to bottom, #c0c0c0, white);
}

.btngrid-button label {
    color: black;
}

.infobar {
    color: white;
}
"#;

/// Errors that prevent the window from being built.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("failed to initialise GTK4: {0}")]
    Init(#[from] glib::BoolError),
    #[error("invalid action parameter type: {0}")]
    ActionType(glib::BoolError),
    #[error("generated markup has no object {0:?}")]
    MissingObject(&'static str),
}

/// Window behaviour chosen on the command line.
#[derive(Debug, Clone, Default)]
pub struct WindowOptions {
    pub fullscreen: bool,
    /// Start hidden and hide on close instead of quitting.
    pub remote_control: bool,
    pub css_path: Option<PathBuf>,
}

/// Initialise GTK on the current thread.
pub fn init() -> Result<(), FrontendError> {
    gtk4::init()?;
    info!("GTK4 initialised on main thread");
    Ok(())
}

/// Size of the first monitor, if a display is available.
///
/// Call [`init`] first.
pub fn monitor_geometry() -> Option<Geometry> {
    let display = gdk::Display::default()?;
    let monitor = display.monitors().item(0).and_downcast::<gdk::Monitor>()?;
    let rect = monitor.geometry();
    debug!("first monitor: {}x{}", rect.width(), rect.height());
    Some(Geometry::new(rect.width().max(0) as u32, rect.height().max(0) as u32))
}

//  Public API

/// Build the window from `markup` and run the GLib main loop until quit.
pub fn run_main_loop<R: ShellRunner + 'static>(
    mut dispatcher: Dispatcher<R>,
    layout: &Layout,
    entries: &[Entry],
    markup: &str,
    remote_rx: Option<mpsc::Receiver<RemoteCommand>>,
    options: WindowOptions,
) -> Result<(), FrontendError> {
    load_css(&options.css_path);

    let builder = gtk4::Builder::from_string(markup);
    let viewport: gtk4::Fixed = builder
        .object(VIEWPORT_ID)
        .ok_or(FrontendError::MissingObject(VIEWPORT_ID))?;
    let grid: gtk4::Widget = builder
        .object(GRID_ID)
        .ok_or(FrontendError::MissingObject(GRID_ID))?;

    let window = gtk4::Window::new();
    window.set_title(Some("btngrid"));
    window.set_default_size(to_i32(layout.screen.width), to_i32(layout.screen.height));
    window.set_child(Some(&viewport));

    if layout.rotation == Rotation::Deg90 {
        let transform = gsk::Transform::new()
            .translate(&graphene::Point::new(to_i32(layout.screen.width) as f32, 0.0))
            .rotate(90.0);
        viewport.set_child_transform(&grid, Some(&transform));
        info!("grid rotated by {}", layout.rotation);
    }

    let (event_tx, event_rx) = mpsc::channel::<Event>();

    //  Button action
    let target_type = glib::VariantTy::new(RUN_ACTION_TYPE).map_err(FrontendError::ActionType)?;
    let run = gio::SimpleAction::new(RUN_ACTION, Some(target_type));
    {
        let tx = event_tx.clone();
        run.connect_activate(move |_, target| {
            match target.and_then(|v| v.get::<(u32, String)>()) {
                Some((id, command)) => {
                    debug!("activated button {} ({:?})", id, command);
                    let _ = tx.send(Event::Clicked(id));
                }
                None => warn!("{}.{} activated without a target", ACTION_GROUP, RUN_ACTION),
            }
        });
    }
    let actions = gio::SimpleActionGroup::new();
    actions.add_action(&run);
    window.insert_action_group(ACTION_GROUP, Some(&actions));

    //  Widgets updated at runtime
    let mut buttons: HashMap<EntryId, gtk4::Button> = HashMap::new();
    let mut infobars: HashMap<EntryId, gtk4::Label> = HashMap::new();
    for entry in entries {
        match entry {
            Entry::Button(b) => {
                let Some(button) = builder.object::<gtk4::Button>(button_widget_name(b.id).as_str())
                else {
                    continue;
                };
                attach_hover(&button, b.id, &event_tx);
                buttons.insert(b.id, button);
            }
            Entry::Infobar(i) => {
                if let Some(label) = builder.object::<gtk4::Label>(infobar_widget_name(i.id).as_str()) {
                    infobars.insert(i.id, label);
                }
            }
            Entry::RowBreak | Entry::ColBreak => {}
        }
    }
    info!("{} button(s), {} infobar(s) wired", buttons.len(), infobars.len());

    //  Focus
    {
        let tx = event_tx.clone();
        window.connect_is_active_notify(move |w| {
            let event = if w.is_active() {
                Event::WindowActivated
            } else {
                Event::WindowDeactivated
            };
            let _ = tx.send(event);
        });
    }

    //  Close
    {
        let tx = event_tx.clone();
        let remote_control = options.remote_control;
        window.connect_close_request(move |w| {
            if remote_control {
                w.set_visible(false);
                let _ = tx.send(Event::Remote(RemoteCommand::Hide));
            } else {
                let _ = tx.send(Event::Remote(RemoteCommand::Quit));
            }
            glib::Propagation::Stop
        });
    }

    //  Dispatcher output
    let (ui_tx, ui_rx) = mpsc::channel::<UiUpdate>();
    dispatcher.set_ui(ui_tx);
    if options.remote_control {
        dispatcher.set_state(WindowState::Hidden);
        info!("started hidden, waiting for a show command");
    } else {
        show_window(&window, options.fullscreen);
    }
    dispatcher.refresh();
    apply_updates(&ui_rx, &window, &buttons, &infobars, options.fullscreen);

    let main_loop = glib::MainLoop::new(None, false);

    //  Main event loop
    {
        let main_loop = main_loop.clone();
        let window = window.clone();
        glib::timeout_add_local(TICK, move || {
            let now = Instant::now();
            let mut flow = Flow::Continue;

            // 1. Remote commands.
            if let Some(rx) = &remote_rx {
                while let Ok(cmd) = rx.try_recv() {
                    let _ = event_tx.send(Event::Remote(cmd));
                }
            }

            // 2. Window events.
            while let Ok(event) = event_rx.try_recv() {
                if dispatcher.handle(event, now) == Flow::Quit {
                    flow = Flow::Quit;
                    break;
                }
            }

            // 3. Timed refreshes.
            if flow == Flow::Continue {
                dispatcher.poll(now);
            }

            // 4. Widgets.
            apply_updates(&ui_rx, &window, &buttons, &infobars, options.fullscreen);

            if flow == Flow::Quit {
                info!("quit requested");
                main_loop.quit();
                return glib::ControlFlow::Break;
            }
            glib::ControlFlow::Continue
        });
    }

    info!("entering GLib main loop");
    main_loop.run();
    window.destroy();
    info!("GLib main loop exited");
    Ok(())
}

/// GTK sizes are `i32`; saturate instead of wrapping.
fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn attach_hover(button: &gtk4::Button, id: EntryId, tx: &mpsc::Sender<Event>) {
    let motion = gtk4::EventControllerMotion::new();
    {
        let tx = tx.clone();
        motion.connect_enter(move |_, _, _| {
            let _ = tx.send(Event::HoverEnter(id));
        });
    }
    {
        let tx = tx.clone();
        motion.connect_leave(move |_| {
            let _ = tx.send(Event::HoverExit(id));
        });
    }
    button.add_controller(motion);
}

fn show_window(window: &gtk4::Window, fullscreen: bool) {
    if fullscreen {
        window.fullscreen();
    }
    window.present();
}

fn apply_updates(
    ui_rx: &mpsc::Receiver<UiUpdate>,
    window: &gtk4::Window,
    buttons: &HashMap<EntryId, gtk4::Button>,
    infobars: &HashMap<EntryId, gtk4::Label>,
    fullscreen: bool,
) {
    while let Ok(update) = ui_rx.try_recv() {
        match update {
            UiUpdate::InfobarText { id, text } => {
                if let Some(label) = infobars.get(&id) {
                    label.set_text(&text);
                }
            }
            UiUpdate::Hover { id, hovered } => {
                if let Some(button) = buttons.get(&id) {
                    if hovered {
                        button.add_css_class(HOVER_CLASS);
                    } else {
                        button.remove_css_class(HOVER_CLASS);
                    }
                }
            }
            UiUpdate::Show => show_window(window, fullscreen),
            UiUpdate::Hide => window.set_visible(false),
            UiUpdate::Quit => window.set_visible(false),
        }
    }
}

//  CSS loading

fn load_css(css_path: &Option<PathBuf>) {
    let provider = gtk4::CssProvider::new();

    let css_content = match css_path.as_ref().filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => {
            info!("no user CSS, using built-in default");
            DEFAULT_CSS.to_string()
        }
    };

    #[allow(deprecated)]
    provider.load_from_data(&css_content);

    match gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => warn!("no GDK display, CSS will not be applied"),
    }
}
