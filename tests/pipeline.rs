//! End-to-end: entry text → layout → markup → dispatcher.

use btngrid::command::{Event, RemoteCommand, UiUpdate, WindowState};
use btngrid::dispatcher::{Dispatcher, Flow, Timing, ERROR_TEXT};
use btngrid::entry::{parse_entries, Entry, EntryDefaults};
use btngrid::grid::{Geometry, Layout, Orientation, Rotation, Row};
use btngrid::icon::IconResolver;
use btngrid::markup::{self, MarkupStyle};
use btngrid::traits::ShellRunner;
use std::sync::mpsc;
use std::time::{Duration, Instant};

const MENU: &str = r#"
# power menu
Lock,   system-lock-screen, loginctl lock-session
Suspend,120,140,, systemctl suspend
rowbreak
infobar, 18, date +%H:%M
infobar, uptime -p
colbreak
Reboot, , systemctl reboot
infobar, date +%H:%M
infobar, \
    false
"#;

#[derive(Default)]
struct FakeShell {
    captured: Vec<String>,
    launched: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("command failed")]
struct FakeError;

impl ShellRunner for FakeShell {
    type Error = FakeError;

    fn capture(&mut self, command: &str) -> Result<String, FakeError> {
        self.captured.push(command.to_string());
        match command {
            "false" => Err(FakeError),
            "date +%H:%M" => Ok("12:34\n".into()),
            other => Ok(format!("{}\n", other.len())),
        }
    }

    fn launch(&mut self, command: &str) -> Result<(), FakeError> {
        self.launched.push(command.to_string());
        Ok(())
    }
}

fn entries() -> Vec<Entry> {
    let icons = IconResolver::new("/nonexistent-icon-base", "hicolor", 256);
    parse_entries(MENU, EntryDefaults::default(), &icons).unwrap()
}

fn infobar_texts(rx: &mpsc::Receiver<UiUpdate>) -> Vec<(u32, String)> {
    rx.try_iter()
        .filter_map(|u| match u {
            UiUpdate::InfobarText { id, text } => Some((id, text)),
            _ => None,
        })
        .collect()
}

#[test]
fn parse_and_layout() {
    let entries = entries();
    assert_eq!(entries.len(), 9);

    let layout = Layout::build(&entries, Geometry::new(800, 480), Orientation::None, 7);
    assert_eq!(layout.rotation, Rotation::Deg0);
    assert_eq!(layout.grid.columns.len(), 2);
    assert_eq!(
        layout.grid.columns[0].rows,
        vec![Row::Buttons(vec![0, 1]), Row::Infobar(2), Row::Infobar(3)]
    );
    assert_eq!(
        layout.grid.columns[1].rows,
        vec![Row::Buttons(vec![4]), Row::Infobar(5), Row::Infobar(6)]
    );
    assert_eq!(layout.grid.flatten(), (0..7).collect::<Vec<_>>());
}

#[test]
fn markup_names_every_widget() {
    let entries = entries();
    let layout = Layout::build(&entries, Geometry::new(480, 800), Orientation::Landscape, 7);
    assert_eq!(layout.rotation, Rotation::Deg90);

    let xml = markup::generate(&layout, &entries, &MarkupStyle::default()).unwrap();
    for id in [0, 1, 4] {
        assert!(xml.contains(&format!(r#"id="button{}""#, id)), "button{}", id);
    }
    for id in [2, 3, 5, 6] {
        assert!(xml.contains(&format!(r#"id="infobar{}""#, id)), "infobar{}", id);
    }
    assert!(xml.contains("(uint32 1, &apos;systemctl suspend&apos;)"));
    assert!(xml.contains("rotated"));
}

#[test]
fn refresh_pass_dedups_and_marks_errors() {
    let entries = entries();
    let (ui_tx, ui_rx) = mpsc::channel();
    let mut d = Dispatcher::new(FakeShell::default(), &entries, Timing::default());
    d.set_ui(ui_tx);
    d.set_state(WindowState::Active);

    let report = d.refresh();
    assert_eq!(report.executed, 3);
    assert_eq!(report.updated, 4);
    assert_eq!(d.runner().captured, vec!["date +%H:%M", "uptime -p", "false"]);
    assert_eq!(
        infobar_texts(&ui_rx),
        vec![
            (2, "12:34".to_string()),
            (3, "9".to_string()),
            (5, "12:34".to_string()),
            (6, ERROR_TEXT.to_string()),
        ]
    );
}

#[test]
fn click_then_settle_refresh() {
    let entries = entries();
    let timing = Timing {
        interval: Duration::from_secs(60),
        settle: Duration::from_millis(500),
    };
    let (ui_tx, ui_rx) = mpsc::channel();
    let mut d = Dispatcher::new(FakeShell::default(), &entries, timing);
    d.set_ui(ui_tx);
    d.set_state(WindowState::Active);

    let t0 = Instant::now();
    assert!(d.poll(t0).is_none());
    assert_eq!(d.handle(Event::Clicked(4), t0), Flow::Continue);
    assert_eq!(d.runner().launched, vec!["systemctl reboot"]);

    assert!(d.poll(t0 + Duration::from_millis(100)).is_none());
    let report = d.poll(t0 + Duration::from_millis(500)).unwrap();
    assert_eq!(report.updated, 4);
    assert_eq!(infobar_texts(&ui_rx).len(), 4);
}

#[test]
fn remote_hide_show_quit() {
    let entries = entries();
    let (ui_tx, ui_rx) = mpsc::channel();
    let mut d = Dispatcher::new(FakeShell::default(), &entries, Timing::default());
    d.set_ui(ui_tx);
    d.set_state(WindowState::Hidden);
    let now = Instant::now();

    assert!(d.refresh().skipped);
    d.handle(Event::Remote(RemoteCommand::Show), now);
    assert_eq!(d.state(), WindowState::Inactive);
    d.handle(Event::WindowActivated, now);
    assert_eq!(d.state(), WindowState::Active);
    assert_eq!(d.handle(Event::Remote(RemoteCommand::Quit), now), Flow::Quit);

    let updates: Vec<UiUpdate> = ui_rx.try_iter().collect();
    assert_eq!(updates, vec![UiUpdate::Show, UiUpdate::Quit]);
}
