//! Command dispatch and infobar refresh.
//!
//! [`Dispatcher`] consumes [`Event`]s from a single-threaded queue and is
//! polled with the current time by the host loop.  It
//!
//! * launches a button's command on [`Event::Clicked`] and schedules an
//!   infobar refresh once the settle delay has passed,
//! * runs a refresh pass every `interval` while the window is active (or
//!   always, in background mode),
//! * tracks [`WindowState`] from focus and remote-control events, and
//! * reports everything the UI has to change as [`UiUpdate`]s.
//!
//! Within one refresh pass each distinct command string runs at most once;
//! every infobar sharing that command receives the same output.  A failing
//! command shows [`ERROR_TEXT`] on its infobars and nothing else is
//! affected.

use crate::command::{Event, RemoteCommand, UiUpdate, WindowState};
use crate::entry::{Entry, EntryId};
use crate::traits::ShellRunner;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Text shown on an infobar whose command failed.
pub const ERROR_TEXT: &str = "ERROR";

/// Refresh timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Period of the refresh timer.
    pub interval: Duration,
    /// Delay between a click and the refresh that follows it.
    pub settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            settle: Duration::from_millis(500),
        }
    }
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    /// The pass was suppressed because the window is not active.
    pub skipped: bool,
    /// Commands actually executed.
    pub executed: usize,
    /// Infobars that received new text.
    pub updated: usize,
}

/// Whether the host loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs button commands and keeps infobars up to date.
pub struct Dispatcher<R: ShellRunner> {
    runner: R,
    /// `(id, command)` in entry-file order.
    infobars: Vec<(EntryId, String)>,
    buttons: HashMap<EntryId, String>,
    state: WindowState,
    run_in_background: bool,
    timing: Timing,
    next_tick: Option<Instant>,
    pending_refresh: Option<Instant>,
    hovered: Option<EntryId>,
    ui_tx: Option<mpsc::Sender<UiUpdate>>,
}

impl<R: ShellRunner> Dispatcher<R> {
    /// Create a dispatcher for the buttons and infobars in `entries`.
    ///
    /// The window starts [`WindowState::Inactive`].
    pub fn new(runner: R, entries: &[Entry], timing: Timing) -> Self {
        let mut infobars = Vec::new();
        let mut buttons = HashMap::new();
        for entry in entries {
            match entry {
                Entry::Button(b) => {
                    buttons.insert(b.id, b.command.clone());
                }
                Entry::Infobar(i) => infobars.push((i.id, i.command.clone())),
                Entry::RowBreak | Entry::ColBreak => {}
            }
        }

        Self {
            runner,
            infobars,
            buttons,
            state: WindowState::default(),
            run_in_background: false,
            timing,
            next_tick: None,
            pending_refresh: None,
            hovered: None,
            ui_tx: None,
        }
    }

    /// Keep refreshing while the window is inactive or hidden.
    pub fn set_run_in_background(&mut self, enabled: bool) {
        self.run_in_background = enabled;
    }

    /// Attach the channel that receives [`UiUpdate`]s.
    pub fn set_ui(&mut self, tx: mpsc::Sender<UiUpdate>) {
        self.ui_tx = Some(tx);
    }

    /// Set the initial window state, before any event has been handled.
    pub fn set_state(&mut self, state: WindowState) {
        self.state = state;
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// The button currently under the pointer.
    pub fn hovered(&self) -> Option<EntryId> {
        self.hovered
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Whether a refresh pass would currently do any work.
    pub fn refresh_enabled(&self) -> bool {
        self.state == WindowState::Active || self.run_in_background
    }

    /// The earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_tick, self.pending_refresh) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Process one event.
    pub fn handle(&mut self, event: Event, now: Instant) -> Flow {
        debug!("event: {:?}", event);
        match event {
            Event::Clicked(id) => match self.buttons.get(&id) {
                Some(command) => {
                    info!("button {}: {}", id, command);
                    if let Err(e) = self.runner.launch(command) {
                        warn!("button {} command failed to start: {}", id, e);
                    }
                    self.pending_refresh = Some(now + self.timing.settle);
                }
                None => warn!("click on unknown button {}", id),
            },
            Event::HoverEnter(id) => {
                if let Some(prev) = self.hovered.replace(id) {
                    if prev != id {
                        self.emit(UiUpdate::Hover { id: prev, hovered: false });
                    }
                }
                self.emit(UiUpdate::Hover { id, hovered: true });
            }
            Event::HoverExit(id) => {
                if self.hovered == Some(id) {
                    self.hovered = None;
                    self.emit(UiUpdate::Hover { id, hovered: false });
                }
            }
            Event::WindowActivated => {
                if self.state == WindowState::Inactive {
                    self.state = WindowState::Active;
                    // Infobars may be stale after a spell in the background.
                    self.pending_refresh = Some(now);
                }
            }
            Event::WindowDeactivated => {
                if self.state == WindowState::Active {
                    self.state = WindowState::Inactive;
                }
            }
            Event::Remote(cmd) => return self.handle_remote(cmd),
        }
        Flow::Continue
    }

    fn handle_remote(&mut self, cmd: RemoteCommand) -> Flow {
        info!("remote: {}", cmd);
        match cmd {
            RemoteCommand::Show => {
                if self.state == WindowState::Hidden {
                    self.state = WindowState::Inactive;
                }
                self.emit(UiUpdate::Show);
            }
            RemoteCommand::Hide => {
                self.state = WindowState::Hidden;
                self.hovered = None;
                self.emit(UiUpdate::Hide);
            }
            RemoteCommand::Quit => {
                self.emit(UiUpdate::Quit);
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Run whatever refresh is due at `now`.
    ///
    /// A pending post-click refresh and a timer tick falling due together
    /// share one pass.  The first call only arms the timer.
    pub fn poll(&mut self, now: Instant) -> Option<PassReport> {
        let tick_due = match self.next_tick {
            Some(at) => now >= at,
            None => {
                self.next_tick = Some(now + self.timing.interval);
                false
            }
        };
        let settle_due = self.pending_refresh.is_some_and(|at| now >= at);
        if !tick_due && !settle_due {
            return None;
        }

        if tick_due {
            self.next_tick = Some(now + self.timing.interval);
        }
        if settle_due {
            self.pending_refresh = None;
        }
        Some(self.refresh())
    }

    /// Run one refresh pass now, unless the window state suppresses it.
    pub fn refresh(&mut self) -> PassReport {
        if !self.refresh_enabled() {
            debug!("refresh skipped ({:?}, background off)", self.state);
            return PassReport {
                skipped: true,
                ..PassReport::default()
            };
        }

        let Self {
            runner,
            infobars,
            ui_tx,
            ..
        } = self;
        let mut report = PassReport::default();
        let mut cache: HashMap<&str, String> = HashMap::new();

        for (id, command) in infobars.iter() {
            let text = match cache.get(command.as_str()) {
                Some(text) => {
                    debug!("infobar {}: reusing output of {:?}", id, command);
                    text.clone()
                }
                None => {
                    debug!("infobar {}: running {:?}", id, command);
                    report.executed += 1;
                    let text = match runner.capture(command) {
                        Ok(output) => output.trim_end().to_string(),
                        Err(e) => {
                            warn!("infobar {} command {:?} failed: {}", id, command, e);
                            ERROR_TEXT.to_string()
                        }
                    };
                    cache.insert(command.as_str(), text.clone());
                    text
                }
            };
            send(ui_tx, UiUpdate::InfobarText { id: *id, text });
            report.updated += 1;
        }
        report
    }

    fn emit(&self, update: UiUpdate) {
        send(&self.ui_tx, update);
    }
}

fn send(tx: &Option<mpsc::Sender<UiUpdate>>, update: UiUpdate) {
    if let Some(tx) = tx {
        // A closed receiver means the UI is gone; there is nobody to tell.
        let _ = tx.send(update);
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Button, Infobar};
    use std::collections::HashSet;

    /// Record-keeping mock shell.
    #[derive(Debug, Default)]
    struct RecorderShell {
        captured: Vec<String>,
        launched: Vec<String>,
        failing: HashSet<String>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    impl ShellRunner for RecorderShell {
        type Error = RecorderErr;

        fn capture(&mut self, command: &str) -> Result<String, RecorderErr> {
            self.captured.push(command.to_string());
            if self.failing.contains(command) {
                return Err(RecorderErr);
            }
            Ok(match command.strip_prefix("echo ") {
                Some(rest) => format!("{}\n", rest),
                None => format!("out of {}  \n\n", command),
            })
        }

        fn launch(&mut self, command: &str) -> Result<(), RecorderErr> {
            self.launched.push(command.to_string());
            if self.failing.contains(command) {
                return Err(RecorderErr);
            }
            Ok(())
        }
    }

    fn btn(id: EntryId, command: &str) -> Entry {
        Entry::Button(Button {
            id,
            label: format!("b{}", id),
            icon: None,
            command: command.into(),
            width: 150,
            height: 180,
        })
    }

    fn bar(id: EntryId, command: &str) -> Entry {
        Entry::Infobar(Infobar {
            id,
            command: command.into(),
            font_size: 32,
        })
    }

    fn dispatcher(entries: &[Entry]) -> (Dispatcher<RecorderShell>, mpsc::Receiver<UiUpdate>) {
        dispatcher_with(RecorderShell::default(), entries)
    }

    fn dispatcher_with(
        shell: RecorderShell,
        entries: &[Entry],
    ) -> (Dispatcher<RecorderShell>, mpsc::Receiver<UiUpdate>) {
        let (tx, rx) = mpsc::channel();
        let mut d = Dispatcher::new(shell, entries, Timing::default());
        d.set_ui(tx);
        d.set_state(WindowState::Active);
        (d, rx)
    }

    fn texts(rx: &mpsc::Receiver<UiUpdate>) -> Vec<(EntryId, String)> {
        rx.try_iter()
            .filter_map(|u| match u {
                UiUpdate::InfobarText { id, text } => Some((id, text)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn identical_commands_run_once_per_pass() {
        let (mut d, rx) = dispatcher(&[bar(0, "echo hi"), bar(1, "echo hi")]);
        let report = d.refresh();
        assert_eq!(report, PassReport { skipped: false, executed: 1, updated: 2 });
        assert_eq!(d.runner().captured, vec!["echo hi"]);
        assert_eq!(texts(&rx), vec![(0, "hi".into()), (1, "hi".into())]);
    }

    #[test]
    fn cache_does_not_survive_the_pass() {
        let (mut d, _rx) = dispatcher(&[bar(0, "echo hi"), bar(1, "echo hi")]);
        d.refresh();
        d.refresh();
        assert_eq!(d.runner().captured.len(), 2);
    }

    #[test]
    fn failing_command_only_affects_its_infobars() {
        let mut shell = RecorderShell::default();
        shell.failing.insert("no-such-program".into());
        let entries = [
            bar(0, "echo a"),
            bar(1, "no-such-program"),
            bar(2, "echo b"),
            bar(3, "no-such-program"),
        ];
        let (mut d, rx) = dispatcher_with(shell, &entries);
        let report = d.refresh();
        assert_eq!(report.executed, 3);
        assert_eq!(
            texts(&rx),
            vec![
                (0, "a".into()),
                (1, ERROR_TEXT.into()),
                (2, "b".into()),
                (3, ERROR_TEXT.into()),
            ]
        );
    }

    #[test]
    fn output_loses_trailing_whitespace_only() {
        let (mut d, rx) = dispatcher(&[bar(0, "date")]);
        d.refresh();
        assert_eq!(texts(&rx), vec![(0, "out of date".into())]);
    }

    #[test]
    fn inactive_window_suppresses_timer_refresh() {
        let (mut d, rx) = dispatcher(&[bar(0, "echo x")]);
        d.set_state(WindowState::Inactive);
        let t0 = Instant::now();
        assert_eq!(d.poll(t0), None);
        let report = d.poll(t0 + Duration::from_millis(1000)).unwrap();
        assert!(report.skipped);
        assert!(d.runner().captured.is_empty());
        assert!(texts(&rx).is_empty());
    }

    #[test]
    fn active_window_refreshes_on_timer() {
        let (mut d, rx) = dispatcher(&[bar(0, "echo x")]);
        let t0 = Instant::now();
        assert_eq!(d.poll(t0), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(999)), None);
        let report = d.poll(t0 + Duration::from_millis(1000)).unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(texts(&rx), vec![(0, "x".into())]);
        // Re-armed relative to the tick that ran.
        assert_eq!(d.poll(t0 + Duration::from_millis(1500)), None);
        assert!(d.poll(t0 + Duration::from_millis(2000)).is_some());
    }

    #[test]
    fn background_mode_refreshes_while_inactive_or_hidden() {
        let (mut d, _rx) = dispatcher(&[bar(0, "echo x")]);
        d.set_run_in_background(true);
        d.set_state(WindowState::Inactive);
        assert_eq!(d.refresh().executed, 1);
        d.set_state(WindowState::Hidden);
        assert_eq!(d.refresh().executed, 1);
    }

    #[test]
    fn click_launches_and_refreshes_after_settle() {
        let (mut d, rx) = dispatcher(&[btn(0, "touch /tmp/x"), bar(1, "echo y")]);
        let t0 = Instant::now();
        d.poll(t0);
        assert_eq!(d.handle(Event::Clicked(0), t0), Flow::Continue);
        assert_eq!(d.runner().launched, vec!["touch /tmp/x"]);

        assert_eq!(d.poll(t0 + Duration::from_millis(499)), None);
        let report = d.poll(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(texts(&rx), vec![(1, "y".into())]);
        // The settle refresh is one-shot.
        assert_eq!(d.poll(t0 + Duration::from_millis(600)), None);
    }

    #[test]
    fn failed_launch_still_refreshes() {
        let mut shell = RecorderShell::default();
        shell.failing.insert("broken".into());
        let (mut d, _rx) = dispatcher_with(shell, &[btn(0, "broken"), bar(1, "echo y")]);
        let t0 = Instant::now();
        d.poll(t0);
        d.handle(Event::Clicked(0), t0);
        assert!(d.poll(t0 + Duration::from_millis(500)).is_some());
    }

    #[test]
    fn click_on_unknown_or_infobar_id_is_ignored() {
        let (mut d, _rx) = dispatcher(&[btn(0, "a"), bar(1, "echo y")]);
        d.handle(Event::Clicked(1), Instant::now());
        d.handle(Event::Clicked(99), Instant::now());
        assert!(d.runner().launched.is_empty());
        assert_eq!(d.next_deadline(), None);
    }

    #[test]
    fn settle_and_tick_share_one_pass() {
        let (mut d, _rx) = dispatcher(&[btn(0, "a"), bar(1, "echo y")]);
        let t0 = Instant::now();
        d.poll(t0);
        // Settle falls due at t0 + 1000ms, together with the first tick.
        d.handle(Event::Clicked(0), t0 + Duration::from_millis(500));
        assert_eq!(d.runner().launched, vec!["a"]);
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(1000)));

        let report = d.poll(t0 + Duration::from_millis(1000)).unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(d.runner().captured, vec!["echo y"]);
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(2000)));
        assert_eq!(d.poll(t0 + Duration::from_millis(1001)), None);
    }

    #[test]
    fn focus_transitions() {
        let (mut d, _rx) = dispatcher(&[bar(0, "echo y")]);
        let now = Instant::now();
        d.handle(Event::WindowDeactivated, now);
        assert_eq!(d.state(), WindowState::Inactive);
        d.handle(Event::WindowActivated, now);
        assert_eq!(d.state(), WindowState::Active);
        // Activation refreshes right away.
        assert!(d.poll(now).is_some_and(|r| r.executed == 1));
    }

    #[test]
    fn remote_commands_drive_visibility() {
        let (mut d, rx) = dispatcher(&[]);
        let now = Instant::now();
        assert_eq!(d.handle(Event::Remote(RemoteCommand::Hide), now), Flow::Continue);
        assert_eq!(d.state(), WindowState::Hidden);
        // A hidden window cannot be focused.
        d.handle(Event::WindowActivated, now);
        assert_eq!(d.state(), WindowState::Hidden);
        d.handle(Event::Remote(RemoteCommand::Show), now);
        assert_eq!(d.state(), WindowState::Inactive);
        assert_eq!(d.handle(Event::Remote(RemoteCommand::Quit), now), Flow::Quit);

        let updates: Vec<UiUpdate> = rx.try_iter().collect();
        assert_eq!(updates, vec![UiUpdate::Hide, UiUpdate::Show, UiUpdate::Quit]);
    }

    #[test]
    fn hidden_window_skips_refresh() {
        let (mut d, _rx) = dispatcher(&[bar(0, "echo y")]);
        d.handle(Event::Remote(RemoteCommand::Hide), Instant::now());
        assert!(d.refresh().skipped);
        assert!(d.runner().captured.is_empty());
    }

    #[test]
    fn hover_tracks_single_button() {
        let (mut d, rx) = dispatcher(&[btn(0, "a"), btn(1, "b")]);
        let now = Instant::now();
        d.handle(Event::HoverEnter(0), now);
        d.handle(Event::HoverEnter(1), now);
        d.handle(Event::HoverExit(0), now);
        assert_eq!(d.hovered(), Some(1));
        d.handle(Event::HoverExit(1), now);
        assert_eq!(d.hovered(), None);

        let updates: Vec<UiUpdate> = rx.try_iter().collect();
        assert_eq!(
            updates,
            vec![
                UiUpdate::Hover { id: 0, hovered: true },
                UiUpdate::Hover { id: 0, hovered: false },
                UiUpdate::Hover { id: 1, hovered: true },
                UiUpdate::Hover { id: 1, hovered: false },
            ]
        );
    }

    #[test]
    fn next_deadline_reports_earliest_work() {
        let (mut d, _rx) = dispatcher(&[btn(0, "a")]);
        let t0 = Instant::now();
        assert_eq!(d.next_deadline(), None);
        d.poll(t0);
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(1000)));
        d.handle(Event::Clicked(0), t0);
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(500)));
    }
}
