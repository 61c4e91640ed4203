use std::time::Instant;

use crossterm::event::KeyEvent;

use crate::catalog::Catalog;
use crate::input::{self, Action, InputMode};
use crate::loader;
use crate::playback::{Event, Store, INTERVAL_STEP_MS, MAX_INTERVAL_MS, MIN_INTERVAL_MS};
use crate::timer::Timer;
use crate::ui::LOG_ROWS;

const MAX_DELAY_DIGITS: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picker {
    pub query: String,
    /// Index into the filtered list, not into the catalog.
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Picker(Picker),
    DelayEdit(String),
}

pub struct App {
    pub store: Store,
    pub catalog: Catalog,
    pub mode: Mode,
    pub timer: Timer,
    /// One-shot message for the controls bar, cleared by the next key.
    pub status: Option<String>,
    /// Log lines scrolled up from the newest one; 0 follows new lines.
    pub log_back: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(catalog: Catalog, initial_flow: &str, interval_ms: u64) -> Self {
        let mut app = Self {
            store: Store::new(interval_ms),
            catalog,
            mode: Mode::Normal,
            timer: Timer::default(),
            status: None,
            log_back: 0,
            should_quit: false,
        };
        app.select_flow(initial_flow, Instant::now());
        app
    }

    pub fn input_mode(&self) -> InputMode {
        match self.mode {
            Mode::Normal => InputMode::Normal,
            Mode::Picker(_) => InputMode::Picker,
            Mode::DelayEdit(_) => InputMode::DelayEdit,
        }
    }

    /// Loads `name` from the catalog afresh and makes it the current flow.
    pub fn select_flow(&mut self, name: &str, now: Instant) {
        let outcome = match self.catalog.get(name) {
            Ok(entry) => loader::load_flow(&entry.path),
            Err(err) => {
                self.status = Some(err.to_string());
                return;
            }
        };
        if let Err(err) = &outcome {
            tracing::error!(flow = name, error = %err, "flow failed to load");
        } else {
            tracing::info!(flow = name, "flow selected");
        }
        self.dispatch(
            Event::SelectFlow {
                name: name.to_string(),
                outcome,
            },
            now,
        );
        self.log_back = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(action) = input::map_key(self.input_mode(), key) {
            self.status = None;
            self.apply(action, now);
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        let before = self.log_len();
        self.store.dispatch(Event::Tick);
        self.timer.rearm(&self.store.get_state().playback, now);
        self.hold_log_position(before);
    }

    fn log_len(&self) -> usize {
        let state = self.store.get_state();
        match state.flow() {
            Some(flow) if !flow.steps.is_empty() => {
                flow.clamp_step(state.playback.current_step) + 1
            }
            _ => 0,
        }
    }

    fn max_log_back(&self) -> usize {
        self.log_len().saturating_sub(LOG_ROWS)
    }

    /// While scrolled back, keeps the same lines on screen as new ones are
    /// appended below.
    fn hold_log_position(&mut self, before: usize) {
        if self.log_back > 0 {
            let added = self.log_len().saturating_sub(before);
            self.log_back = (self.log_back + added).min(self.max_log_back());
        }
    }

    pub fn apply(&mut self, action: Action, now: Instant) {
        if action == Action::Quit {
            self.should_quit = true;
            return;
        }

        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.apply_normal(action, now),
            Mode::Picker(picker) => self.apply_picker(picker, action, now),
            Mode::DelayEdit(buffer) => self.apply_delay_edit(buffer, action, now),
        }
    }

    fn apply_normal(&mut self, action: Action, now: Instant) {
        let interval = self.store.get_state().playback.interval_ms;
        match action {
            Action::TogglePlay => self.dispatch(Event::TogglePlay, now),
            Action::StepForward => self.dispatch(Event::StepBy(1), now),
            Action::StepBack => self.dispatch(Event::StepBy(-1), now),
            Action::FirstStep => self.dispatch(Event::Scrub(0), now),
            Action::LastStep => self.dispatch(Event::Scrub(usize::MAX), now),
            Action::DelayUp => {
                let raised = interval.saturating_add(INTERVAL_STEP_MS);
                if raised > MAX_INTERVAL_MS {
                    self.status = Some(format!("Delay cannot go above {MAX_INTERVAL_MS} ms"));
                } else {
                    self.dispatch(Event::SetDelay(raised), now);
                }
            }
            Action::ScrollLog(delta) => {
                self.log_back = self
                    .log_back
                    .saturating_add_signed(delta)
                    .min(self.max_log_back());
            }
            Action::DelayDown => {
                let lowered = interval.saturating_sub(INTERVAL_STEP_MS);
                if lowered < MIN_INTERVAL_MS {
                    self.status = Some(format!("Delay cannot go below {MIN_INTERVAL_MS} ms"));
                } else {
                    self.dispatch(Event::SetDelay(lowered), now);
                }
            }
            Action::BeginDelayEdit => self.mode = Mode::DelayEdit(String::new()),
            Action::OpenPicker => {
                let current = &self.store.get_state().flow_name;
                let selected = self
                    .catalog
                    .entries()
                    .iter()
                    .position(|e| &e.name == current)
                    .unwrap_or(0);
                self.mode = Mode::Picker(Picker {
                    query: String::new(),
                    selected,
                });
            }
            _ => {}
        }
    }

    fn apply_picker(&mut self, mut picker: Picker, action: Action, now: Instant) {
        let hits = self.catalog.filter(&picker.query);
        match action {
            Action::Cancel => return,
            Action::Confirm => {
                match hits.get(picker.selected) {
                    Some(&index) => {
                        let name = self.catalog.entries()[index].name.clone();
                        self.select_flow(&name, now);
                    }
                    None => self.status = Some("No flow matches the filter".to_string()),
                }
                return;
            }
            Action::Type(c) => {
                picker.query.push(c);
                picker.selected = 0;
            }
            Action::Backspace => {
                picker.query.pop();
                picker.selected = 0;
            }
            Action::Down => {
                picker.selected = if picker.selected + 1 >= hits.len() {
                    0
                } else {
                    picker.selected + 1
                };
            }
            Action::Up => {
                picker.selected = if picker.selected == 0 {
                    hits.len().saturating_sub(1)
                } else {
                    picker.selected - 1
                };
            }
            _ => {}
        }
        self.mode = Mode::Picker(picker);
    }

    fn apply_delay_edit(&mut self, mut buffer: String, action: Action, now: Instant) {
        match action {
            Action::Cancel => {}
            Action::Confirm => match buffer.parse::<u64>() {
                Ok(ms) if ms >= MIN_INTERVAL_MS => self.dispatch(Event::SetDelay(ms), now),
                Ok(_) => {
                    self.status = Some(format!(
                        "Delay must be at least {MIN_INTERVAL_MS} ms, keeping {} ms",
                        self.store.get_state().playback.interval_ms
                    ));
                }
                Err(_) => self.status = Some("Delay must be a number".to_string()),
            },
            Action::Type(c) => {
                if buffer.len() < MAX_DELAY_DIGITS {
                    buffer.push(c);
                }
                self.mode = Mode::DelayEdit(buffer);
            }
            Action::Backspace => {
                buffer.pop();
                self.mode = Mode::DelayEdit(buffer);
            }
            _ => self.mode = Mode::DelayEdit(buffer),
        }
    }

    fn dispatch(&mut self, event: Event, now: Instant) {
        let before = self.log_len();
        self.store.dispatch(event);
        self.timer.sync(&self.store.get_state().playback, now);
        self.hold_log_position(before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::Selection;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    const TWO_STEPS: &str = r##"{
        "nodes": [
            {"id": "UE", "label": "UE", "color": "#1f77b4"},
            {"id": "P-CSCF", "label": "P-CSCF", "color": "#ff7f0e"}
        ],
        "steps": [
            {"source": "UE", "target": "P-CSCF", "label": "REGISTER", "color": "#ffffff"},
            {"source": "P-CSCF", "target": "UE", "label": "200 OK", "color": "#2ca02c"}
        ]
    }"##;

    const FIVE_STEPS: &str = r##"{
        "nodes": [
            {"id": "UE", "label": "UE", "color": "#1f77b4"},
            {"id": "gNB", "label": "gNB", "color": "#9467bd"}
        ],
        "steps": [
            {"source": "UE", "target": "gNB", "label": "RRC Setup Request", "color": "#ffffff"},
            {"source": "gNB", "target": "UE", "label": "RRC Setup", "color": "#ffffff"},
            {"source": "UE", "target": "gNB", "label": "RRC Setup Complete", "color": "#ffffff"},
            {"source": "gNB", "target": "UE", "label": "Security Mode Command", "color": "#ffffff"},
            {"source": "UE", "target": "gNB", "label": "Security Mode Complete", "color": "#ffffff"}
        ]
    }"##;

    fn fixture(dir: &Path) -> Catalog {
        fs::write(dir.join("rrc.json"), FIVE_STEPS).unwrap();
        fs::write(dir.join("sip.json"), TWO_STEPS).unwrap();
        fs::write(dir.join("broken.json"), "{").unwrap();
        fs::write(
            dir.join("catalog.toml"),
            r#"
[[flow]]
name = "Initial RRC Access"
path = "rrc.json"

[[flow]]
name = "SIP Registration"
path = "sip.json"

[[flow]]
name = "Broken"
path = "broken.json"
"#,
        )
        .unwrap();
        Catalog::load(&dir.join("catalog.toml")).unwrap()
    }

    fn app(dir: &Path) -> App {
        App::new(fixture(dir), "Initial RRC Access", 1000)
    }

    fn step(app: &App) -> usize {
        app.store.get_state().playback.current_step
    }

    fn playing(app: &App) -> bool {
        app.store.get_state().playback.playing
    }

    #[test]
    fn starts_on_the_requested_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let state = app.store.get_state();
        assert_eq!(state.flow_name, "Initial RRC Access");
        assert_eq!(state.flow().unwrap().steps.len(), 5);
        assert!(!app.timer.is_armed());
    }

    #[test]
    fn play_arms_timer_and_pause_disarms_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let now = Instant::now();

        app.apply(Action::TogglePlay, now);
        assert!(playing(&app));
        assert_eq!(app.timer.deadline(), Some(now + Duration::from_millis(1000)));

        app.apply(Action::TogglePlay, now);
        assert!(!playing(&app));
        assert!(!app.timer.is_armed());
    }

    #[test]
    fn ticks_run_to_the_end_then_stop_the_timer() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let mut now = Instant::now();
        app.apply(Action::TogglePlay, now);

        for expected in 1..5 {
            now += Duration::from_millis(1000);
            assert!(app.timer.is_due(now));
            app.on_tick(now);
            assert_eq!(step(&app), expected);
            assert!(app.timer.is_armed());
        }

        now += Duration::from_millis(1000);
        app.on_tick(now);
        assert_eq!(step(&app), 4);
        assert!(!playing(&app));
        assert!(!app.timer.is_armed());
    }

    #[test]
    fn picking_a_flow_mid_playback_resets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let now = Instant::now();
        app.apply(Action::TogglePlay, now);
        for _ in 0..3 {
            app.on_tick(now);
        }
        assert_eq!(step(&app), 3);

        app.apply(Action::OpenPicker, now);
        for c in "sip".chars() {
            app.apply(Action::Type(c), now);
        }
        app.apply(Action::Confirm, now);

        assert_eq!(app.mode, Mode::Normal);
        let state = app.store.get_state();
        assert_eq!(state.flow_name, "SIP Registration");
        assert_eq!(step(&app), 0);
        assert!(!playing(&app));
        assert!(!app.timer.is_armed());
    }

    #[test]
    fn picker_starts_on_current_flow_and_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let now = Instant::now();
        app.apply(Action::OpenPicker, now);
        assert_eq!(
            app.mode,
            Mode::Picker(Picker {
                query: String::new(),
                selected: 0
            })
        );

        app.apply(Action::Up, now);
        assert!(matches!(&app.mode, Mode::Picker(p) if p.selected == 2));
        app.apply(Action::Down, now);
        assert!(matches!(&app.mode, Mode::Picker(p) if p.selected == 0));

        app.apply(Action::Cancel, now);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.store.get_state().flow_name, "Initial RRC Access");
    }

    #[test]
    fn broken_flow_shows_error_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.select_flow("Broken", Instant::now());
        let state = app.store.get_state();
        assert_eq!(state.flow_name, "Broken");
        assert!(matches!(state.selection, Selection::Failed(_)));
    }

    #[test]
    fn delay_editor_commits_valid_values_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let now = Instant::now();

        app.apply(Action::BeginDelayEdit, now);
        for c in "250".chars() {
            app.apply(Action::Type(c), now);
        }
        app.apply(Action::Confirm, now);
        assert_eq!(app.store.get_state().playback.interval_ms, 250);
        assert_eq!(app.mode, Mode::Normal);

        app.apply(Action::BeginDelayEdit, now);
        app.apply(Action::Type('5'), now);
        app.apply(Action::Type('0'), now);
        app.apply(Action::Confirm, now);
        assert_eq!(app.store.get_state().playback.interval_ms, 250);
        assert!(app.status.is_some());

        app.apply(Action::BeginDelayEdit, now);
        app.apply(Action::Confirm, now);
        assert_eq!(app.store.get_state().playback.interval_ms, 250);
    }

    #[test]
    fn delay_nudges_stop_at_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(fixture(dir.path()), "SIP Registration", 200);
        let now = Instant::now();
        app.apply(Action::DelayDown, now);
        assert_eq!(app.store.get_state().playback.interval_ms, 100);
        app.apply(Action::DelayDown, now);
        assert_eq!(app.store.get_state().playback.interval_ms, 100);
        app.apply(Action::DelayUp, now);
        assert_eq!(app.store.get_state().playback.interval_ms, 200);
    }

    #[test]
    fn delay_nudge_at_maximum_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(fixture(dir.path()), "SIP Registration", MAX_INTERVAL_MS);
        let now = Instant::now();
        app.apply(Action::DelayUp, now);
        assert_eq!(app.store.get_state().playback.interval_ms, MAX_INTERVAL_MS);
        assert!(app.status.is_some());

        app.apply(Action::TogglePlay, now);
        assert_eq!(
            app.timer.deadline(),
            Some(now + std::time::Duration::from_millis(MAX_INTERVAL_MS))
        );
    }

    fn shipped(flow: &str) -> App {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("flows/catalog.toml");
        App::new(Catalog::load(&path).unwrap(), flow, 1000)
    }

    #[test]
    fn log_scroll_is_bounded_by_revealed_lines() {
        let mut app = shipped("5G Registration");
        let now = Instant::now();
        app.apply(Action::ScrollLog(5), now);
        assert_eq!(app.log_back, 0);

        app.apply(Action::LastStep, now);
        app.apply(Action::ScrollLog(5), now);
        assert_eq!(app.log_back, 5);
        app.apply(Action::ScrollLog(50), now);
        assert_eq!(app.log_back, 17 - LOG_ROWS);
        app.apply(Action::ScrollLog(-3), now);
        assert_eq!(app.log_back, 17 - LOG_ROWS - 3);
        app.apply(Action::ScrollLog(-50), now);
        assert_eq!(app.log_back, 0);
    }

    #[test]
    fn scrolled_log_holds_position_while_steps_are_added() {
        let mut app = shipped("5G Registration");
        let now = Instant::now();
        app.apply(Action::StepForward, now);
        for _ in 0..9 {
            app.apply(Action::StepForward, now);
        }
        assert_eq!(step(&app), 10);
        app.apply(Action::ScrollLog(2), now);
        assert_eq!(app.log_back, 2);

        app.apply(Action::StepForward, now);
        assert_eq!(app.log_back, 3);

        app.apply(Action::FirstStep, now);
        assert_eq!(app.log_back, 0);
    }

    #[test]
    fn new_flow_follows_newest_log_line() {
        let mut app = shipped("5G Registration");
        let now = Instant::now();
        app.apply(Action::LastStep, now);
        app.apply(Action::ScrollLog(4), now);
        app.select_flow("SIP Call", now);
        assert_eq!(app.log_back, 0);
    }

    #[test]
    fn last_and_first_step_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let now = Instant::now();
        app.apply(Action::LastStep, now);
        assert_eq!(step(&app), 4);
        app.apply(Action::StepBack, now);
        assert_eq!(step(&app), 3);
        app.apply(Action::FirstStep, now);
        assert_eq!(step(&app), 0);
    }

    #[test]
    fn quit_from_any_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.apply(Action::OpenPicker, Instant::now());
        app.apply(Action::Quit, Instant::now());
        assert!(app.should_quit);
    }
}
