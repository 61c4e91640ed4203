//! Playback state machine.
//!
//! One state cell (`AppState`) holds the selected flow and the playback
//! position. It only changes through [`Store::dispatch`], which runs the pure
//! [`reduce`] function. Everything drawn on screen is derived from the state
//! afterwards (see `view`).

use crate::loader::LoadError;
use crate::model::Flow;

pub const MIN_INTERVAL_MS: u64 = 100;
/// Largest delay the seven-digit editor can express.
pub const MAX_INTERVAL_MS: u64 = 9_999_999;
pub const INTERVAL_STEP_MS: u64 = 100;
pub const DEFAULT_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_step: usize,
    pub playing: bool,
    pub interval_ms: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_step: 0,
            playing: false,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Loaded(Flow),
    /// The selected flow could not be loaded; holds the rendered error.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub flow_name: String,
    pub selection: Selection,
    pub playback: PlaybackState,
}

impl AppState {
    pub fn flow(&self) -> Option<&Flow> {
        match &self.selection {
            Selection::Loaded(flow) => Some(flow),
            _ => None,
        }
    }

    fn clamp_step(&self, step: usize) -> usize {
        self.flow().map_or(0, |flow| flow.clamp_step(step))
    }
}

#[derive(Debug)]
pub enum Event {
    /// A flow was picked; `outcome` is the result of loading it.
    SelectFlow {
        name: String,
        outcome: Result<Flow, LoadError>,
    },
    /// Jump to a step (progress control drag).
    Scrub(usize),
    /// Move relative to the current step.
    StepBy(isize),
    TogglePlay,
    Tick,
    SetDelay(u64),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SelectFlow { .. } => "select_flow",
            Event::Scrub(_) => "scrub",
            Event::StepBy(_) => "step_by",
            Event::TogglePlay => "toggle_play",
            Event::Tick => "tick",
            Event::SetDelay(_) => "set_delay",
        }
    }
}

pub fn reduce(mut state: AppState, event: Event) -> AppState {
    match event {
        Event::SelectFlow { name, outcome } => {
            state.selection = match outcome {
                Ok(flow) => Selection::Loaded(flow),
                Err(err) => Selection::Failed(err.to_string()),
            };
            state.flow_name = name;
            state.playback.current_step = 0;
            state.playback.playing = false;
        }
        Event::Scrub(step) => {
            state.playback.current_step = state.clamp_step(step);
        }
        Event::StepBy(delta) => {
            let step = state.playback.current_step.saturating_add_signed(delta);
            state.playback.current_step = state.clamp_step(step);
        }
        Event::TogglePlay => {
            if state.playback.playing {
                state.playback.playing = false;
            } else if state.flow().is_some() {
                state.playback.playing = true;
                state.playback.current_step = 0;
            }
        }
        Event::Tick => {
            if state.playback.playing {
                let len = state.flow().map_or(0, |flow| flow.steps.len());
                if state.playback.current_step + 1 < len {
                    state.playback.current_step += 1;
                } else {
                    state.playback.playing = false;
                }
            }
        }
        Event::SetDelay(ms) => {
            if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&ms) {
                state.playback.interval_ms = ms;
            } else {
                tracing::warn!(
                    requested = ms,
                    kept = state.playback.interval_ms,
                    "delay out of range rejected"
                );
            }
        }
    }
    state.playback.current_step = state.clamp_step(state.playback.current_step);
    state
}

#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
}

impl Store {
    pub fn new(interval_ms: u64) -> Self {
        let mut store = Self::default();
        store.dispatch(Event::SetDelay(interval_ms));
        store
    }

    pub fn get_state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, event: Event) -> &AppState {
        let kind = event.kind();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
        tracing::debug!(
            event = kind,
            flow = %self.state.flow_name,
            step = self.state.playback.current_step,
            playing = self.state.playback.playing,
            interval_ms = self.state.playback.interval_ms,
            "state updated"
        );
        &self.state
    }
}
