//! Outputs derived from `(flow, playback)`. Recomputed from scratch on every
//! frame; nothing here is cached.

use crate::model::Flow;
use crate::playback::PlaybackState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<'a> {
    pub index: usize,
    pub source: &'a str,
    pub target: &'a str,
    /// `"[n] - <label>"`
    pub label: String,
    pub color: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub text: String,
    pub color: &'a str,
}

fn revealed_len(flow: &Flow, playback: &PlaybackState) -> usize {
    if flow.steps.is_empty() {
        0
    } else {
        flow.clamp_step(playback.current_step) + 1
    }
}

pub fn revealed_edges<'a>(flow: &'a Flow, playback: &PlaybackState) -> Vec<Edge<'a>> {
    flow.steps[..revealed_len(flow, playback)]
        .iter()
        .enumerate()
        .map(|(i, step)| Edge {
            index: i,
            source: &step.source,
            target: &step.target,
            label: format!("[{}] - {}", i + 1, step.label),
            color: &step.color,
        })
        .collect()
}

pub fn log_lines<'a>(flow: &'a Flow, playback: &PlaybackState) -> Vec<LogLine<'a>> {
    flow.steps[..revealed_len(flow, playback)]
        .iter()
        .enumerate()
        .map(|(i, step)| LogLine {
            text: format!(
                "[{}] {} ---> {} | '{}'",
                i + 1,
                step.source,
                step.target,
                step.label
            ),
            color: &step.color,
        })
        .collect()
}

/// Source node of the current step.
pub fn highlighted_node<'a>(flow: &'a Flow, playback: &PlaybackState) -> Option<&'a str> {
    flow.steps
        .get(flow.clamp_step(playback.current_step))
        .map(|step| step.source.as_str())
}

/// Label for the play/pause control: the action it will perform next.
pub fn control_label(playback: &PlaybackState) -> &'static str {
    if playback.playing {
        "Pause"
    } else {
        "Play"
    }
}

pub fn progress_marks(flow: &Flow) -> Vec<String> {
    (0..flow.steps.len())
        .map(|i| format!("Step {}", i + 1))
        .collect()
}
