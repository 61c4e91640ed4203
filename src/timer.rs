use std::time::{Duration, Instant};

use crate::playback::PlaybackState;

/// Auto-play tick source. Armed only while playing.
#[derive(Debug, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Brings the timer in line with the play state after an event. An
    /// already armed timer keeps its pending deadline.
    pub fn sync(&mut self, playback: &PlaybackState, now: Instant) {
        match (playback.playing, self.deadline) {
            (false, Some(_)) => {
                self.deadline = None;
                tracing::debug!("timer disarmed");
            }
            (true, None) => self.arm(playback, now),
            _ => {}
        }
    }

    /// Call after a tick was dispatched; schedules the next one with the
    /// current interval.
    pub fn rearm(&mut self, playback: &PlaybackState, now: Instant) {
        self.deadline = None;
        self.sync(playback, now);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    fn arm(&mut self, playback: &PlaybackState, now: Instant) {
        let interval = Duration::from_millis(playback.interval_ms);
        self.deadline = Some(now + interval);
        tracing::debug!(interval_ms = playback.interval_ms, "timer armed");
    }
}
