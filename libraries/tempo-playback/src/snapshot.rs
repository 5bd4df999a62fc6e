//! Point-in-time view of the transport for presentation code

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::transport::Transport;
use crate::types::{Phase, RepeatMode, ShuffleMode, Track};

/// Everything a now-playing screen needs, detached from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    pub phase: Phase,
    pub current_track: Option<Track>,
    pub position: Duration,
    pub duration: Duration,
    pub volume: f32,
    pub muted: bool,
    pub repeat: RepeatMode,
    pub shuffle: ShuffleMode,
    pub queue_length: usize,
    pub current_index: Option<usize>,
    pub upcoming: Vec<Track>,
    pub has_next: bool,
    pub has_previous: bool,
}

impl TransportSnapshot {
    /// Fraction of the track played (0.0-1.0), zero while duration is unknown
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Time left in the track
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.position)
    }
}

impl Transport {
    pub fn snapshot(&self) -> TransportSnapshot {
        let queue = self.queue();
        TransportSnapshot {
            phase: self.phase().clone(),
            current_track: self.current_track().cloned(),
            position: self.position(),
            duration: self.duration(),
            volume: self.volume(),
            muted: self.is_muted(),
            repeat: queue.repeat_mode(),
            shuffle: queue.shuffle_mode(),
            queue_length: queue.len(),
            current_index: queue.current_index(),
            upcoming: queue.upcoming().to_vec(),
            has_next: queue.has_next(),
            has_previous: queue.has_previous(),
        }
    }
}
