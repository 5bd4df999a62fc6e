//! Transport Events
//!
//! Broadcast notifications for UI synchronization. Events are emitted after
//! each state transition:
//! - Phase changes (play/pause/stop/buffering/error)
//! - Track changes (on load)
//! - Position updates (ticks, seeks)
//! - Volume, queue and mode changes

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::types::{Phase, RepeatMode, ShuffleMode, TrackId};

/// Events emitted by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportEvent {
    /// Transport phase changed
    PhaseChanged { phase: Phase },

    /// A different track was loaded
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Position or duration changed
    PositionChanged {
        position: Duration,
        duration: Duration,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// New volume level (0.0-1.0)
        volume: f32,
        muted: bool,
    },

    /// Queue contents changed
    QueueChanged { length: usize },

    /// Repeat or shuffle mode changed
    ModesChanged {
        repeat: RepeatMode,
        shuffle: ShuffleMode,
    },
}

/// Fan-out channel for [`TransportEvent`]s
///
/// Emitting with no subscribers is fine. A subscriber that falls more than
/// `capacity` events behind loses the oldest ones and sees
/// `RecvError::Lagged` once.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TransportEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: TransportEvent) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
