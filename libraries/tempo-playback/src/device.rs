//! Platform-agnostic audio transport trait
//!
//! Abstracts the device that actually decodes and outputs audio. The engine
//! only issues commands; the device answers asynchronously with
//! [`DeviceEvent`]s tagged with the [`Generation`] of the load they belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::FailureReason;
use crate::types::TrackId;

/// Load token
///
/// Bumped on every load and on stop. Device events carrying an older
/// generation are stale and get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The following generation
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a device needs to start loading a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Must be echoed back on every event for this load
    pub generation: Generation,
    pub track_id: TrackId,
    pub url: String,
}

/// Status callbacks from the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// Track is buffered and can play
    Ready {
        /// Duration reported by the decoder
        duration: Duration,
    },

    /// Track could not be loaded or stopped mid-stream
    Failed { reason: FailureReason },

    /// Periodic position report
    TimeTick { position: Duration },

    /// Playback reached the end of the track
    Finished,
}

/// Audio output device
///
/// Commands are fire-and-forget; outcomes come back as [`DeviceEvent`]s.
/// Implementations must not call back into the engine synchronously from
/// inside a command.
pub trait AudioTransport: Send {
    /// Start loading a track, replacing whatever was loaded
    fn load(&mut self, request: LoadRequest);

    /// Start or resume output of the loaded track
    fn play(&mut self);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Move to `position` in the loaded track
    fn seek(&mut self, position: Duration);

    /// Set output gain (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Stop output
    fn stop(&mut self);
}

impl<T: AudioTransport + ?Sized> AudioTransport for Box<T> {
    fn load(&mut self, request: LoadRequest) {
        (**self).load(request);
    }

    fn play(&mut self) {
        (**self).play();
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek(&mut self, position: Duration) {
        (**self).seek(position);
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}

/// Device that accepts every command and never reports back
///
/// Useful for driving the state machine by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl AudioTransport for NullTransport {
    fn load(&mut self, _request: LoadRequest) {}
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _position: Duration) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_increments() {
        let gen = Generation::default();
        assert_eq!(gen.value(), 0);
        assert_eq!(gen.next().value(), 1);
        assert!(gen.next() > gen);
        assert_eq!(Generation::new(u64::MAX).next().value(), 0);
    }

    #[test]
    fn generation_display() {
        assert_eq!(Generation::new(7).to_string(), "#7");
    }

    #[test]
    fn boxed_transport_forwards() {
        let mut device: Box<dyn AudioTransport> = Box::new(NullTransport);
        device.play();
        device.seek(Duration::from_secs(1));
        device.stop();
    }
}
