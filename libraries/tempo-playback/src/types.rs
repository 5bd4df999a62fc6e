//! Core types for queue and transport management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::error::{FailureReason, PlaybackError, Result};

/// Track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Track as handed to the queue by a catalog or library source
///
/// Immutable once created. Equality and hashing use `id` only, so the same
/// recording fetched twice with different metadata is still the same track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier from the data source
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Track duration as advertised by the data source
    pub duration: Duration,

    /// Playable location; tracks without one fail to load
    pub url: Option<String>,
}

impl Track {
    /// Create a track with just an id and a playable URL
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(id),
            title: String::new(),
            artist: String::new(),
            album: None,
            duration: Duration::ZERO,
            url: Some(url.into()),
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the artist
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the album
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the advertised duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Drop the playable URL
    #[must_use]
    pub fn without_url(mut self) -> Self {
        self.url = None;
        self
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Discrete transport phase
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", content = "reason", rename_all = "lowercase")]
pub enum Phase {
    /// Nothing loaded, or playback explicitly stopped
    #[default]
    Stopped,

    /// Audio is playing
    Playing,

    /// Loaded and paused
    Paused,

    /// Waiting for the device to report the loaded track ready
    Buffering,

    /// The device failed the current track
    Error(FailureReason),
}

impl Phase {
    /// Whether the phase is `Error(_)`
    pub fn is_error(&self) -> bool {
        matches!(self, Phase::Error(_))
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop current track only
    Single,

    /// Loop entire queue
    All,
}

impl RepeatMode {
    /// Next mode in the off → all → single cycle used by the repeat button
    #[must_use]
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::Single,
            RepeatMode::Single => RepeatMode::Off,
        }
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// Canonical order
    #[default]
    Off,

    /// Randomised order with the original kept for restoring
    On,
}

impl ShuffleMode {
    /// The other mode
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            ShuffleMode::Off => ShuffleMode::On,
            ShuffleMode::On => ShuffleMode::Off,
        }
    }
}

/// Configuration for the queue and transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 50)
    pub history_size: usize,

    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle mode (default: Off)
    pub shuffle: ShuffleMode,

    /// Give up on a load that has not become ready after this many
    /// milliseconds (default: wait forever)
    pub buffering_timeout_ms: Option<u64>,

    /// Capacity of the event broadcast channel (default: 256)
    pub event_capacity: usize,

    /// Seed for the shuffle RNG; random when unset (0..=i64::MAX)
    pub shuffle_seed: Option<u64>,
}

impl PlaybackConfig {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(PlaybackError::InvalidConfig(
                "history_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::InvalidConfig(format!(
                "volume must be within 0.0..=1.0, got {}",
                self.volume
            )));
        }
        if self.event_capacity == 0 {
            return Err(PlaybackError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        // Config files store integers as i64
        if let Some(seed) = self.shuffle_seed.filter(|&seed| i64::try_from(seed).is_err()) {
            return Err(PlaybackError::InvalidConfig(format!(
                "shuffle_seed must be at most {}, got {}",
                i64::MAX,
                seed
            )));
        }
        Ok(())
    }

    /// Buffering timeout as a `Duration`
    pub fn buffering_timeout(&self) -> Option<Duration> {
        self.buffering_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            volume: 1.0,
            repeat: RepeatMode::Off,
            shuffle: ShuffleMode::Off,
            buffering_timeout_ms: None,
            event_capacity: 256,
            shuffle_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.history_size, 50);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.shuffle, ShuffleMode::Off);
        assert_eq!(config.repeat, RepeatMode::Off);
        assert!(config.buffering_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = PlaybackConfig {
            history_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));

        let config = PlaybackConfig {
            volume: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shuffle_seed_limited_to_i64() {
        let config = PlaybackConfig {
            shuffle_seed: Some(i64::MAX as u64),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = PlaybackConfig {
            shuffle_seed: Some(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn track_equality_uses_id_only() {
        let a = Track::new("1", "file:///a.mp3").with_title("Old title");
        let b = Track::new("1", "file:///other.mp3").with_title("New title");
        let c = Track::new("2", "file:///a.mp3");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn repeat_cycle() {
        assert_eq!(RepeatMode::Off.cycled(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycled(), RepeatMode::Single);
        assert_eq!(RepeatMode::Single.cycled(), RepeatMode::Off);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"history_size": 10, "repeat": "all"}"#).unwrap();
        assert_eq!(config.history_size, 10);
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.event_capacity, 256);
    }
}
