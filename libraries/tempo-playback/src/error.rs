//! Error types for queue and transport management

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the device could not play a track
///
/// Carried by `Phase::Error` rather than returned, so the UI can render it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Network connection error
    #[error("Network connection error")]
    Network,

    /// Audio session could not be configured
    #[error("Audio session configuration error")]
    AudioSession,

    /// Audio file not found
    #[error("Audio file not found")]
    FileNotFound,

    /// Track has no usable URL
    #[error("Invalid audio URL")]
    InvalidUrl,

    /// Device could not decode the stream
    #[error("Audio decoding error")]
    Decoding,

    /// Device never reported the track ready
    #[error("Timed out waiting for audio to buffer")]
    Timeout,

    /// Anything else the device reports
    #[error("{0}")]
    Unknown(String),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Direct index operation outside the queue
    #[error("Index {index} out of range for queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Queue is empty
    #[error("Queue is empty")]
    EmptyQueue,

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Device refused the track
    #[error("Failed to load track: {0}")]
    DeviceLoadFailure(FailureReason),

    /// The player service thread has exited
    #[error("Player service has stopped")]
    ServiceStopped,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The player thread could not be started
    #[error("Failed to spawn player thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_message() {
        let err = PlaybackError::IndexOutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "Index 5 out of range for queue of length 3");
    }

    #[test]
    fn failure_reason_display() {
        assert_eq!(FailureReason::InvalidUrl.to_string(), "Invalid audio URL");
        assert_eq!(
            FailureReason::Unknown("codec exploded".to_string()).to_string(),
            "codec exploded"
        );
        assert_eq!(
            PlaybackError::DeviceLoadFailure(FailureReason::Decoding).to_string(),
            "Failed to load track: Audio decoding error"
        );
    }
}
