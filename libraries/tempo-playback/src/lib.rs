//! Tempo - Queue and Transport Engine
//!
//! Platform-agnostic sequencing for sequential audio playback.
//!
//! This crate provides:
//! - Queue model (ordered tracks, current index, shuffle snapshot)
//! - Playback history (bounded, for "previous")
//! - Shuffle (current track pinned to the front, seedable)
//! - Repeat modes (Off, Single, All)
//! - Transport state machine (stopped/buffering/paused/playing/error)
//! - Stale device callback suppression via load generations
//! - Event broadcasting for UI synchronization
//! - A threaded player service serializing intents and callbacks
//!
//! # Architecture
//!
//! `tempo-playback` never touches audio hardware. The host supplies an
//! [`AudioTransport`] that decodes and outputs audio, and feeds the device's
//! callbacks back in as [`DeviceEvent`]s.
//!
//! # Example: Driving the state machine
//!
//! ```rust
//! use tempo_playback::{DeviceEvent, NullTransport, Phase, PlaybackConfig, Track, Transport};
//! use std::time::Duration;
//!
//! let mut transport = Transport::new(PlaybackConfig::default(), Box::new(NullTransport))?;
//!
//! transport.replace_and_play(
//!     vec![
//!         Track::new("1", "https://example.com/1.mp3").with_title("Intro"),
//!         Track::new("2", "https://example.com/2.mp3").with_title("Outro"),
//!     ],
//!     0,
//! );
//! assert_eq!(transport.phase(), &Phase::Buffering);
//!
//! // The device reports back for the load it was given
//! let generation = transport.generation();
//! transport.handle_device_event(generation, DeviceEvent::Ready { duration: Duration::from_secs(90) });
//! assert_eq!(transport.phase(), &Phase::Playing);
//! # Ok::<(), tempo_playback::PlaybackError>(())
//! ```
//!
//! # Example: Player service
//!
//! ```rust,no_run
//! use tempo_playback::{NullTransport, PlaybackConfig, PlayerService, RepeatMode};
//!
//! let service = PlayerService::spawn(PlaybackConfig::default(), |_notifier| NullTransport)?;
//! let handle = service.handle();
//!
//! handle.set_repeat_mode(RepeatMode::All)?;
//! handle.play()?;
//! let snapshot = handle.snapshot()?;
//! println!("{:?}", snapshot.phase);
//! # Ok::<(), tempo_playback::PlaybackError>(())
//! ```

mod device;
mod error;
mod events;
mod history;
mod queue;
mod service;
mod session;
mod shuffle;
mod snapshot;
mod transport;
pub mod types;
mod volume;

// Public exports
pub use device::{AudioTransport, DeviceEvent, Generation, LoadRequest, NullTransport};
pub use error::{FailureReason, PlaybackError, Result};
pub use events::{EventBus, TransportEvent};
pub use history::History;
pub use queue::Queue;
pub use service::{DeviceNotifier, PlayerCommand, PlayerHandle, PlayerService};
pub use session::RemoteCommand;
pub use snapshot::TransportSnapshot;
pub use transport::Transport;
pub use types::{Phase, PlaybackConfig, RepeatMode, ShuffleMode, Track, TrackId};
pub use volume::Volume;
