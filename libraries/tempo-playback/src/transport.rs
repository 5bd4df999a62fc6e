//! Transport state machine - core orchestration
//!
//! Coordinates the queue, the audio device and the event bus:
//!
//! ```text
//!            load              ready(play requested)
//! Stopped ─────────► Buffering ───────────────────► Playing
//!    ▲                   │ ready                      │ ▲
//!    │ stop              ▼                     pause  ▼ │ play
//!    └──────────────── Paused ◄───────────────────────┘
//!
//! Buffering / Playing / Paused ── failed ──► Error(reason) ── load ──► Buffering
//! ```
//!
//! Every load bumps the [`Generation`]; device events from older loads are
//! dropped so a fast skip-skip-skip cannot apply a stale `Ready`.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::{
    device::{AudioTransport, DeviceEvent, Generation, LoadRequest},
    error::{FailureReason, PlaybackError, Result},
    events::{EventBus, TransportEvent},
    queue::Queue,
    types::{Phase, PlaybackConfig, RepeatMode, ShuffleMode, Track},
    volume::Volume,
};

/// Transport state machine
///
/// Single-writer: every method takes `&mut self`. Hosts that need to share it
/// across threads use [`crate::PlayerService`].
pub struct Transport {
    // State
    phase: Phase,
    loaded: Option<Track>,
    position: Duration,
    duration: Duration,

    // Queue
    queue: Queue,

    // Settings
    volume: Volume,
    buffering_timeout: Option<Duration>,

    // Load tracking
    generation: Generation,
    play_requested: bool,
    load_started: Option<Instant>,

    device: Box<dyn AudioTransport>,
    events: EventBus,
}

impl Transport {
    /// Create a stopped transport with an empty queue
    ///
    /// The configured volume is sent to the device straight away.
    pub fn new(config: PlaybackConfig, mut device: Box<dyn AudioTransport>) -> Result<Self> {
        config.validate()?;

        let volume = Volume::new(config.volume);
        device.set_volume(volume.gain());

        Ok(Self {
            phase: Phase::Stopped,
            loaded: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            queue: Queue::with_config(&config),
            volume,
            buffering_timeout: config.buffering_timeout(),
            generation: Generation::default(),
            play_requested: false,
            load_started: None,
            device,
            events: EventBus::new(config.event_capacity),
        })
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// With nothing loaded, loads the queue's current track and plays it once
    /// ready. While buffering, records the intent. From `Error`, retries the
    /// queue's current track.
    pub fn play(&mut self) {
        if self.loaded.is_none() {
            if self.queue.is_empty() {
                debug!("play with empty queue, ignoring");
                return;
            }
            self.load_current(true);
            return;
        }

        match self.phase {
            Phase::Playing => {}
            Phase::Paused => {
                self.device.play();
                self.set_phase(Phase::Playing);
            }
            Phase::Buffering => {
                self.play_requested = true;
            }
            Phase::Error(_) => {
                debug!("play after failure, reloading current track");
                self.load_current(true);
            }
            Phase::Stopped => {
                // Finished at the end of the queue; replay the last track
                self.device.seek(Duration::ZERO);
                self.set_position(Duration::ZERO);
                self.device.play();
                self.set_phase(Phase::Playing);
            }
        }
    }

    /// Pause playback
    ///
    /// No-op if stopped, paused or failed. While buffering, cancels the play
    /// intent so the track settles in `Paused` once ready.
    pub fn pause(&mut self) {
        match self.phase {
            Phase::Playing => {
                self.device.pause();
                self.set_phase(Phase::Paused);
            }
            Phase::Buffering => {
                self.play_requested = false;
            }
            Phase::Stopped | Phase::Paused | Phase::Error(_) => {}
        }
    }

    /// Stop playback and unload the track
    ///
    /// The queue keeps its position.
    pub fn stop(&mut self) {
        self.device.stop();
        self.device.seek(Duration::ZERO);

        self.generation = self.generation.next();
        self.loaded = None;
        self.play_requested = false;
        self.load_started = None;
        self.duration = Duration::ZERO;
        self.set_position(Duration::ZERO);
        self.set_phase(Phase::Stopped);
    }

    pub fn toggle_play_pause(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Skip to the next track
    ///
    /// Keeps playing if playback was active. Returns `false` when there is
    /// no next track (end of a non-repeating queue, or repeat single).
    pub fn skip_next(&mut self) -> bool {
        let auto_play = self.is_playing();
        self.advance_and_load(auto_play)
    }

    /// Skip to the previous track
    ///
    /// Returns `false` when there is nowhere to go back to.
    pub fn skip_previous(&mut self) -> bool {
        let auto_play = self.is_playing();
        match self.queue.retreat() {
            Some(_) => {
                self.load_current(auto_play);
                true
            }
            None => {
                debug!("no previous track");
                false
            }
        }
    }

    fn advance_and_load(&mut self, auto_play: bool) -> bool {
        if self.queue.repeat_mode() == RepeatMode::Single {
            debug!("repeat single, skip ignored");
            return false;
        }

        match self.queue.advance() {
            Some(_) => {
                self.load_current(auto_play);
                true
            }
            None => {
                debug!("no next track");
                false
            }
        }
    }

    // ===== Seek =====

    /// Seek within the loaded track, clamping to `[0, duration]`
    pub fn seek(&mut self, position: Duration) {
        if self.loaded.is_none() {
            debug!("seek with nothing loaded, ignoring");
            return;
        }

        let position = position.min(self.duration);
        self.device.seek(position);
        self.set_position(position);
    }

    /// Seek to a fraction of the track (0.0-1.0)
    pub fn seek_to_percent(&mut self, percent: f32) {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 1.0)
        };
        self.seek(self.duration.mul_f32(percent));
    }

    // ===== Volume =====

    /// Set volume, clamped into 0.0-1.0
    pub fn set_volume(&mut self, volume: f32) {
        self.volume.set_level(volume);
        self.apply_volume();
    }

    pub fn mute(&mut self) {
        self.volume.mute();
        self.apply_volume();
    }

    pub fn unmute(&mut self) {
        self.volume.unmute();
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        self.device.set_volume(self.volume.gain());
        self.events.emit(TransportEvent::VolumeChanged {
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }

    // ===== Queue Management =====

    /// Play `track` now, queueing it at the front if it is not queued
    pub fn play_track(&mut self, track: Track) {
        let len = self.queue.len();
        self.queue.play_track(track);
        if self.queue.len() != len {
            self.emit_queue_changed();
        }
        self.load_current(true);
    }

    /// Play the queued track at `index`
    ///
    /// Out-of-range indices are ignored and return `false`.
    pub fn play_at(&mut self, index: usize) -> bool {
        if !self.queue.play_at(index) {
            return false;
        }
        self.load_current(true);
        true
    }

    /// Replace the queue and start playing at `start_index`
    pub fn replace_and_play(&mut self, tracks: Vec<Track>, start_index: usize) {
        let current = self.queue.replace_and_play(tracks, start_index).cloned();
        info!(
            length = self.queue.len(),
            start = ?current.as_ref().map(|t| &t.id),
            "queue replaced"
        );
        self.emit_queue_changed();

        if current.is_some() {
            self.load_current(true);
        } else {
            self.stop();
        }
    }

    pub fn append(&mut self, track: Track) {
        self.queue.append(track);
        self.emit_queue_changed();
    }

    pub fn append_all(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.queue.append_all(tracks);
        self.emit_queue_changed();
    }

    pub fn insert_next(&mut self, track: Track) {
        self.queue.insert_next(track);
        self.emit_queue_changed();
    }

    /// Remove the queued track at `index`
    ///
    /// Removing the loaded track loads the new current one, or stops when
    /// the queue became empty.
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        let was_current = self.queue.current_index() == Some(index);
        let removed = self.queue.remove_at(index)?;
        self.emit_queue_changed();

        if was_current && self.loaded.is_some() {
            if self.queue.is_empty() {
                self.stop();
            } else {
                let auto_play = self.is_playing();
                self.load_current(auto_play);
            }
        }

        Ok(removed)
    }

    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_track(from, to)?;
        self.emit_queue_changed();
        Ok(())
    }

    /// Empty the queue and stop
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed();
        self.stop();
    }

    // ===== Shuffle & Repeat =====

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.queue.set_repeat_mode(mode);
        self.emit_modes_changed();
    }

    /// Advance the repeat button: off → all → single → off
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.queue.repeat_mode().cycled();
        self.set_repeat_mode(mode);
        mode
    }

    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        self.queue.set_shuffle_mode(mode);
        self.emit_modes_changed();
    }

    pub fn toggle_shuffle(&mut self) -> ShuffleMode {
        let mode = self.queue.shuffle_mode().toggled();
        self.set_shuffle_mode(mode);
        mode
    }

    // ===== Device Events =====

    /// Apply a callback from the device
    ///
    /// Events tagged with an older generation are dropped.
    pub fn handle_device_event(&mut self, generation: Generation, event: DeviceEvent) {
        if generation != self.generation {
            if matches!(event, DeviceEvent::TimeTick { .. }) {
                trace!(%generation, current = %self.generation, "stale tick dropped");
            } else {
                warn!(%generation, current = %self.generation, ?event, "stale device event dropped");
            }
            return;
        }

        match event {
            DeviceEvent::Ready { duration } => self.on_ready(duration),
            DeviceEvent::Failed { reason } => self.on_failed(reason),
            DeviceEvent::TimeTick { position } => self.on_time_tick(position),
            DeviceEvent::Finished => self.on_finished(),
        }
    }

    fn on_ready(&mut self, duration: Duration) {
        if self.phase != Phase::Buffering {
            debug!(phase = ?self.phase, "ready outside buffering, ignoring");
            return;
        }

        self.load_started = None;
        self.duration = duration;
        self.set_position(Duration::ZERO);

        if self.play_requested {
            self.device.play();
            self.set_phase(Phase::Playing);
        } else {
            self.set_phase(Phase::Paused);
        }
    }

    fn on_failed(&mut self, reason: FailureReason) {
        if self.loaded.is_none() {
            return;
        }

        warn!(
            track_id = ?self.loaded.as_ref().map(|t| &t.id),
            %reason,
            "device failed"
        );
        self.load_started = None;
        self.play_requested = false;
        self.set_phase(Phase::Error(reason));
    }

    fn on_time_tick(&mut self, position: Duration) {
        trace!(?position, "tick");
        self.set_position(position);
    }

    /// Completion policy
    fn on_finished(&mut self) {
        if self.loaded.is_none() {
            return;
        }

        if self.queue.repeat_mode() == RepeatMode::Single {
            debug!("repeat single, restarting track");
            self.device.seek(Duration::ZERO);
            self.set_position(Duration::ZERO);
            self.device.play();
            self.set_phase(Phase::Playing);
            return;
        }

        if !self.advance_and_load(true) {
            info!("queue exhausted");
            self.play_requested = false;
            self.set_position(self.duration);
            self.set_phase(Phase::Stopped);
        }
    }

    /// Fail a load that has been buffering longer than the configured timeout
    ///
    /// Returns `true` if the load timed out. Without a configured timeout this
    /// never fires.
    pub fn poll_timeout(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.buffering_deadline() else {
            return false;
        };
        if now < deadline {
            return false;
        }

        warn!(
            track_id = ?self.loaded.as_ref().map(|t| &t.id),
            "buffering timed out"
        );
        self.device.stop();
        self.generation = self.generation.next();
        self.load_started = None;
        self.play_requested = false;
        self.set_phase(Phase::Error(FailureReason::Timeout));
        true
    }

    /// When the pending load times out, if a timeout applies
    pub fn buffering_deadline(&self) -> Option<Instant> {
        if self.phase != Phase::Buffering {
            return None;
        }
        let timeout = self.buffering_timeout?;
        self.load_started.map(|started| started + timeout)
    }

    // ===== Internals =====

    /// Load the queue's current track into the device
    fn load_current(&mut self, auto_play: bool) {
        let Some(track) = self.queue.current().cloned() else {
            self.stop();
            return;
        };

        let previous_track_id = self.loaded.as_ref().map(|t| t.id.clone());
        self.generation = self.generation.next();
        self.play_requested = auto_play;
        self.duration = Duration::ZERO;
        self.set_position(Duration::ZERO);
        self.loaded = Some(track.clone());

        if previous_track_id.as_ref() != Some(&track.id) {
            self.events.emit(TransportEvent::TrackChanged {
                track_id: track.id.clone(),
                previous_track_id,
            });
        }

        let Some(url) = track.url else {
            warn!(track_id = %track.id, "track has no URL");
            self.load_started = None;
            self.play_requested = false;
            self.set_phase(Phase::Error(FailureReason::InvalidUrl));
            return;
        };

        info!(track_id = %track.id, generation = %self.generation, auto_play, "loading track");
        self.load_started = Some(Instant::now());
        self.device.load(LoadRequest {
            generation: self.generation,
            track_id: track.id,
            url,
        });
        self.set_phase(Phase::Buffering);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        debug!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase.clone();
        self.events.emit(TransportEvent::PhaseChanged { phase });
    }

    fn set_position(&mut self, position: Duration) {
        self.position = position;
        self.events.emit(TransportEvent::PositionChanged {
            position,
            duration: self.duration,
        });
    }

    fn emit_queue_changed(&self) {
        self.events.emit(TransportEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_modes_changed(&self) {
        self.events.emit(TransportEvent::ModesChanged {
            repeat: self.queue.repeat_mode(),
            shuffle: self.queue.shuffle_mode(),
        });
    }

    // ===== State Queries =====

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Playing, or buffering with playback requested
    pub fn is_playing(&self) -> bool {
        match self.phase {
            Phase::Playing => true,
            Phase::Buffering => self.play_requested,
            _ => false,
        }
    }

    /// Loaded track, or why there is no playable one
    pub fn require_loaded(&self) -> Result<&Track> {
        match (&self.phase, &self.loaded) {
            (Phase::Error(reason), _) => Err(PlaybackError::DeviceLoadFailure(reason.clone())),
            (_, Some(track)) => Ok(track),
            (_, None) => Err(PlaybackError::NoTrackLoaded),
        }
    }

    /// Track loaded into the device, `None` after `stop`
    pub fn current_track(&self) -> Option<&Track> {
        self.loaded.as_ref()
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    /// Duration reported by the device; zero until ready
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.queue.repeat_mode()
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.queue.shuffle_mode()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn has_next(&self) -> bool {
        self.queue.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.queue.has_previous()
    }

    /// Generation of the current load; device events must carry it
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("phase", &self.phase)
            .field("loaded", &self.loaded.as_ref().map(|t| &t.id))
            .field("position", &self.position)
            .field("duration", &self.duration)
            .field("generation", &self.generation)
            .field("queue_len", &self.queue.len())
            .finish_non_exhaustive()
    }
}
