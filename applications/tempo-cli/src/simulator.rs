//! Simulated audio device
//!
//! Stands in for a real decoder/output. Runs its own clock on a worker
//! thread and reports back through a [`DeviceNotifier`]:
//! - `load` answers `Ready` after the configured latency
//! - while playing, emits `TimeTick`s on an accelerated clock
//! - emits `Finished` at the end of the track
//! - URLs starting with `fail://` fail to load

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempo_playback::{
    AudioTransport, DeviceNotifier, FailureReason, Generation, LoadRequest, PlaybackError, Result,
};
use tracing::{debug, error, trace};

use crate::config::SimulatorSettings;

/// URL scheme that makes a load fail
pub const FAIL_SCHEME: &str = "fail://";

#[derive(Debug)]
enum SimCommand {
    Load(LoadRequest),
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f32),
    Stop,
    Shutdown,
}

/// Device commands are forwarded to the simulator thread
pub struct SimulatedDevice {
    commands: Sender<SimCommand>,
    thread: Option<JoinHandle<()>>,
}

impl SimulatedDevice {
    /// Start the simulator thread
    ///
    /// Fails with [`PlaybackError::ThreadSpawn`] when the thread cannot start.
    pub fn spawn(settings: SimulatorSettings, notifier: DeviceNotifier) -> Result<Self> {
        let (commands, command_rx) = unbounded();

        let thread = thread::Builder::new()
            .name("tempo-simulator".to_string())
            .spawn(move || {
                let mut sim = Simulation::new(settings, notifier);
                loop {
                    let command = match command_rx.recv_timeout(sim.settings.tick_interval()) {
                        Ok(SimCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                        Ok(command) => Some(command),
                        Err(RecvTimeoutError::Timeout) => None,
                    };
                    if let Some(command) = command {
                        sim.apply(command);
                    }
                    if sim.advance(Instant::now()).is_err() {
                        debug!("player gone, simulator exiting");
                        break;
                    }
                }
            })
            .map_err(PlaybackError::ThreadSpawn)?;

        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    fn send(&self, command: SimCommand) {
        // Only fails once the simulator thread is gone
        let _ = self.commands.send(command);
    }
}

impl AudioTransport for SimulatedDevice {
    fn load(&mut self, request: LoadRequest) {
        self.send(SimCommand::Load(request));
    }

    fn play(&mut self) {
        self.send(SimCommand::Play);
    }

    fn pause(&mut self) {
        self.send(SimCommand::Pause);
    }

    fn seek(&mut self, position: Duration) {
        self.send(SimCommand::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(SimCommand::SetVolume(volume));
    }

    fn stop(&mut self) {
        self.send(SimCommand::Stop);
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.send(SimCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("simulator thread panicked");
            }
        }
    }
}

/// A load waiting for its latency to elapse
struct Pending {
    request: LoadRequest,
    ready_at: Instant,
}

/// The loaded, ready track
struct Loaded {
    generation: Generation,
    position: Duration,
    playing: bool,
}

struct Simulation {
    settings: SimulatorSettings,
    notifier: DeviceNotifier,
    pending: Option<Pending>,
    loaded: Option<Loaded>,
    last_advance: Instant,
}

impl Simulation {
    fn new(settings: SimulatorSettings, notifier: DeviceNotifier) -> Self {
        Self {
            settings,
            notifier,
            pending: None,
            loaded: None,
            last_advance: Instant::now(),
        }
    }

    fn apply(&mut self, command: SimCommand) {
        trace!(?command, "simulator command");
        match command {
            SimCommand::Load(request) => {
                self.loaded = None;
                self.pending = Some(Pending {
                    request,
                    ready_at: Instant::now() + self.settings.load_latency(),
                });
            }
            SimCommand::Play => {
                if let Some(loaded) = self.loaded.as_mut() {
                    loaded.playing = true;
                }
            }
            SimCommand::Pause => {
                if let Some(loaded) = self.loaded.as_mut() {
                    loaded.playing = false;
                }
            }
            SimCommand::Seek(position) => {
                if let Some(loaded) = self.loaded.as_mut() {
                    loaded.position = position.min(self.settings.track_duration());
                }
            }
            SimCommand::SetVolume(volume) => {
                debug!(volume, "simulated output volume");
            }
            SimCommand::Stop => {
                self.pending = None;
                self.loaded = None;
            }
            SimCommand::Shutdown => {}
        }
    }

    /// Move the clock forward to `now`, reporting to the player
    fn advance(&mut self, now: Instant) -> Result<()> {
        let elapsed = now.saturating_duration_since(self.last_advance);
        self.last_advance = now;

        if self.pending.as_ref().is_some_and(|p| now >= p.ready_at) {
            if let Some(Pending { request, .. }) = self.pending.take() {
                if request.url.starts_with(FAIL_SCHEME) {
                    debug!(track_id = %request.track_id, "simulating load failure");
                    self.notifier
                        .failed(request.generation, FailureReason::FileNotFound)?;
                } else {
                    self.loaded = Some(Loaded {
                        generation: request.generation,
                        position: Duration::ZERO,
                        playing: false,
                    });
                    self.notifier
                        .ready(request.generation, self.settings.track_duration())?;
                }
            }
        }

        let duration = self.settings.track_duration();
        let Some(loaded) = self.loaded.as_mut().filter(|l| l.playing) else {
            return Ok(());
        };

        loaded.position = (loaded.position + elapsed.mul_f64(self.settings.speed)).min(duration);
        if loaded.position >= duration {
            loaded.playing = false;
            let generation = loaded.generation;
            self.notifier.finished(generation)?;
        } else {
            self.notifier.time_tick(loaded.generation, loaded.position)?;
        }

        Ok(())
    }
}
