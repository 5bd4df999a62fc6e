//! Player service - serialized execution context
//!
//! Moves a [`Transport`] onto its own thread. UI intents ([`PlayerHandle`])
//! and device callbacks ([`DeviceNotifier`]) share one command channel, so
//! they are applied strictly in arrival order by a single writer.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    device::{AudioTransport, DeviceEvent, Generation},
    error::{FailureReason, PlaybackError, Result},
    events::{EventBus, TransportEvent},
    session::RemoteCommand,
    snapshot::TransportSnapshot,
    transport::Transport,
    types::{PlaybackConfig, RepeatMode, ShuffleMode, Track},
};

/// Commands processed by the player thread
#[derive(Debug)]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    SkipNext,
    SkipPrevious,
    Seek(Duration),
    SetVolume(f32),
    Mute,
    Unmute,
    ToggleMute,

    PlayTrack(Track),
    PlayAt(usize),
    ReplaceAndPlay { tracks: Vec<Track>, start_index: usize },
    Append(Track),
    AppendAll(Vec<Track>),
    InsertNext(Track),
    RemoveAt(usize),
    MoveTrack { from: usize, to: usize },
    ClearQueue,

    SetRepeat(RepeatMode),
    SetShuffle(ShuffleMode),
    CycleRepeat,
    ToggleShuffle,

    Remote(RemoteCommand),
    RouteLost,
    InterruptionBegan,
    InterruptionEnded { should_resume: bool },

    /// Callback from the audio device
    Device {
        generation: Generation,
        event: DeviceEvent,
    },

    /// Reply with a snapshot of the current state
    Snapshot(Sender<TransportSnapshot>),

    /// Stop playback and exit the loop
    Shutdown,
}

/// Owner of the player thread
///
/// Dropping the service shuts the thread down and joins it.
pub struct PlayerService {
    handle: PlayerHandle,
    events: EventBus,
    thread: Option<JoinHandle<()>>,
}

impl PlayerService {
    /// Start the player thread
    ///
    /// `make_device` receives the notifier the device must use for its
    /// callbacks.
    pub fn spawn<D, F>(config: PlaybackConfig, make_device: F) -> Result<Self>
    where
        D: AudioTransport + 'static,
        F: FnOnce(DeviceNotifier) -> D,
    {
        Self::try_spawn(config, |notifier| Ok(make_device(notifier)))
    }

    /// Like [`PlayerService::spawn`] for devices that can fail to start
    ///
    /// An error from `make_device` is returned as is and no thread is started.
    pub fn try_spawn<D, F>(config: PlaybackConfig, make_device: F) -> Result<Self>
    where
        D: AudioTransport + 'static,
        F: FnOnce(DeviceNotifier) -> Result<D>,
    {
        // Unbounded: device callbacks must never block
        let (command_tx, command_rx) = unbounded();

        let device = make_device(DeviceNotifier {
            commands: command_tx.clone(),
        })?;
        let transport = Transport::new(config, Box::new(device))?;
        let events = transport.events().clone();

        let thread = thread::Builder::new()
            .name("tempo-player".to_string())
            .spawn(move || run(transport, &command_rx))?;

        Ok(Self {
            handle: PlayerHandle {
                commands: command_tx,
            },
            events,
            thread: Some(thread),
        })
    }

    /// Cloneable handle for sending intents
    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    /// Stop the player thread and wait for it to exit
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        // Already gone if the loop exited through another handle
        let _ = self.handle.shutdown();
        if thread.join().is_err() {
            error!("player thread panicked");
        }
    }
}

impl Drop for PlayerService {
    fn drop(&mut self) {
        self.join();
    }
}

/// Sends intents to the player thread
///
/// Every method fails with [`PlaybackError::ServiceStopped`] once the thread
/// has exited.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: Sender<PlayerCommand>,
}

impl PlayerHandle {
    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ServiceStopped)
    }

    pub fn play(&self) -> Result<()> {
        self.send(PlayerCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(PlayerCommand::Stop)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(PlayerCommand::TogglePlayPause)
    }

    pub fn skip_next(&self) -> Result<()> {
        self.send(PlayerCommand::SkipNext)
    }

    pub fn skip_previous(&self) -> Result<()> {
        self.send(PlayerCommand::SkipPrevious)
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.send(PlayerCommand::Seek(position))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(PlayerCommand::SetVolume(volume))
    }

    pub fn play_track(&self, track: Track) -> Result<()> {
        self.send(PlayerCommand::PlayTrack(track))
    }

    pub fn replace_and_play(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.send(PlayerCommand::ReplaceAndPlay {
            tracks,
            start_index,
        })
    }

    pub fn append(&self, track: Track) -> Result<()> {
        self.send(PlayerCommand::Append(track))
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.send(PlayerCommand::SetRepeat(mode))
    }

    pub fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        self.send(PlayerCommand::SetShuffle(mode))
    }

    pub fn remote(&self, command: RemoteCommand) -> Result<()> {
        self.send(PlayerCommand::Remote(command))
    }

    /// Round trip to the player thread for a consistent view of the state
    pub fn snapshot(&self) -> Result<TransportSnapshot> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(PlayerCommand::Snapshot(reply_tx))?;
        reply_rx.recv().map_err(|_| PlaybackError::ServiceStopped)
    }

    /// Ask the player thread to exit
    pub fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown)
    }
}

/// Feeds device callbacks into the player thread
#[derive(Debug, Clone)]
pub struct DeviceNotifier {
    commands: Sender<PlayerCommand>,
}

impl DeviceNotifier {
    pub fn notify(&self, generation: Generation, event: DeviceEvent) -> Result<()> {
        self.commands
            .send(PlayerCommand::Device { generation, event })
            .map_err(|_| PlaybackError::ServiceStopped)
    }

    pub fn ready(&self, generation: Generation, duration: Duration) -> Result<()> {
        self.notify(generation, DeviceEvent::Ready { duration })
    }

    pub fn failed(&self, generation: Generation, reason: FailureReason) -> Result<()> {
        self.notify(generation, DeviceEvent::Failed { reason })
    }

    pub fn time_tick(&self, generation: Generation, position: Duration) -> Result<()> {
        self.notify(generation, DeviceEvent::TimeTick { position })
    }

    pub fn finished(&self, generation: Generation) -> Result<()> {
        self.notify(generation, DeviceEvent::Finished)
    }
}

fn run(mut transport: Transport, commands: &Receiver<PlayerCommand>) {
    info!("player service started");

    loop {
        let received = match transport.buffering_deadline() {
            Some(deadline) => {
                commands.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => commands
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        let command = match received {
            Ok(command) => command,
            Err(RecvTimeoutError::Timeout) => {
                transport.poll_timeout(Instant::now());
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if matches!(command, PlayerCommand::Shutdown) {
            break;
        }
        apply(&mut transport, command);
    }

    transport.stop();
    info!("player service stopped");
}

fn apply(transport: &mut Transport, command: PlayerCommand) {
    match command {
        PlayerCommand::Play => transport.play(),
        PlayerCommand::Pause => transport.pause(),
        PlayerCommand::Stop => transport.stop(),
        PlayerCommand::TogglePlayPause => transport.toggle_play_pause(),
        PlayerCommand::SkipNext => {
            transport.skip_next();
        }
        PlayerCommand::SkipPrevious => {
            transport.skip_previous();
        }
        PlayerCommand::Seek(position) => transport.seek(position),
        PlayerCommand::SetVolume(volume) => transport.set_volume(volume),
        PlayerCommand::Mute => transport.mute(),
        PlayerCommand::Unmute => transport.unmute(),
        PlayerCommand::ToggleMute => transport.toggle_mute(),

        PlayerCommand::PlayTrack(track) => transport.play_track(track),
        PlayerCommand::PlayAt(index) => {
            transport.play_at(index);
        }
        PlayerCommand::ReplaceAndPlay {
            tracks,
            start_index,
        } => transport.replace_and_play(tracks, start_index),
        PlayerCommand::Append(track) => transport.append(track),
        PlayerCommand::AppendAll(tracks) => transport.append_all(tracks),
        PlayerCommand::InsertNext(track) => transport.insert_next(track),
        PlayerCommand::RemoveAt(index) => {
            if let Err(e) = transport.remove_at(index) {
                warn!("remove failed: {}", e);
            }
        }
        PlayerCommand::MoveTrack { from, to } => {
            if let Err(e) = transport.move_track(from, to) {
                warn!("move failed: {}", e);
            }
        }
        PlayerCommand::ClearQueue => transport.clear_queue(),

        PlayerCommand::SetRepeat(mode) => transport.set_repeat_mode(mode),
        PlayerCommand::SetShuffle(mode) => transport.set_shuffle_mode(mode),
        PlayerCommand::CycleRepeat => {
            transport.cycle_repeat_mode();
        }
        PlayerCommand::ToggleShuffle => {
            transport.toggle_shuffle();
        }

        PlayerCommand::Remote(command) => transport.handle_remote_command(command),
        PlayerCommand::RouteLost => transport.on_route_lost(),
        PlayerCommand::InterruptionBegan => transport.on_interruption_began(),
        PlayerCommand::InterruptionEnded { should_resume } => {
            transport.on_interruption_ended(should_resume);
        }

        PlayerCommand::Device { generation, event } => {
            transport.handle_device_event(generation, event);
        }

        PlayerCommand::Snapshot(reply) => {
            if reply.send(transport.snapshot()).is_err() {
                debug!("snapshot requester went away");
            }
        }

        PlayerCommand::Shutdown => {}
    }
}
