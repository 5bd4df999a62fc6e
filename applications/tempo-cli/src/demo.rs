//! Scripted demo session
//!
//! Plays a synthetic playlist through the player service and a simulated
//! device, logging every transport event until the queue runs out.

use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};
use tempo_playback::{
    Phase, PlayerHandle, PlayerService, RepeatMode, ShuffleMode, Track, TrackId, TransportEvent,
    TransportSnapshot,
};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::simulator::{SimulatedDevice, FAIL_SCHEME};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Every this many tracks one is made unplayable when failures are requested
const FAILURE_STRIDE: usize = 4;

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub tracks: usize,
    pub shuffle: bool,
    pub repeat: Option<RepeatMode>,
    pub with_failures: bool,
    /// Stop after this many track changes (default: twice the playlist)
    pub max_tracks: Option<usize>,
    /// Wall-clock limit for the whole session
    pub time_limit: Duration,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            tracks: 5,
            shuffle: false,
            repeat: None,
            with_failures: false,
            max_tracks: None,
            time_limit: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoSummary {
    /// Tracks in the order they were loaded
    pub played: Vec<TrackId>,
    pub failures: usize,
    pub final_snapshot: TransportSnapshot,
}

/// Build `count` tracks; with `with_failures` every fourth one cannot load
pub fn synthetic_playlist(count: usize, with_failures: bool) -> Vec<Track> {
    (1..=count)
        .map(|n| {
            let id = format!("track-{:03}", n);
            let url = if with_failures && n % FAILURE_STRIDE == 0 {
                format!("{}{}", FAIL_SCHEME, id)
            } else {
                format!("sim://{}", id)
            };
            Track::new(id, url)
                .with_title(format!("Song {}", n))
                .with_artist("The Simulators")
                .with_album("Synthetic Sessions")
        })
        .collect()
}

/// Run a demo session to completion
pub fn run(config: &AppConfig, options: &DemoOptions) -> Result<DemoSummary> {
    if options.tracks == 0 {
        return Err(CliError::Config("--tracks must be at least 1".to_string()));
    }

    let mut playback = config.playback.clone();
    if options.shuffle {
        playback.shuffle = ShuffleMode::On;
    }
    if let Some(repeat) = options.repeat {
        playback.repeat = repeat;
    }

    let settings = config.simulator.clone();
    let service = PlayerService::try_spawn(playback, |notifier| {
        SimulatedDevice::spawn(settings, notifier)
    })?;
    let handle = service.handle();
    let mut events = service.subscribe();

    let playlist = synthetic_playlist(options.tracks, options.with_failures);
    let mut session = Session {
        handle: handle.clone(),
        played: Vec::new(),
        failures: 0,
        max_tracks: options.max_tracks.unwrap_or(playlist.len() * 2),
    };

    info!(tracks = playlist.len(), "starting demo session");
    handle.replace_and_play(playlist, 0)?;

    let deadline = Instant::now() + options.time_limit;
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => {
                if Instant::now() >= deadline {
                    info!("time limit reached");
                    break;
                }
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "event log fell behind");
                continue;
            }
            Err(TryRecvError::Closed) => break,
        };

        if session.on_event(event)?.is_break() {
            break;
        }
    }

    let final_snapshot = handle.snapshot()?;
    service.shutdown();

    info!(
        played = session.played.len(),
        failures = session.failures,
        "demo session finished"
    );

    Ok(DemoSummary {
        played: session.played,
        failures: session.failures,
        final_snapshot,
    })
}

struct Session {
    handle: PlayerHandle,
    played: Vec<TrackId>,
    failures: usize,
    max_tracks: usize,
}

impl Session {
    fn on_event(&mut self, event: TransportEvent) -> Result<ControlFlow<()>> {
        match event {
            TransportEvent::TrackChanged {
                track_id,
                previous_track_id,
            } => {
                info!(track = %track_id, previous = ?previous_track_id, "track changed");
                self.played.push(track_id);
                if self.played.len() > self.max_tracks {
                    info!(limit = self.max_tracks, "track limit reached");
                    return Ok(ControlFlow::Break(()));
                }
            }
            TransportEvent::PhaseChanged {
                phase: Phase::Error(reason),
            } => {
                warn!(%reason, "playback failed, skipping");
                self.failures += 1;

                self.handle.skip_next()?;
                if self.handle.snapshot()?.phase.is_error() {
                    info!("no track left to skip to");
                    return Ok(ControlFlow::Break(()));
                }
                self.handle.play()?;
            }
            TransportEvent::PhaseChanged {
                phase: Phase::Stopped,
            } => {
                info!("queue finished");
                return Ok(ControlFlow::Break(()));
            }
            TransportEvent::PhaseChanged { phase } => {
                info!(?phase, "phase changed");
            }
            TransportEvent::PositionChanged { position, duration } => {
                debug!(?position, ?duration, "position");
            }
            other => {
                info!(event = ?other, "transport event");
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}
