//! Player service tests
//!
//! Runs the engine on its own thread and talks to it only through
//! PlayerHandle, DeviceNotifier and the event bus.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempo_playback::{
    AudioTransport, DeviceNotifier, Generation, LoadRequest, Phase, PlaybackConfig,
    PlaybackError, PlayerCommand, PlayerHandle, PlayerService, RemoteCommand, RepeatMode, Track,
    TransportEvent, TransportSnapshot,
};

// ===== Test Helpers =====

/// Answers every load with Ready and remembers the latest generation
struct AutoReadyDevice {
    notifier: DeviceNotifier,
    last_load: Arc<Mutex<Option<Generation>>>,
}

impl AudioTransport for AutoReadyDevice {
    fn load(&mut self, request: LoadRequest) {
        *self.last_load.lock().unwrap() = Some(request.generation);
        self.notifier
            .ready(request.generation, Duration::from_secs(120))
            .unwrap();
    }
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _position: Duration) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn stop(&mut self) {}
}

struct Harness {
    service: PlayerService,
    handle: PlayerHandle,
    notifier: DeviceNotifier,
    last_load: Arc<Mutex<Option<Generation>>>,
}

impl Harness {
    fn new(config: PlaybackConfig) -> Self {
        let last_load = Arc::new(Mutex::new(None));
        let mut notifier_slot = None;

        let device_last_load = last_load.clone();
        let service = PlayerService::spawn(config, |notifier| {
            notifier_slot = Some(notifier.clone());
            AutoReadyDevice {
                notifier,
                last_load: device_last_load,
            }
        })
        .unwrap();
        let handle = service.handle();

        Self {
            service,
            handle,
            notifier: notifier_slot.unwrap(),
            last_load,
        }
    }

    fn last_load(&self) -> Generation {
        self.last_load.lock().unwrap().expect("nothing loaded yet")
    }

    fn wait_until(&self, pred: impl Fn(&TransportSnapshot) -> bool) -> TransportSnapshot {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let snap = self.handle.snapshot().unwrap();
            if pred(&snap) {
                return snap;
            }
            assert!(Instant::now() < deadline, "timed out, last state: {:?}", snap);
            thread::sleep(Duration::from_millis(5));
        }
    }
}

fn create_track(id: &str) -> Track {
    Track::new(id, format!("https://cdn.example.com/{}.mp3", id))
}

fn playing(id: &'static str) -> impl Fn(&TransportSnapshot) -> bool {
    move |snap| {
        snap.phase == Phase::Playing
            && snap.current_track.as_ref().map(|t| t.id.as_str()) == Some(id)
    }
}

// ===== Tests =====

#[test]
fn test_album_plays_through_on_service_thread() {
    let harness = Harness::new(PlaybackConfig::default());
    let mut events = harness.service.subscribe();

    harness
        .handle
        .replace_and_play(vec![create_track("a"), create_track("b")], 0)
        .unwrap();

    harness.wait_until(playing("a"));
    harness.notifier.finished(harness.last_load()).unwrap();

    harness.wait_until(playing("b"));
    harness.notifier.finished(harness.last_load()).unwrap();

    let snap = harness.wait_until(|snap| snap.phase == Phase::Stopped);
    assert_eq!(snap.current_track.unwrap().id.as_str(), "b");

    let track_changes: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            TransportEvent::TrackChanged { track_id, .. } => Some(track_id.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(track_changes, vec!["a", "b"]);
}

#[test]
fn test_stale_notifications_ignored() {
    let harness = Harness::new(PlaybackConfig::default());
    harness.handle.replace_and_play(vec![create_track("a"), create_track("b")], 0).unwrap();
    harness.wait_until(playing("a"));

    let old = harness.last_load();
    harness.handle.skip_next().unwrap();
    harness.wait_until(playing("b"));

    // A late Finished from the first load must not skip "b"
    harness.notifier.finished(old).unwrap();
    let snap = harness.handle.snapshot().unwrap();
    assert_eq!(snap.current_track.unwrap().id.as_str(), "b");
    assert_eq!(snap.phase, Phase::Playing);
}

#[test]
fn test_concurrent_handles_are_serialized() {
    let harness = Harness::new(PlaybackConfig::default());

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let handle = harness.handle.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    handle
                        .append(create_track(&format!("w{}-{}", worker, i)))
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let snap = harness.handle.snapshot().unwrap();
    assert_eq!(snap.queue_length, 100);
    assert_eq!(snap.phase, Phase::Stopped, "appending never starts playback");
}

#[test]
fn test_raw_commands_and_remote_control() {
    let harness = Harness::new(PlaybackConfig::default());
    harness
        .handle
        .send(PlayerCommand::AppendAll(vec![create_track("a"), create_track("b")]))
        .unwrap();
    harness.handle.set_repeat_mode(RepeatMode::All).unwrap();
    harness.handle.remote(RemoteCommand::Play).unwrap();
    harness.wait_until(playing("a"));

    harness.handle.send(PlayerCommand::InterruptionBegan).unwrap();
    harness.wait_until(|snap| snap.phase == Phase::Paused);

    harness
        .handle
        .send(PlayerCommand::InterruptionEnded { should_resume: true })
        .unwrap();
    harness.wait_until(playing("a"));

    harness.handle.remote(RemoteCommand::PreviousTrack).unwrap();
    // Repeat all wraps backwards from the first track
    let snap = harness.wait_until(playing("b"));
    assert_eq!(snap.repeat, RepeatMode::All);
}

#[test]
fn test_bad_index_command_does_not_kill_service() {
    let harness = Harness::new(PlaybackConfig::default());
    harness.handle.send(PlayerCommand::RemoveAt(10)).unwrap();
    harness
        .handle
        .send(PlayerCommand::MoveTrack { from: 3, to: 1 })
        .unwrap();

    assert!(harness.handle.snapshot().is_ok());
}

#[test]
fn test_shutdown_stops_everything() {
    let harness = Harness::new(PlaybackConfig::default());
    let handle = harness.handle.clone();
    let notifier = harness.notifier.clone();
    harness.service.shutdown();

    assert!(matches!(handle.play(), Err(PlaybackError::ServiceStopped)));
    assert!(matches!(
        notifier.finished(Generation::default()),
        Err(PlaybackError::ServiceStopped)
    ));
    assert!(matches!(
        handle.snapshot(),
        Err(PlaybackError::ServiceStopped)
    ));
}
