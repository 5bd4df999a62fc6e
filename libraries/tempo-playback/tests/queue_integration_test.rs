//! Queue integration tests
//!
//! Real-world scenarios: playing an album, next/previous buttons, shuffle
//! toggling and editing the queue while something is playing.

use std::time::Duration;
use tempo_playback::{PlaybackConfig, PlaybackError, Queue, RepeatMode, ShuffleMode, Track};

// ===== Test Helpers =====

fn create_track(id: &str, title: &str, artist: &str, duration_secs: u64) -> Track {
    Track::new(id, format!("https://cdn.example.com/{}.mp3", id))
        .with_title(title)
        .with_artist(artist)
        .with_album("Test Album")
        .with_duration(Duration::from_secs(duration_secs))
}

fn abc() -> Vec<Track> {
    vec![
        create_track("A", "Track A", "Artist 1", 180),
        create_track("B", "Track B", "Artist 2", 200),
        create_track("C", "Track C", "Artist 3", 220),
    ]
}

fn seeded_queue() -> Queue {
    Queue::with_config(&PlaybackConfig {
        shuffle_seed: Some(42),
        ..Default::default()
    })
}

fn current_id(queue: &Queue) -> Option<&str> {
    queue.current().map(|t| t.id.as_str())
}

fn ids(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.id.as_str()).collect()
}

// ===== Advance / Repeat =====

#[test]
fn test_advance_repeat_off_stops_at_last_track() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.set_repeat_mode(RepeatMode::Off);

    assert!(queue.advance().is_some());
    assert_eq!(current_id(&queue), Some("B"));

    assert!(queue.advance().is_some());
    assert_eq!(current_id(&queue), Some("C"));

    assert!(queue.advance().is_none(), "no next at end of queue");
    assert_eq!(current_id(&queue), Some("C"));
}

#[test]
fn test_advance_repeat_all_wraps_and_records_history() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.set_repeat_mode(RepeatMode::All);
    queue.play_at(2);
    queue.clear_history();

    assert_eq!(queue.advance(), Some(0));
    assert_eq!(current_id(&queue), Some("A"));
    assert_eq!(queue.history().last().map(|t| t.id.as_str()), Some("C"));
}

#[test]
fn test_play_track_on_empty_queue() {
    let mut queue = seeded_queue();
    let x = create_track("X", "Track X", "Artist X", 100);

    queue.play_track(x.clone());

    assert_eq!(queue.items(), &[x.clone()]);
    assert_eq!(queue.current_index(), Some(0));
    assert_eq!(queue.current(), Some(&x));
    assert!(queue.history().is_empty());
}

#[test]
fn test_enable_shuffle_moves_current_to_front() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.play_at(1);

    queue.enable_shuffle();

    assert_eq!(queue.items()[0].id.as_str(), "B");
    assert_eq!(queue.current_index(), Some(0));
    assert_eq!(ids(queue.original_order()), vec!["A", "B", "C"]);
}

// ===== Album Playback =====

#[test]
fn test_play_album_from_middle_then_walk_back() {
    let mut queue = seeded_queue();
    let album: Vec<Track> = (1..=6)
        .map(|i| create_track(&i.to_string(), &format!("Song {}", i), "Band", 180))
        .collect();

    queue.replace_and_play(album, 3);
    assert_eq!(current_id(&queue), Some("4"));
    assert!(queue.has_previous(), "list order allows going back");

    queue.advance();
    queue.advance();
    assert_eq!(current_id(&queue), Some("6"));

    // Retrace the actual path
    queue.retreat();
    assert_eq!(current_id(&queue), Some("5"));
    queue.retreat();
    assert_eq!(current_id(&queue), Some("4"));

    // History exhausted, falls back to list order
    queue.retreat();
    assert_eq!(current_id(&queue), Some("3"));
}

#[test]
fn test_previous_after_jump_returns_to_jump_origin() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.append(create_track("D", "Track D", "Artist 4", 100));

    // User taps D while A is playing
    queue.play_at(3);
    assert_eq!(queue.retreat(), Some(0));
    assert_eq!(current_id(&queue), Some("A"));
}

#[test]
fn test_replace_clears_history_and_order() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.advance();

    queue.replace_and_play(vec![create_track("Z", "Track Z", "Artist Z", 60)], 0);

    assert_eq!(queue.len(), 1);
    assert!(queue.history().is_empty());
    assert!(!queue.has_previous());
}

#[test]
fn test_replace_with_out_of_range_start_begins_at_zero() {
    let mut queue = seeded_queue();
    queue.replace_and_play(abc(), 99);
    assert_eq!(current_id(&queue), Some("A"));
}

#[test]
fn test_replace_with_empty_list_empties_queue() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    assert!(queue.replace_and_play(Vec::new(), 0).is_none());
    assert!(queue.is_empty());
    assert_eq!(queue.current_index(), None);
}

// ===== Editing While Playing =====

#[test]
fn test_play_next_queue_order() {
    let mut queue = seeded_queue();
    queue.append_all(abc());

    queue.insert_next(create_track("N1", "Next 1", "Artist", 100));
    queue.insert_next(create_track("N2", "Next 2", "Artist", 100));

    // Most recent "play next" goes first
    assert_eq!(ids(queue.items()), vec!["A", "N2", "N1", "B", "C"]);
    assert_eq!(queue.advance(), Some(1));
    assert_eq!(current_id(&queue), Some("N2"));
}

#[test]
fn test_remove_and_move_keep_current_identity() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.append(create_track("D", "Track D", "Artist 4", 100));
    queue.play_at(2);

    queue.move_track(3, 0).unwrap();
    assert_eq!(current_id(&queue), Some("C"));

    queue.remove_at(1).unwrap();
    assert_eq!(current_id(&queue), Some("C"));
    assert_eq!(ids(queue.items()), vec!["D", "B", "C"]);
}

#[test]
fn test_direct_index_errors_are_loud() {
    let mut queue = seeded_queue();
    queue.append_all(abc());

    let err = queue.remove_at(3).unwrap_err();
    assert!(matches!(err, PlaybackError::IndexOutOfRange { index: 3, len: 3 }));

    let err = queue.move_track(0, 7).unwrap_err();
    assert!(matches!(err, PlaybackError::IndexOutOfRange { index: 7, len: 3 }));
}

#[test]
fn test_removing_everything_leaves_no_current() {
    let mut queue = seeded_queue();
    queue.append_all(abc());
    queue.play_at(1);

    while !queue.is_empty() {
        queue.remove_at(0).unwrap();
        if let Some(index) = queue.current_index() {
            assert!(index < queue.len());
        }
    }

    assert!(queue.current().is_none());
    assert_eq!(queue.current_index(), None);
    assert!(!queue.has_next());
}

// ===== Shuffle =====

#[test]
fn test_shuffle_then_edit_then_unshuffle() {
    let mut queue = seeded_queue();
    let tracks: Vec<Track> = (0..20)
        .map(|i| create_track(&format!("t{}", i), "Song", "Band", 100))
        .collect();
    queue.append_all(tracks);
    queue.play_at(5);

    queue.enable_shuffle();
    assert_eq!(current_id(&queue), Some("t5"));

    queue.append(create_track("late", "Late", "Band", 100));
    let pos = queue.position(&create_track("t9", "", "", 0)).unwrap();
    queue.remove_at(pos).unwrap();

    queue.disable_shuffle();

    let expected: Vec<String> = (0..20)
        .filter(|i| *i != 9)
        .map(|i| format!("t{}", i))
        .chain(std::iter::once("late".to_string()))
        .collect();
    let actual: Vec<String> = queue.items().iter().map(|t| t.id.to_string()).collect();
    assert_eq!(actual, expected);
    assert_eq!(current_id(&queue), Some("t5"));
}

#[test]
fn test_shuffle_configured_up_front() {
    let mut queue = Queue::with_config(&PlaybackConfig {
        shuffle: ShuffleMode::On,
        shuffle_seed: Some(7),
        ..Default::default()
    });
    assert_eq!(queue.shuffle_mode(), ShuffleMode::On);

    queue.replace_and_play(abc(), 2);
    assert_eq!(current_id(&queue), Some("C"));
    assert_eq!(queue.current_index(), Some(0));
}

#[test]
fn test_same_seed_same_shuffle() {
    let tracks: Vec<Track> = (0..30)
        .map(|i| create_track(&i.to_string(), "Song", "Band", 100))
        .collect();

    let mut first = seeded_queue();
    first.append_all(tracks.clone());
    first.enable_shuffle();

    let mut second = seeded_queue();
    second.append_all(tracks);
    second.enable_shuffle();

    assert_eq!(first.items(), second.items());
}

// ===== History Bound =====

#[test]
fn test_history_capped_at_fifty() {
    let mut queue = seeded_queue();
    let tracks: Vec<Track> = (0..80)
        .map(|i| create_track(&i.to_string(), "Song", "Band", 100))
        .collect();
    queue.append_all(tracks);

    for _ in 0..70 {
        queue.advance();
    }

    assert_eq!(queue.history().len(), 50);
    // 0..=69 were pushed; the oldest 20 were evicted
    let oldest = queue.history().iter().next().unwrap();
    assert_eq!(oldest.id.as_str(), "20");
    assert_eq!(queue.history().last().unwrap().id.as_str(), "69");
}
