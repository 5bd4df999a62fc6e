//! Queue model
//!
//! Owns the canonical play order, the current position, an optional shuffled
//! view and the bounded play history:
//!
//! ```text
//! history:   [A] [B]            (most recent last, max 50)
//! items:      C   D  >E<  F  G  (current = E)
//! original:   None while shuffle is off, else the pre-shuffle order
//! ```
//!
//! While shuffle is off `items` *is* the canonical order, so there is no
//! second copy to keep in sync.

use rand::rngs::StdRng;
use tracing::debug;

use crate::{
    error::{PlaybackError, Result},
    history::History,
    shuffle::{shuffle_around_current, shuffle_rng},
    types::{PlaybackConfig, RepeatMode, ShuffleMode, Track},
};

#[derive(Debug, Clone)]
pub struct Queue {
    /// Tracks in play order (shuffled while shuffle is on)
    items: Vec<Track>,

    /// Index of the current track; meaningless while `items` is empty
    current_index: usize,

    /// Pre-shuffle order, present only while shuffle is on
    original_order: Option<Vec<Track>>,

    /// Previously-current tracks
    history: History,

    repeat_mode: RepeatMode,
    shuffle_mode: ShuffleMode,

    rng: StdRng,
}

impl Queue {
    /// Create an empty queue with default settings
    pub fn new() -> Self {
        Self::with_config(&PlaybackConfig::default())
    }

    /// Create an empty queue from configuration
    ///
    /// The configured shuffle mode is applied immediately, so tracks added
    /// later land in a shuffled queue.
    pub fn with_config(config: &PlaybackConfig) -> Self {
        let mut queue = Self {
            items: Vec::new(),
            current_index: 0,
            original_order: None,
            history: History::new(config.history_size),
            repeat_mode: config.repeat,
            shuffle_mode: ShuffleMode::Off,
            rng: shuffle_rng(config.shuffle_seed),
        };
        queue.set_shuffle_mode(config.shuffle);
        queue
    }

    // ===== Editing =====

    /// Add track to the end of the queue
    pub fn append(&mut self, track: Track) {
        if let Some(original) = self.original_order.as_mut() {
            original.push(track.clone());
        }
        self.items.push(track);
    }

    /// Add tracks to the end of the queue
    pub fn append_all(&mut self, tracks: impl IntoIterator<Item = Track>) {
        for track in tracks {
            self.append(track);
        }
    }

    /// Insert track right after the current one ("play next")
    pub fn insert_next(&mut self, track: Track) {
        self.insert_next_all(std::iter::once(track));
    }

    /// Insert tracks right after the current one, keeping their order
    pub fn insert_next_all(&mut self, tracks: impl IntoIterator<Item = Track>) {
        let tracks: Vec<Track> = tracks.into_iter().collect();
        if tracks.is_empty() {
            return;
        }

        if let Some(original) = self.original_order.as_mut() {
            let at = self
                .items
                .get(self.current_index)
                .and_then(|current| original.iter().position(|t| t == current))
                .map_or(original.len(), |pos| pos + 1);
            original.splice(at..at, tracks.iter().cloned());
        }

        let at = (self.current_index + 1).min(self.items.len());
        self.items.splice(at..at, tracks);
    }

    /// Remove the track at `index`
    ///
    /// The current index keeps pointing at the same logical track when the
    /// removed one sits before it. Removing the current track makes its
    /// successor current (or the new last track when it was the last).
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        let len = self.items.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        let removed = self.items.remove(index);
        if index < self.current_index {
            self.current_index -= 1;
        } else if index == self.current_index {
            self.current_index = self
                .current_index
                .min(self.items.len().saturating_sub(1));
        }

        if let Some(original) = self.original_order.as_mut() {
            if let Some(pos) = original.iter().position(|t| t == &removed) {
                original.remove(pos);
            }
        }

        Ok(removed)
    }

    /// Move the track at `from` to `to`
    ///
    /// The current index follows the current track.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.items.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfRange { index: to, len });
        }
        if from == to {
            return Ok(());
        }

        let track = self.items.remove(from);
        self.items.insert(to, track);

        let current = self.current_index;
        if from == current {
            self.current_index = to;
        } else if from < current && to >= current {
            self.current_index -= 1;
        } else if from > current && to <= current {
            self.current_index += 1;
        }

        Ok(())
    }

    /// Reset to the empty state
    ///
    /// Shuffle and repeat settings survive.
    pub fn clear(&mut self) {
        self.items.clear();
        self.current_index = 0;
        if self.original_order.is_some() {
            self.original_order = Some(Vec::new());
        }
        self.history.clear();
    }

    /// Clear history only
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ===== Navigation =====

    /// Make `track` current
    ///
    /// Jumps to the track's first occurrence, or inserts it at the front if it
    /// is not queued. Returns the new current index.
    pub fn play_track(&mut self, track: Track) -> usize {
        if let Some(index) = self.position(&track) {
            self.jump_to(index);
            return index;
        }

        let previous = self.current().cloned();
        if let Some(original) = self.original_order.as_mut() {
            original.insert(0, track.clone());
        }
        self.items.insert(0, track);
        self.current_index = 0;
        if let Some(previous) = previous {
            self.history.record(previous);
        }
        0
    }

    /// Make the track at `index` current
    ///
    /// Out-of-range indices are ignored and return `false`.
    pub fn play_at(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            debug!(index, len = self.items.len(), "play_at out of range, ignoring");
            return false;
        }
        self.jump_to(index);
        true
    }

    /// Replace the whole queue and start at `start_index`
    ///
    /// With shuffle on, the chosen track becomes current first and the rest
    /// is shuffled around it, so the listener gets the track they picked.
    pub fn replace_and_play(&mut self, tracks: Vec<Track>, start_index: usize) -> Option<&Track> {
        self.clear();
        self.append_all(tracks);

        let start = if start_index < self.items.len() {
            start_index
        } else {
            debug!(
                start_index,
                len = self.items.len(),
                "start index out of range, starting at 0"
            );
            0
        };
        self.current_index = start;

        if self.shuffle_mode == ShuffleMode::On {
            self.original_order = Some(self.items.clone());
            self.current_index =
                shuffle_around_current(&mut self.items, self.current_index, &mut self.rng);
        }

        self.current()
    }

    /// Move to the next track according to the repeat mode
    ///
    /// Returns the new current index, or `None` when there is no next track.
    /// `RepeatMode::Single` returns the unchanged current index.
    pub fn advance(&mut self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }

        let last = self.items.len() - 1;
        let next = match self.repeat_mode {
            RepeatMode::Single => return Some(self.current_index),
            RepeatMode::All if self.current_index >= last => 0,
            RepeatMode::Off if self.current_index >= last => return None,
            RepeatMode::All | RepeatMode::Off => self.current_index + 1,
        };

        self.jump_to(next);
        Some(next)
    }

    /// Move to the previous track
    ///
    /// Retraces history first, then list order, then wraps when repeating
    /// the whole queue. Returns the new current index, or `None` for no-op.
    pub fn retreat(&mut self) -> Option<usize> {
        if let Some(previous) = self.history.take_last() {
            if let Some(index) = self.position(&previous) {
                self.current_index = index;
                return Some(index);
            }
            debug!(track_id = %previous.id, "history entry no longer queued");
        }

        if self.items.is_empty() {
            return None;
        }

        if self.current_index > 0 {
            self.current_index -= 1;
            Some(self.current_index)
        } else if self.repeat_mode == RepeatMode::All {
            self.current_index = self.items.len() - 1;
            Some(self.current_index)
        } else {
            None
        }
    }

    fn jump_to(&mut self, index: usize) {
        if let Some(previous) = self.current().cloned() {
            self.history.record(previous);
        }
        self.current_index = index;
    }

    // ===== Shuffle & Repeat =====

    /// Shuffle the queue, keeping the current track current at position 0
    pub fn enable_shuffle(&mut self) {
        if self.shuffle_mode == ShuffleMode::On {
            return;
        }

        self.shuffle_mode = ShuffleMode::On;
        self.original_order = Some(self.items.clone());
        if !self.items.is_empty() {
            self.current_index =
                shuffle_around_current(&mut self.items, self.current_index, &mut self.rng);
        }
        debug!(len = self.items.len(), "shuffle enabled");
    }

    /// Restore the pre-shuffle order
    ///
    /// The current index follows the current track, falling back to 0 when
    /// the track can no longer be found.
    pub fn disable_shuffle(&mut self) {
        if self.shuffle_mode == ShuffleMode::Off {
            return;
        }

        self.shuffle_mode = ShuffleMode::Off;
        let current = self.current().cloned();
        self.items = self.original_order.take().unwrap_or_default();
        self.current_index = current
            .and_then(|track| self.position(&track))
            .unwrap_or(0);
        debug!(len = self.items.len(), "shuffle disabled");
    }

    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) {
        match mode {
            ShuffleMode::On => self.enable_shuffle(),
            ShuffleMode::Off => self.disable_shuffle(),
        }
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.shuffle_mode
    }

    // ===== Queries =====

    /// Current track, `None` while the queue is empty
    pub fn current(&self) -> Option<&Track> {
        self.items.get(self.current_index)
    }

    /// Current index, `None` while the queue is empty
    pub fn current_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.current_index)
    }

    /// Current track, failing with `EmptyQueue` when there is none
    pub fn require_current(&self) -> Result<&Track> {
        self.current().ok_or(PlaybackError::EmptyQueue)
    }

    /// Whether a next track exists for the current repeat mode
    pub fn has_next(&self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        match self.repeat_mode {
            RepeatMode::Single | RepeatMode::All => true,
            RepeatMode::Off => self.current_index + 1 < self.items.len(),
        }
    }

    /// Whether `retreat` can go anywhere
    pub fn has_previous(&self) -> bool {
        !self.history.is_empty() || (!self.items.is_empty() && self.current_index > 0)
    }

    /// Tracks after the current one
    pub fn upcoming(&self) -> &[Track] {
        self.items.get(self.current_index + 1..).unwrap_or(&[])
    }

    /// Index of the first occurrence of `track` (by id)
    pub fn position(&self, track: &Track) -> Option<usize> {
        self.items.iter().position(|t| t == track)
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.position(track).is_some()
    }

    /// Whether `track` is the current track
    pub fn is_current(&self, track: &Track) -> bool {
        self.current() == Some(track)
    }

    /// Track at `index`, `None` when out of range
    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.items.get(index)
    }

    /// Track at `index`, failing loudly when out of range
    pub fn track_at_checked(&self, index: usize) -> Result<&Track> {
        self.items.get(index).ok_or(PlaybackError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Tracks in play order
    pub fn items(&self) -> &[Track] {
        &self.items
    }

    /// Canonical order: the pre-shuffle snapshot while shuffled, else `items`
    pub fn original_order(&self) -> &[Track] {
        self.original_order.as_deref().unwrap_or(&self.items)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}
