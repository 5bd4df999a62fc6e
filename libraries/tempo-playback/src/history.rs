//! Bounded record of tracks that were current before the present one

use crate::types::Track;
use std::collections::VecDeque;

/// FIFO of previously-current tracks
///
/// `retreat` takes from the newest end; once `capacity` is reached the
/// oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Track>,
    capacity: usize,
}

impl History {
    /// A capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `track` as the newest entry, evicting the oldest when full
    pub fn record(&mut self, track: Track) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(track);
    }

    pub fn last(&self) -> Option<&Track> {
        self.entries.back()
    }

    pub fn take_last(&mut self) -> Option<Track> {
        self.entries.pop_back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(id, format!("file:///music/{}.mp3", id))
    }

    fn recorded(ids: &[&str], capacity: usize) -> History {
        let mut history = History::new(capacity);
        for id in ids {
            history.record(track(id));
        }
        history
    }

    fn ids(history: &History) -> Vec<&str> {
        history.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn starts_empty() {
        let history = History::new(10);
        assert_eq!(history.capacity(), 10);
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn take_last_is_lifo() {
        let mut history = recorded(&["1", "2", "3"], 10);

        assert_eq!(history.last().map(|t| t.id.as_str()), Some("3"));
        assert_eq!(history.take_last().map(|t| t.id), Some(track("3").id));
        assert_eq!(history.take_last().map(|t| t.id), Some(track("2").id));
        assert_eq!(ids(&history), vec!["1"]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let history = recorded(&["1", "2", "3", "4"], 3);
        assert_eq!(ids(&history), vec!["2", "3", "4"]);
    }

    #[test]
    fn keeps_repeated_tracks() {
        let history = recorded(&["1", "1"], 5);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let history = recorded(&["1", "2"], 0);
        assert_eq!(ids(&history), vec!["2"]);
    }

    #[test]
    fn clear_empties() {
        let mut history = recorded(&["1", "2"], 5);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(History::default().capacity(), 50);
    }
}
