//! Shuffle algorithm for queue randomization
//!
//! Fisher-Yates over everything except the current track, which is pinned to
//! the front so "now playing" never moves when shuffle is switched on.

use crate::types::Track;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Build the RNG used for shuffling
///
/// A fixed seed makes every shuffle reproducible.
pub fn shuffle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Shuffle `tracks`, keeping the track at `current` at position 0
///
/// Returns the new index of the current track (always 0 for a non-empty
/// list). An out-of-range `current` shuffles the whole list.
pub fn shuffle_around_current(
    tracks: &mut Vec<Track>,
    current: usize,
    rng: &mut StdRng,
) -> usize {
    if current >= tracks.len() {
        tracks.shuffle(rng);
        return 0;
    }

    let pinned = tracks.remove(current);
    tracks.shuffle(rng);
    tracks.insert(0, pinned);
    0
}
