//! Crash-Point History
//!
//! Bounded record of past rounds' outcomes, most recent first. Clients
//! render this as the streak strip above the game.

use std::collections::VecDeque;

use crate::HISTORY_LIMIT;

/// Ordered log of past crash points, capped at [`HISTORY_LIMIT`].
#[derive(Clone, Debug, Default)]
pub struct RoundHistory {
    entries: VecDeque<f64>,
}

impl RoundHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a finished round's crash point, evicting the oldest
    /// entry beyond the cap.
    pub fn record(&mut self, crash_point: f64) {
        self.entries.push_front(crash_point);
        self.entries.truncate(HISTORY_LIMIT);
    }

    /// Most recent crash point, if any round has finished.
    pub fn latest(&self) -> Option<f64> {
        self.entries.front().copied()
    }

    /// Snapshot for the wire, most recent first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.entries.iter().copied().collect()
    }

    /// Number of recorded rounds (at most the cap).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no round has finished yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
