//! Session-stat persistence and leaderboard hooks
//!
//! The session calls these only at game over. The storage backend is the
//! embedder's concern; [`MemoryStats`] is the default store and snapshots to
//! JSON for hosts that persist a blob.

use serde::{Deserialize, Serialize};

/// Persistent best-score bookkeeping consumed by the session at game over.
pub trait StatsStore {
    fn best_score(&self) -> u32;
    fn best_combo(&self) -> u32;
    fn total_taps(&self) -> u64;

    /// Record a final score; returns whether it beat the stored best.
    fn update_best_score(&mut self, score: u32) -> bool;

    /// Record a final max combo; returns whether it beat the stored best.
    fn update_best_combo(&mut self, combo: u32) -> bool;

    /// Add to the lifetime tap counter. Negative deltas are ignored.
    fn add_taps(&mut self, delta: i64);
}

/// External leaderboard sink, notified only when a new best was recorded.
pub trait Leaderboard {
    fn submit_score(&mut self, score: u32);
    fn submit_combo(&mut self, combo: u32);
}

/// Leaderboard sink that drops every submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLeaderboard;

impl Leaderboard for NullLeaderboard {
    fn submit_score(&mut self, _score: u32) {}
    fn submit_combo(&mut self, _combo: u32) {}
}

/// In-memory stats store with a JSON snapshot for host persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    best_score: u32,
    best_combo: u32,
    total_taps: u64,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a snapshot previously produced by [`MemoryStats::to_json`].
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl StatsStore for MemoryStats {
    fn best_score(&self) -> u32 {
        self.best_score
    }

    fn best_combo(&self) -> u32 {
        self.best_combo
    }

    fn total_taps(&self) -> u64 {
        self.total_taps
    }

    fn update_best_score(&mut self, score: u32) -> bool {
        if score > self.best_score {
            log::info!("new best score {score}");
            self.best_score = score;
            true
        } else {
            false
        }
    }

    fn update_best_combo(&mut self, combo: u32) -> bool {
        if combo > self.best_combo {
            log::info!("new best combo {combo}");
            self.best_combo = combo;
            true
        } else {
            false
        }
    }

    fn add_taps(&mut self, delta: i64) {
        if delta > 0 {
            self.total_taps += delta as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_score_only_improves() {
        let mut stats = MemoryStats::new();
        assert!(stats.update_best_score(100));
        assert!(!stats.update_best_score(50));
        assert!(!stats.update_best_score(100));
        assert_eq!(stats.best_score(), 100);
        assert!(stats.update_best_score(150));
        assert_eq!(stats.best_score(), 150);
    }

    #[test]
    fn test_best_combo_only_improves() {
        let mut stats = MemoryStats::new();
        assert!(stats.update_best_combo(8));
        assert!(!stats.update_best_combo(3));
        assert_eq!(stats.best_combo(), 8);
    }

    #[test]
    fn test_tap_counter_ignores_negative_deltas() {
        let mut stats = MemoryStats::new();
        stats.add_taps(5);
        stats.add_taps(-3);
        stats.add_taps(0);
        assert_eq!(stats.total_taps(), 5);
    }

    #[test]
    fn test_json_snapshot_roundtrip() {
        let mut stats = MemoryStats::new();
        stats.update_best_score(1200);
        stats.update_best_combo(14);
        stats.add_taps(77);

        let restored = MemoryStats::from_json(&stats.to_json()).unwrap();
        assert_eq!(restored, stats);
        assert_eq!(MemoryStats::from_json("not json"), None);
    }
}
