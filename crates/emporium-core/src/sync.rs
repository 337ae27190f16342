//! # Sync Status Types
//!
//! The record the sync engine publishes after every pass. Pure data: the
//! engine in `emporium-sync` is the only writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Scheduler state of a sync engine.
///
/// ```text
///            start()                 stop()
///   Idle ──────────────► Running ──────────────► Stopped
///                           ▲                       │
///                           └───────── start() ─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Counts of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncCounts {
    /// Records copied local → remote.
    pub pushed: u64,
    /// Records copied remote → local.
    pub pulled: u64,
    /// Records present on both sides with differing content.
    pub conflicts: u64,
}

impl SyncCounts {
    pub fn total_changes(&self) -> u64 {
        self.pushed + self.pulled
    }
}

impl AddAssign for SyncCounts {
    fn add_assign(&mut self, other: Self) {
        self.pushed += other.pushed;
        self.pulled += other.pulled;
        self.conflicts += other.conflicts;
    }
}

/// Snapshot of the sync engine as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncRecord {
    pub state: SyncState,
    /// A pass is executing right now.
    pub pass_in_progress: bool,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    /// Message of the first error of the most recent failed pass.
    /// Cleared by the next successful pass.
    pub last_error: Option<String>,
    /// Counts of the most recent successful pass.
    pub last_counts: Option<SyncCounts>,
    /// Passes executed since process start, successful or not.
    pub passes: u64,
}

impl SyncRecord {
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == SyncState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut total = SyncCounts::default();
        total += SyncCounts {
            pushed: 2,
            pulled: 1,
            conflicts: 1,
        };
        total += SyncCounts {
            pushed: 0,
            pulled: 3,
            conflicts: 0,
        };
        assert_eq!(
            total,
            SyncCounts {
                pushed: 2,
                pulled: 4,
                conflicts: 1
            }
        );
        assert_eq!(total.total_changes(), 6);
    }

    #[test]
    fn test_new_record_is_idle() {
        let record = SyncRecord::default();
        assert_eq!(record.state, SyncState::Idle);
        assert!(!record.is_running());
        assert_eq!(record.passes, 0);
    }
}
