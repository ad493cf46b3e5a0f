//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Short-digest bucketing of every discovered file (tier 1)
//! - Full-content promotion of short-digest collisions (tier 2)
//! - Duplicate group bookkeeping and announcement
//! - Running scan counters

pub mod classifier;

use serde::Serialize;

pub use classifier::{
    Announcement, DuplicateOutcome, FullHashEntry, HashClassifier, Verdict,
};

/// Running counters for a scan session.
///
/// All counters only grow, except `directories_pending`, which shrinks as
/// the queue drains and grows as subdirectories are discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Regular files opened and counted
    pub total_files: u64,
    /// Paths announced as members of a confirmed duplicate group
    pub total_duplicates: u64,
    /// Short-digest collisions that full hashing did not confirm
    pub total_false_duplicates: u64,
    /// Directories ever enqueued
    pub total_directories: u64,
    /// Directories waiting to be listed
    pub directories_pending: u64,
}

impl ScanStats {
    /// Directories already listed (or currently being listed).
    #[must_use]
    pub fn directories_done(&self) -> u64 {
        self.total_directories
            .saturating_sub(self.directories_pending)
    }
}
