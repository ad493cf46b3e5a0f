//! Terminal progress display using indicatif.
//!
//! The bar tracks directories: its length is every directory queued so far
//! and its position the ones already listed. Both grow as the scan
//! discovers subdirectories, so the bar can move backwards in percentage
//! terms; that is expected for an incremental scan.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::duplicates::ScanStats;

/// Progress bar fed from scan events on the front-end thread.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a reporter drawing to stderr, or a hidden one when disabled.
    #[must_use]
    pub fn new(enabled: bool, tick_ms: u64) -> Self {
        if !enabled {
            return Self::hidden();
        }

        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.set_style(Self::style());
        bar.enable_steady_tick(Duration::from_millis(tick_ms.max(10)));
        Self { bar }
    }

    /// A reporter that tracks counters but never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} dirs {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// Whether the bar is drawn.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    /// Reflect the latest counters.
    pub fn update(&self, stats: &ScanStats) {
        self.bar.set_length(stats.total_directories);
        self.bar.set_position(stats.directories_done());
        self.bar.set_message(Self::summary(stats));
    }

    /// Run `f` (which prints to the terminal) with the bar cleared.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.bar.suspend(f)
    }

    /// Clear the bar from the terminal.
    pub fn finish(&self, stats: &ScanStats) {
        self.update(stats);
        self.bar.finish_and_clear();
    }

    /// Counter text shown after the bar.
    #[must_use]
    pub fn summary(stats: &ScanStats) -> String {
        format!(
            "{} files, {} duplicates, {} false matches",
            stats.total_files, stats.total_duplicates, stats.total_false_duplicates
        )
    }

    /// Current `(position, length)` of the bar.
    #[must_use]
    pub fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}
