//! Output sinks for scan events.
//!
//! The CLI drains the engine's event channel on the main thread and feeds
//! each [`ScanEvent`] to a sink, then hands it a [`ScanSummary`] once the
//! worker has stopped:
//!
//! - [`TextOutput`]: one colored line per duplicate, summary at the end
//! - [`JsonOutput`]: one JSON object per event (JSON Lines), summary last

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;

use std::io;
use std::path::PathBuf;

use serde::Serialize;

use crate::duplicates::ScanStats;
use crate::error::ExitCode;
use crate::observer::ScanEvent;

/// Final outcome of a CLI scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Counters when the worker stopped
    #[serde(flatten)]
    pub stats: ScanStats,
    /// Recoverable errors reported during the scan
    pub errors: u64,
    /// Topmost empty directories, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dirs: Option<Vec<PathBuf>>,
    /// Whether the scan was cut short by Ctrl+C
    pub interrupted: bool,
    /// Exit code number
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl ScanSummary {
    /// Build a summary, choosing the exit code from the outcome.
    #[must_use]
    pub fn new(
        stats: ScanStats,
        errors: u64,
        empty_dirs: Option<Vec<PathBuf>>,
        interrupted: bool,
    ) -> Self {
        let exit_code = ExitCode::from_outcome(&stats, errors, interrupted);
        Self {
            stats,
            errors,
            empty_dirs,
            interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Destination for scan events.
pub trait EventSink {
    /// Handle one event as it arrives.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    fn event(&mut self, event: &ScanEvent) -> io::Result<()>;

    /// Write the closing summary.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    fn finish(&mut self, summary: &ScanSummary) -> io::Result<()>;
}
