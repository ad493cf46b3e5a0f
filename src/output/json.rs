//! JSON Lines output.
//!
//! Every event becomes one compact JSON object tagged with `event`:
//!
//! ```json
//! {"event":"directory_entered","path":"/data/photos"}
//! {"event":"duplicate_found","path":"/data/photos/a.jpg","hash":"af13..."}
//! {"event":"summary","total_files":812,"total_duplicates":6,...}
//! ```
//!
//! Progress events are dropped unless requested, since one is emitted per
//! directory entry.

use std::io::{self, Write};

use serde::Serialize;

use super::{EventSink, ScanSummary};
use crate::observer::ScanEvent;

#[derive(Serialize)]
#[serde(tag = "event", rename = "summary")]
struct SummaryLine<'a> {
    #[serde(flatten)]
    summary: &'a ScanSummary,
}

/// Writes scan events as JSON Lines.
#[derive(Debug)]
pub struct JsonOutput<W: Write> {
    writer: W,
    include_progress: bool,
}

impl<W: Write> JsonOutput<W> {
    /// Create a writer that skips progress events.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            include_progress: false,
        }
    }

    /// Also emit progress events.
    #[must_use]
    pub fn with_progress(mut self, include: bool) -> Self {
        self.include_progress = include;
        self
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> EventSink for JsonOutput<W> {
    fn event(&mut self, event: &ScanEvent) -> io::Result<()> {
        if matches!(event, ScanEvent::Progress(_)) && !self.include_progress {
            return Ok(());
        }
        self.write_line(event)
    }

    fn finish(&mut self, summary: &ScanSummary) -> io::Result<()> {
        self.write_line(&SummaryLine { summary })?;
        self.writer.flush()
    }
}
