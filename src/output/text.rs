//! Human-readable output.
//!
//! Duplicates are printed as they are confirmed, grouped visually by a
//! short digest prefix:
//!
//! ```text
//! [af13c2d9] /data/photos/a.jpg
//! [af13c2d9] /backup/photos/a.jpg
//! ```
//!
//! Entries that could not be read are listed inline as they happen, so
//! they stay visible when logging is quieted:
//!
//! ```text
//! [error] Permission denied: /data/private
//! ```
//!
//! Coloring follows yansi's global switch.

use std::io::{self, Write};

use yansi::Paint;

use super::{EventSink, ScanSummary};
use crate::observer::ScanEvent;

const HASH_PREFIX_LEN: usize = 8;

/// Writes duplicates and a closing summary as plain text.
#[derive(Debug)]
pub struct TextOutput<W: Write> {
    writer: W,
}

impl<W: Write> TextOutput<W> {
    /// Create a text sink over `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for TextOutput<W> {
    fn event(&mut self, event: &ScanEvent) -> io::Result<()> {
        match event {
            ScanEvent::DuplicateFound { path, hash } => {
                let prefix = hash.get(..HASH_PREFIX_LEN).unwrap_or(hash);
                writeln!(
                    self.writer,
                    "{} {}",
                    format!("[{prefix}]").dim(),
                    path.display()
                )?;
            }
            ScanEvent::Error { message } => {
                writeln!(self.writer, "{} {}", "[error]".red(), message)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary) -> io::Result<()> {
        let stats = &summary.stats;

        if let Some(empty_dirs) = &summary.empty_dirs {
            if !empty_dirs.is_empty() {
                writeln!(self.writer)?;
                writeln!(self.writer, "{}", "Empty directories:".bold())?;
                for dir in empty_dirs {
                    writeln!(self.writer, "  {}", dir.display())?;
                }
            }
        }

        writeln!(self.writer)?;
        let headline = if summary.interrupted {
            "Scan interrupted".yellow().bold()
        } else {
            "Scan complete".green().bold()
        };
        writeln!(
            self.writer,
            "{}: {} files in {} directories",
            headline, stats.total_files, stats.total_directories
        )?;
        writeln!(
            self.writer,
            "  {} duplicates, {} false matches",
            stats.total_duplicates.cyan(),
            stats.total_false_duplicates
        )?;
        if summary.errors > 0 {
            writeln!(
                self.writer,
                "  {} entries could not be read",
                summary.errors.red()
            )?;
        }
        self.writer.flush()
    }
}
