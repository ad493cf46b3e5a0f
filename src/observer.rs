//! Scan events and the observers that receive them.
//!
//! The worker thread reports through a [`ScanObserver`] registered when the
//! engine starts. Every callback runs on the worker thread, in order, and the
//! worker does not continue until it returns; in particular
//! [`on_directory_entered`](ScanObserver::on_directory_entered) is always
//! delivered before any event about a file in that directory.
//!
//! [`ChannelObserver`] forwards each callback as a [`ScanEvent`] over a
//! bounded crossbeam channel, for front ends that want to consume events on
//! their own thread.

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

use crate::duplicates::ScanStats;
use crate::scanner::{hash_to_hex, Hash};

/// Default capacity of the [`ChannelObserver`] channel.
///
/// A full channel blocks the worker until the consumer catches up, which
/// bounds memory rather than letting events pile up.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// Receives engine events on the worker thread.
pub trait ScanObserver: Send {
    /// A directory is about to be listed.
    fn on_directory_entered(&self, path: &Path);

    /// `path` belongs to a confirmed duplicate group with full digest `hash`.
    fn on_duplicate_found(&self, path: &Path, hash: &Hash);

    /// Counters after an entry (or a whole directory) was processed.
    fn on_progress(&self, stats: &ScanStats);

    /// A recoverable I/O failure.
    fn on_error(&self, message: &str);

    /// The queue ran empty after the last unit of work.
    fn on_queue_drained(&self, _stats: &ScanStats) {}

    /// The worker processed a terminate command and is exiting.
    fn on_terminated(&self, _stats: &ScanStats) {}
}

/// An observer callback captured as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// See [`ScanObserver::on_directory_entered`].
    DirectoryEntered {
        /// Directory being listed
        path: PathBuf,
    },
    /// See [`ScanObserver::on_duplicate_found`].
    DuplicateFound {
        /// Duplicate file
        path: PathBuf,
        /// Full digest as lowercase hex
        hash: String,
    },
    /// See [`ScanObserver::on_progress`].
    Progress(ScanStats),
    /// See [`ScanObserver::on_error`].
    Error {
        /// Human-readable description
        message: String,
    },
    /// See [`ScanObserver::on_queue_drained`].
    QueueDrained(ScanStats),
    /// See [`ScanObserver::on_terminated`].
    Terminated(ScanStats),
}

/// Forwards events over a crossbeam channel.
///
/// # Example
///
/// ```
/// use dupscan::observer::{ChannelObserver, ScanEvent, ScanObserver};
/// use std::path::Path;
///
/// let (observer, events) = ChannelObserver::bounded(16);
/// observer.on_error("disk on fire");
///
/// assert_eq!(
///     events.recv().unwrap(),
///     ScanEvent::Error { message: "disk on fire".to_string() }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<ScanEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<ScanEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    fn send(&self, event: ScanEvent) {
        // A dropped receiver means nobody is listening any more; the scan
        // itself carries on.
        if self.tx.send(event).is_err() {
            log::trace!("Event receiver dropped, discarding event");
        }
    }
}

impl ScanObserver for ChannelObserver {
    fn on_directory_entered(&self, path: &Path) {
        self.send(ScanEvent::DirectoryEntered {
            path: path.to_path_buf(),
        });
    }

    fn on_duplicate_found(&self, path: &Path, hash: &Hash) {
        self.send(ScanEvent::DuplicateFound {
            path: path.to_path_buf(),
            hash: hash_to_hex(hash),
        });
    }

    fn on_progress(&self, stats: &ScanStats) {
        self.send(ScanEvent::Progress(*stats));
    }

    fn on_error(&self, message: &str) {
        self.send(ScanEvent::Error {
            message: message.to_string(),
        });
    }

    fn on_queue_drained(&self, stats: &ScanStats) {
        self.send(ScanEvent::QueueDrained(*stats));
    }

    fn on_terminated(&self, stats: &ScanStats) {
        self.send(ScanEvent::Terminated(*stats));
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ScanObserver for NullObserver {
    fn on_directory_entered(&self, _path: &Path) {}
    fn on_duplicate_found(&self, _path: &Path, _hash: &Hash) {}
    fn on_progress(&self, _stats: &ScanStats) {}
    fn on_error(&self, _message: &str) {}
}
