//! The scan worker: one thread that drains the work queue.
//!
//! The worker owns the [`HashClassifier`] outright, so hash stores are never
//! locked. It moves between four states:
//!
//! - **Idle**: blocked in [`WorkQueue::pop`]
//! - **Scanning**: listing one directory (after passing the suspend gate)
//! - **ApplyingCommand**: running a remove-file or reset command
//! - **Terminated**: exited after a terminate command
//!
//! A directory is always listed to the end before the next unit is popped,
//! so commands never interleave with a half-processed directory.

use std::fs::{self, DirEntry};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::gate::SuspendGate;
use super::queue::{Command, WorkQueue};
use crate::duplicates::{HashClassifier, ScanStats};
use crate::empty_dirs::EmptyDirCollector;
use crate::observer::ScanObserver;
use crate::scanner::{ContentSource, ScanError};

/// What the worker is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    /// Waiting for work.
    #[default]
    Idle,
    /// Listing a directory (or waiting at the suspend gate to do so).
    Scanning,
    /// Mutating hash stores for a control command.
    ApplyingCommand,
    /// Exited.
    Terminated,
}

pub(crate) struct ScanWorker<S> {
    queue: Arc<WorkQueue>,
    gate: Arc<SuspendGate>,
    empty_dirs: Arc<Mutex<EmptyDirCollector>>,
    state: Arc<Mutex<WorkerState>>,
    classifier: HashClassifier,
    source: S,
    observer: Box<dyn ScanObserver>,
}

impl<S: ContentSource> ScanWorker<S> {
    pub(crate) fn new(
        queue: Arc<WorkQueue>,
        gate: Arc<SuspendGate>,
        empty_dirs: Arc<Mutex<EmptyDirCollector>>,
        state: Arc<Mutex<WorkerState>>,
        classifier: HashClassifier,
        source: S,
        observer: Box<dyn ScanObserver>,
    ) -> Self {
        Self {
            queue,
            gate,
            empty_dirs,
            state,
            classifier,
            source,
            observer,
        }
    }

    /// Process units until a terminate command arrives. Returns the final
    /// counters.
    pub(crate) fn run(mut self) -> ScanStats {
        log::debug!("Scan worker started");
        loop {
            self.set_state(WorkerState::Idle);

            match self.queue.pop() {
                Command::ScanDirectory(dir) => {
                    self.set_state(WorkerState::Scanning);
                    self.gate.pass();
                    self.scan_directory(&dir);
                }
                Command::RemoveFile { path, hash } => {
                    self.set_state(WorkerState::ApplyingCommand);
                    if self.classifier.remove_file(&path, &hash) {
                        log::debug!("Forgot file {}", path.display());
                    }
                }
                Command::ResetReportedFlags => {
                    self.set_state(WorkerState::ApplyingCommand);
                    let reset = self.classifier.reset_reported_flags();
                    log::debug!("Reset reported flag on {} group(s)", reset);
                }
                Command::Terminate => {
                    self.set_state(WorkerState::Terminated);
                    let stats = self.stats();
                    log::info!(
                        "Scan worker terminated: {} files, {} duplicates, {} directories",
                        stats.total_files,
                        stats.total_duplicates,
                        stats.total_directories
                    );
                    self.observer.on_terminated(&stats);
                    return stats;
                }
            }

            if self.queue.is_drained() {
                self.observer.on_queue_drained(&self.stats());
            }
        }
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock() = state;
    }

    fn stats(&self) -> ScanStats {
        let queue = self.queue.stats();
        ScanStats {
            total_directories: queue.total_directories,
            directories_pending: queue.directories_pending,
            ..self.classifier.stats()
        }
    }

    fn report_progress(&self) {
        self.observer.on_progress(&self.stats());
    }

    fn report_error(&self, message: &str) {
        log::warn!("{}", message);
        self.observer.on_error(message);
    }

    fn scan_directory(&mut self, dir: &Path) {
        log::debug!("Scanning directory {}", dir.display());
        self.observer.on_directory_entered(dir);

        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                let err = ScanError::from_io(dir.to_path_buf(), e);
                self.report_error(&err.to_string());
                self.report_progress();
                return;
            }
        };

        let mut entries: Vec<DirEntry> = Vec::new();
        for entry in read_dir {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    let err = ScanError::from_io(dir.to_path_buf(), e);
                    self.report_error(&err.to_string());
                }
            }
        }
        entries.sort_by_key(DirEntry::file_name);

        let mut has_files = false;
        let mut subdirs = Vec::new();

        for entry in entries {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    let err = ScanError::from_io(path, e);
                    self.report_error(&err.to_string());
                    continue;
                }
            };

            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", path.display());
                continue;
            }

            if file_type.is_file() {
                has_files = true;
                self.classify_file(&path);
            } else if file_type.is_dir() {
                self.queue.push_directory(path);
                subdirs.push(entry.file_name());
            } else {
                continue;
            }

            self.report_progress();
        }

        let mut empty_dirs = self.empty_dirs.lock();
        if has_files {
            empty_dirs.forget(dir);
        } else {
            empty_dirs.record(dir.to_path_buf(), subdirs);
        }
        drop(empty_dirs);
        self.report_progress();
    }

    fn classify_file(&mut self, path: &Path) {
        let outcome = self.classifier.classify(path, &self.source);

        for error in &outcome.errors {
            self.report_error(&error.to_string());
        }
        for announcement in &outcome.announcements {
            log::debug!("Duplicate: {}", announcement.path.display());
            self.observer
                .on_duplicate_found(&announcement.path, &announcement.hash);
        }
    }
}
