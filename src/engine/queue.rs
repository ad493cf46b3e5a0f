//! Work queue shared by the caller and the scan worker.
//!
//! # Overview
//!
//! Two lists sit behind one mutex:
//!
//! - a **LIFO stack of directories**, so a subtree is finished soon after it
//!   is started and its duplicates surface early
//! - a **FIFO list of commands**, which always win over directory work
//!
//! A directory is accepted at most once per session; the set of every
//! directory ever pushed is kept for that check. [`WorkQueue::pop`] waits on a
//! condition variable guarding both lists, so a wake-up either finds a unit
//! under the same lock or goes back to waiting. No separate availability
//! counter exists that could drift out of step with the lists.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use parking_lot::{Condvar, Mutex};

use crate::scanner::Hash;

/// A unit of work for the scan worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List one directory.
    ScanDirectory(PathBuf),
    /// Forget a file (typically deleted by the caller).
    RemoveFile {
        /// File to forget
        path: PathBuf,
        /// Full digest the caller was told about
        hash: Hash,
    },
    /// Mark every duplicate group as unannounced.
    ResetReportedFlags,
    /// Stop the worker.
    Terminate,
}

/// Snapshot of directory bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Directories ever accepted
    pub total_directories: u64,
    /// Directories accepted but not popped yet
    pub directories_pending: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    seen: HashSet<PathBuf>,
    directories: Vec<PathBuf>,
    commands: VecDeque<Command>,
}

/// Thread-safe hybrid LIFO/FIFO queue with blocking pop.
#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl WorkQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a directory unless it was pushed before in this session.
    ///
    /// Returns `true` if the directory was accepted.
    pub fn push_directory(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let mut state = self.state.lock();
        if state.seen.contains(&path) {
            log::trace!("Directory already queued once: {}", path.display());
            return false;
        }
        state.seen.insert(path.clone());
        state.directories.push(path);
        drop(state);
        self.available.notify_one();
        true
    }

    /// Push a control command. Directory commands go through
    /// [`push_directory`](Self::push_directory).
    pub fn push_command(&self, command: Command) {
        match command {
            Command::ScanDirectory(path) => {
                self.push_directory(path);
            }
            command => {
                self.state.lock().commands.push_back(command);
                self.available.notify_one();
            }
        }
    }

    /// Allow `root` to be traversed again.
    ///
    /// Forgets `root` and every descendant that is not currently pending,
    /// then pushes `root`. Returns `true` if `root` was pushed (it is
    /// refused while it is still pending).
    pub fn reseed_directory(&self, root: &Path) -> bool {
        let mut state = self.state.lock();
        if state.directories.iter().any(|d| d == root) {
            return false;
        }
        let QueueState {
            seen, directories, ..
        } = &mut *state;
        seen.retain(|dir| !dir.starts_with(root) || directories.contains(dir));
        seen.insert(root.to_path_buf());
        directories.push(root.to_path_buf());
        drop(state);
        self.available.notify_one();
        true
    }

    /// Remove and return the next unit, blocking while there is none.
    ///
    /// The oldest command comes first; otherwise the most recently pushed
    /// directory.
    pub fn pop(&self) -> Command {
        let mut state = self.state.lock();
        loop {
            if let Some(command) = state.commands.pop_front() {
                return command;
            }
            if let Some(dir) = state.directories.pop() {
                return Command::ScanDirectory(dir);
            }
            self.available.wait(&mut state);
        }
    }

    /// Non-blocking [`pop`](Self::pop).
    pub fn try_pop(&self) -> Option<Command> {
        let mut state = self.state.lock();
        if let Some(command) = state.commands.pop_front() {
            return Some(command);
        }
        state.directories.pop().map(Command::ScanDirectory)
    }

    /// Directory counters for progress reporting.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            total_directories: state.seen.len() as u64,
            directories_pending: state.directories.len() as u64,
        }
    }

    /// Whether neither commands nor directories are waiting.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        let state = self.state.lock();
        state.commands.is_empty() && state.directories.is_empty()
    }

    /// Number of units (commands plus directories) waiting.
    #[must_use]
    pub fn pending_units(&self) -> usize {
        let state = self.state.lock();
        state.commands.len() + state.directories.len()
    }
}
