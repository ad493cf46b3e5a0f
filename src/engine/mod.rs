//! Scan engine: one background worker fed by a shared queue.
//!
//! [`ScanEngine::start`] spawns the worker thread and hands back a handle.
//! Callers drive it through the cloneable [`ScanController`] from any thread:
//! queue roots, pause and resume, forget deleted files, and finally request
//! termination. All results flow back through the [`ScanObserver`] given at
//! start-up.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::engine::{EngineConfig, ScanEngine};
//! use dupscan::observer::{ChannelObserver, ScanEvent};
//! use std::path::Path;
//!
//! let (observer, events) = ChannelObserver::bounded(1024);
//! let engine = ScanEngine::start(EngineConfig::default(), observer)?;
//! engine.controller().enqueue_root(Path::new("."))?;
//!
//! for event in events {
//!     match event {
//!         ScanEvent::DuplicateFound { path, .. } => println!("{}", path.display()),
//!         ScanEvent::QueueDrained(_) => engine.controller().request_terminate(),
//!         ScanEvent::Terminated(_) => break,
//!         _ => {}
//!     }
//! }
//! let stats = engine.join()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod gate;
pub mod queue;
pub mod worker;

pub use gate::SuspendGate;
pub use queue::{Command, QueueStats, WorkQueue};
pub use worker::WorkerState;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use thiserror::Error;

use crate::duplicates::{HashClassifier, ScanStats};
use crate::empty_dirs::EmptyDirCollector;
use crate::observer::ScanObserver;
use crate::scanner::{ContentSource, Hash, Hasher, MmapSource, ScanError, PREHASH_SIZE};
use worker::ScanWorker;

/// Errors from starting or joining the worker thread.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The operating system refused to create the thread.
    #[error("Failed to spawn scan worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker panicked instead of terminating.
    #[error("Scan worker panicked")]
    WorkerPanicked,

    /// [`ScanEngine::join`] was already called.
    #[error("Scan worker already joined")]
    AlreadyJoined,
}

/// Settings fixed for the lifetime of one engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bytes covered by the short digest
    pub prehash_size: usize,
    /// Count zero-length files but keep them out of duplicate detection
    pub skip_empty_files: bool,
    /// Name given to the worker thread
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prehash_size: PREHASH_SIZE,
            skip_empty_files: true,
            thread_name: "dupscan-worker".to_string(),
        }
    }
}

impl EngineConfig {
    /// Set the short-digest prefix length.
    #[must_use]
    pub fn with_prehash_size(mut self, bytes: usize) -> Self {
        self.prehash_size = bytes;
        self
    }

    /// Choose whether zero-length files take part in duplicate detection.
    #[must_use]
    pub fn with_skip_empty_files(mut self, skip: bool) -> Self {
        self.skip_empty_files = skip;
        self
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// Caller-side handle to a running engine. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct ScanController {
    queue: Arc<WorkQueue>,
    gate: Arc<SuspendGate>,
    empty_dirs: Arc<Mutex<EmptyDirCollector>>,
    state: Arc<Mutex<WorkerState>>,
}

impl ScanController {
    fn new() -> Self {
        Self {
            queue: Arc::new(WorkQueue::new()),
            gate: Arc::new(SuspendGate::new()),
            empty_dirs: Arc::new(Mutex::new(EmptyDirCollector::new())),
            state: Arc::new(Mutex::new(WorkerState::Idle)),
        }
    }

    /// Queue a root directory for traversal.
    ///
    /// The path is made absolute and canonical before queueing. Returns
    /// `Ok(false)` when the directory was already queued in this session.
    ///
    /// # Errors
    ///
    /// Fails if the path does not exist, is not a directory, or is itself a
    /// symbolic link.
    pub fn enqueue_root(&self, path: &Path) -> Result<bool, ScanError> {
        let root = validate_root(path)?;
        let accepted = self.queue.push_directory(root.clone());
        if accepted {
            log::info!("Queued root {}", root.display());
        } else {
            log::debug!("Root already queued: {}", root.display());
        }
        Ok(accepted)
    }

    /// Traverse a root again, including subdirectories seen before.
    ///
    /// Files already known are not re-announced; only changed or new files
    /// can produce new duplicate events. Returns `Ok(false)` while the root
    /// is still waiting in the queue.
    ///
    /// # Errors
    ///
    /// Same as [`enqueue_root`](Self::enqueue_root).
    pub fn rescan_root(&self, path: &Path) -> Result<bool, ScanError> {
        let root = validate_root(path)?;
        // Held across the reseed so the worker cannot record the new listing
        // of `root` before the old records are dropped
        let mut empty_dirs = self.empty_dirs.lock();
        let reseeded = self.queue.reseed_directory(&root);
        if reseeded {
            empty_dirs.forget_subtree(&root);
        }
        Ok(reseeded)
    }

    /// Ask the worker to forget `path`, whose full digest is `hash`.
    pub fn remove_file(&self, path: impl Into<PathBuf>, hash: Hash) {
        self.queue.push_command(Command::RemoveFile {
            path: path.into(),
            hash,
        });
    }

    /// Ask the worker to re-announce every duplicate group on its next match.
    pub fn reset_reported_flags(&self) {
        self.queue.push_command(Command::ResetReportedFlags);
    }

    /// Ask the worker to stop once the current unit is done. Any pause is
    /// lifted so the request can be seen.
    pub fn request_terminate(&self) {
        self.queue.push_command(Command::Terminate);
        self.gate.release();
    }

    /// Pause before the next directory.
    pub fn request_pause(&self) {
        self.gate.request_pause();
    }

    /// Lift a pause.
    pub fn request_resume(&self) {
        self.gate.request_resume();
    }

    /// Whether a pause is in effect.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// Whether the worker is currently sleeping at the pause gate.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.gate.is_holding()
    }

    /// Current directory counters.
    #[must_use]
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// What the worker is doing right now.
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Topmost directories that contain no regular files anywhere beneath
    /// them, among those traversed so far.
    #[must_use]
    pub fn empty_dirs(&self) -> Vec<PathBuf> {
        self.empty_dirs.lock().collect()
    }
}

fn validate_root(path: &Path) -> Result<PathBuf, ScanError> {
    let metadata =
        fs::symlink_metadata(path).map_err(|e| ScanError::from_io(path.to_path_buf(), e))?;

    if metadata.file_type().is_symlink() {
        return Err(ScanError::SymlinkRoot(path.to_path_buf()));
    }
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(path.to_path_buf()));
    }

    fs::canonicalize(path).map_err(|e| ScanError::from_io(path.to_path_buf(), e))
}

/// A running engine. Dropping it terminates and joins the worker.
#[derive(Debug)]
pub struct ScanEngine {
    controller: ScanController,
    handle: Option<JoinHandle<ScanStats>>,
}

impl ScanEngine {
    /// Spawn a worker that reads files through memory maps.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the thread cannot be created.
    pub fn start(
        config: EngineConfig,
        observer: impl ScanObserver + 'static,
    ) -> Result<Self, EngineError> {
        Self::start_with_source(config, observer, MmapSource)
    }

    /// Spawn a worker that reads files through `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the thread cannot be created.
    pub fn start_with_source<S>(
        config: EngineConfig,
        observer: impl ScanObserver + 'static,
        source: S,
    ) -> Result<Self, EngineError>
    where
        S: ContentSource + Send + 'static,
    {
        let controller = ScanController::new();
        let classifier = HashClassifier::new(Hasher::new().with_prehash_size(config.prehash_size))
            .with_skip_empty_files(config.skip_empty_files);

        let worker = ScanWorker::new(
            Arc::clone(&controller.queue),
            Arc::clone(&controller.gate),
            Arc::clone(&controller.empty_dirs),
            Arc::clone(&controller.state),
            classifier,
            source,
            Box::new(observer),
        );

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(EngineError::Spawn)?;

        log::debug!(
            "Started {} (prehash {} bytes)",
            config.thread_name,
            config.prehash_size
        );

        Ok(Self {
            controller,
            handle: Some(handle),
        })
    }

    /// Handle for driving the worker.
    #[must_use]
    pub fn controller(&self) -> &ScanController {
        &self.controller
    }

    /// Wait for the worker to exit and return its final counters.
    ///
    /// Blocks until a terminate request has been processed; call
    /// [`ScanController::request_terminate`] first, or use
    /// [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerPanicked`] if the worker panicked.
    pub fn join(mut self) -> Result<ScanStats, EngineError> {
        self.wait()
    }

    /// Request termination and wait for the worker.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub fn shutdown(self) -> Result<ScanStats, EngineError> {
        self.controller.request_terminate();
        self.join()
    }

    fn wait(&mut self) -> Result<ScanStats, EngineError> {
        let handle = self.handle.take().ok_or(EngineError::AlreadyJoined)?;
        handle.join().map_err(|_| EngineError::WorkerPanicked)
    }
}

impl Drop for ScanEngine {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.controller.request_terminate();
            if let Err(e) = self.wait() {
                log::error!("{}", e);
            }
        }
    }
}
