//! Signal handling for graceful shutdown.
//!
//! Ctrl+C sets a shared flag and runs every registered shutdown hook. The
//! CLI registers a hook that asks the scan engine to terminate, so the
//! worker finishes its current directory and exits cleanly.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupscan::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! handler.on_shutdown(|| eprintln!("stopping"));
//!
//! if handler.is_shutdown_requested() {
//!     return;
//! }
//! ```
//!
//! When a signal is received the application exits with code 130
//! (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

type ShutdownHook = Box<dyn Fn() + Send + Sync>;

/// Shared shutdown state: a flag plus the hooks to run when it is raised.
#[derive(Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    hooks: Arc<Mutex<Vec<ShutdownHook>>>,
}

impl std::fmt::Debug for ShutdownHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandler")
            .field("requested", &self.is_shutdown_requested())
            .field("hooks", &self.hooks.lock().len())
            .finish()
    }
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested and no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag and run every registered hook, once.
    pub fn request_shutdown(&self) {
        // The flag flips under the hooks lock so a concurrent registration
        // either lands in the list or sees the flag
        let hooks = self.hooks.lock();
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        for hook in hooks.iter() {
            hook();
        }
    }

    /// Register a hook. If shutdown was already requested it runs at once.
    ///
    /// Hooks must not register further hooks.
    pub fn on_shutdown(&self, hook: impl Fn() + Send + Sync + 'static) {
        let mut hooks = self.hooks.lock();
        if self.is_shutdown_requested() {
            drop(hooks);
            hook();
            return;
        }
        hooks.push(Box::new(hook));
    }

    /// Lower the flag and drop all hooks.
    pub fn reset(&self) {
        self.hooks.lock().clear();
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse it.
///
/// The handler can only be registered once per process; later calls reset
/// and return the same instance, so repeated `run_app` calls (as in tests)
/// start from a clean state.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if another Ctrl+C handler was
/// registered outside this module.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
    let hooked = handler.clone();

    ctrlc::set_handler(move || {
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
        hooked.request_shutdown();
    })
    .or_else(|e| match e {
        // A racing caller won the OnceLock and registered first
        ctrlc::Error::MultipleHandlers => Ok(()),
        e => Err(e),
    })?;

    Ok(handler)
}
