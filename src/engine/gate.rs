//! Pause/resume gate the worker passes before every directory.
//!
//! The gate is a boolean behind a mutex plus a condition variable. Pausing
//! closes it; the worker finishes the directory it is on and then sleeps in
//! [`SuspendGate::pass`] until the gate reopens. Commands that arrive while
//! the worker holds a popped directory at the gate wait until it moves on.
//!
//! All methods may be called from any thread.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    paused: bool,
    released: bool,
    holding: bool,
}

/// Binary gate, open by default.
#[derive(Debug, Default)]
pub struct SuspendGate {
    state: Mutex<GateState>,
    reopened: Condvar,
}

impl SuspendGate {
    /// Create an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate. Takes effect the next time the worker reaches it.
    pub fn request_pause(&self) {
        let mut state = self.state.lock();
        if state.released {
            log::debug!("Pause ignored, gate released for shutdown");
            return;
        }
        state.paused = true;
        log::debug!("Scan pause requested");
    }

    /// Reopen the gate and wake the worker if it is waiting.
    pub fn request_resume(&self) {
        self.state.lock().paused = false;
        self.reopened.notify_all();
        log::debug!("Scan resume requested");
    }

    /// Open the gate for good, ignoring later pauses. Used on shutdown so a
    /// paused worker can reach its terminate command.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.released = true;
        state.paused = false;
        drop(state);
        self.reopened.notify_all();
    }

    /// Whether a pause is in effect.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Whether the worker is currently blocked at the gate.
    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.state.lock().holding
    }

    /// Block while the gate is closed. Returns `true` if the caller waited.
    pub fn pass(&self) -> bool {
        let mut state = self.state.lock();
        if !state.paused {
            return false;
        }
        log::debug!("Worker suspended");
        state.holding = true;
        while state.paused {
            self.reopened.wait(&mut state);
        }
        state.holding = false;
        log::debug!("Worker resumed");
        true
    }
}
