//! Liveness guard for the worker thread.
//!
//! An `AtomicBool` set true on construction and false on `Drop`, so the
//! flag reads "alive" for exactly the worker thread's lifetime, including
//! on panic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(super) struct WorkerAliveGuard {
    alive: Arc<AtomicBool>,
}

impl WorkerAliveGuard {
    pub(super) fn new(alive: Arc<AtomicBool>) -> Self {
        alive.store(true, Ordering::Relaxed);
        Self { alive }
    }
}

impl Drop for WorkerAliveGuard {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
    }
}
