//! Externally-decided knobs the worker needs at construction time.
//!
//! Not config-file parsing — this is a plain struct of settings, built by
//! whatever upstream layer actually loads configuration.

use std::time::Duration;

/// Default automatic-reopen cooldown, kept as a named constant rather than
/// inlined so tests can shrink it.
pub const DEFAULT_REOPEN_COOLDOWN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Whether `PlayChunk` should call `backend.send_tag` for chunks that
    /// carry a tag. Some backends (e.g. ones with no metadata channel)
    /// leave this off.
    pub tag_delivery_enabled: bool,
    /// Cooldown an external scheduler should wait, via
    /// `FailTimer::cooldown_elapsed`, before attempting a reopen after a
    /// failure. Published for retrieval through
    /// [`crate::handle::OutputHandle::reopen_cooldown`].
    pub reopen_cooldown: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            tag_delivery_enabled: true,
            reopen_cooldown: DEFAULT_REOPEN_COOLDOWN,
        }
    }
}

impl WorkerOptions {
    pub fn new() -> Self {
        Self::default()
    }
}
