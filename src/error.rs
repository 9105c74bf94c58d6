//! Hand-rolled error types, one per failing component: plain enums with a
//! `Display` impl and `std::error::Error`, no `thiserror`/`anyhow` macro
//! dependency.

use std::fmt;

/// Failure reported by a [`crate::backend::BackendPort`] operation.
#[derive(Debug)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend error: {}", self.0)
    }
}

impl std::error::Error for BackendError {}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure reported by a [`crate::filter::FilterPort`] operation.
#[derive(Debug)]
pub struct FilterError(pub String);

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "filter error: {}", self.0)
    }
}

impl std::error::Error for FilterError {}

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One of the named failure kinds the worker's state machine recognizes.
/// Never propagated out of the dispatch loop: it is logged and converted
/// into a state transition at the point of failure, and optionally
/// published into `OutputState::last_error` for inspection.
#[derive(Debug)]
pub enum WorkerError {
    EnableFailed(BackendError),
    FilterOpenFailed(FilterError),
    BackendOpenFailed(BackendError),
    ConvertConfigFailed(FilterError),
    PlayFailed,
    PauseFailed(BackendError),
    FilterPcmFailed(FilterError),
    CrossFadeFormatUnsupported,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::EnableFailed(err) => write!(f, "enable failed: {}", err),
            WorkerError::FilterOpenFailed(err) => write!(f, "filter open failed: {}", err),
            WorkerError::BackendOpenFailed(err) => write!(f, "backend open failed: {}", err),
            WorkerError::ConvertConfigFailed(err) => {
                write!(f, "convert filter configuration failed: {}", err)
            }
            WorkerError::PlayFailed => write!(f, "backend reported a play failure (0 bytes written)"),
            WorkerError::PauseFailed(err) => write!(f, "pause failed: {}", err),
            WorkerError::FilterPcmFailed(err) => write!(f, "filter_pcm failed: {}", err),
            WorkerError::CrossFadeFormatUnsupported => {
                write!(f, "cross-fade requested on an unsupported sample format")
            }
        }
    }
}

impl std::error::Error for WorkerError {}
