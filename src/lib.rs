//! # outworker
//!
//! A per-output audio worker: the single-threaded state machine that owns
//! one audio output device, pulls PCM chunks from an upstream pipe, runs
//! them through a filter chain (replay-gain normalization, cross-fading
//! between songs), and pushes the result to a backend device plugin in
//! real time.
//!
//! The worker itself (`worker`) is the bulk of this crate; everything else
//! is the data model and collaborator interfaces it is built on.

pub mod backend;
pub mod chunk;
pub mod cross_fade;
pub mod error;
pub mod fail_timer;
pub mod filter;
pub mod format;
pub mod handle;
pub mod mailbox;
pub mod observer;
pub mod options;
pub mod pipe;
pub mod worker;

pub use chunk::{MusicChunk, ReplayGainInfo, Tag};
pub use error::{BackendError, FilterError, WorkerError};
pub use format::{AudioFormat, SampleFormat};
pub use handle::OutputHandle;
pub use mailbox::Command;
pub use options::WorkerOptions;
pub use worker::OutputWorker;
