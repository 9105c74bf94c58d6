//! The controller-facing "a chunk stream finished" notification, kept
//! distinct from the mailbox's own command-ack condvar: this fires once
//! per `Play()` call that returns `true`, not once per command.

/// Injected sink for chunk-stream completion, passed in by the embedder
/// rather than reached through a process-global.
pub trait PlaybackObserver: Send {
    fn chunk_finished(&self);
}

impl<F> PlaybackObserver for F
where
    F: Fn() + Send,
{
    fn chunk_finished(&self) {
        (self)()
    }
}
