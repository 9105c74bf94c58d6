//! The upstream pipe of PCM chunks: a lazy producer of immutable chunks in
//! play order, read-only to the worker.

use std::sync::{Arc, Mutex};

use crate::chunk::MusicChunk;

/// Non-destructive lookahead into the upstream chunk producer.
///
/// `peek` must not consume or advance anything on its own; the worker
/// advances through a chunk's own `next` link, not by calling `peek`
/// again. Repeated calls with no intervening upstream activity return the
/// same chunk.
///
/// `Sync` as well as `Send`: `OutputState` holds this behind `Arc<dyn
/// Pipe>`, and `Arc<T>` is only `Send` when `T: Send + Sync`.
pub trait Pipe: Send + Sync {
    fn peek(&self) -> Option<Arc<MusicChunk>>;
}

/// A trivial concrete [`Pipe`] backed by a single externally-set head
/// chunk. Useful for manual exercising and as a test fixture; a real
/// embedder's upstream pipe is a ring buffer fed by the decoder, which
/// this crate does not implement.
#[derive(Default)]
pub struct QueuePipe {
    head: Mutex<Option<Arc<MusicChunk>>>,
}

impl QueuePipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head(chunk: Arc<MusicChunk>) -> Self {
        Self { head: Mutex::new(Some(chunk)) }
    }

    /// Replace the head chunk the next `peek()` will return.
    pub fn set_head(&self, chunk: Option<Arc<MusicChunk>>) {
        *self.head.lock().unwrap() = chunk;
    }
}

impl Pipe for QueuePipe {
    fn peek(&self) -> Option<Arc<MusicChunk>> {
        self.head.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_pipe_peek_is_non_destructive() {
        let pipe = QueuePipe::with_head(Arc::new(MusicChunk::new(vec![0; 4])));
        assert!(pipe.peek().is_some());
        assert!(pipe.peek().is_some());
    }

    #[test]
    fn empty_queue_pipe_peeks_none() {
        let pipe = QueuePipe::new();
        assert!(pipe.peek().is_none());
    }
}
