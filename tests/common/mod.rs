//! Hand-rolled mock collaborators for the scenario tests in
//! `tests/scenarios.rs`, with no mocking-framework dependency.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use outworker::backend::BackendPort;
use outworker::chunk::Tag;
use outworker::error::BackendError;
use outworker::format::AudioFormat;
use outworker::observer::PlaybackObserver;

#[derive(Default)]
pub struct MockBackendState {
    pub enable_calls: u32,
    pub open_calls: u32,
    pub close_calls: u32,
    pub drain_calls: u32,
    pub cancel_calls: u32,
    pub pause_calls: u32,
    pub send_tag_calls: u32,
    pub play_calls: Vec<Vec<u8>>,
    pub enable_should_fail: bool,
    pub pause_should_fail: bool,
    /// Per-call overrides for what `play()` returns; `None` falls back to
    /// "accept the whole buffer". `Some(0)` simulates an unrecoverable
    /// device failure (property 12).
    pub play_returns: VecDeque<Option<usize>>,
    pub delay: Duration,
}

/// Cheap `Clone`-able handle over the shared mock state, so a test can
/// hand one half to the worker (as a `Box<dyn BackendPort>`) and keep the
/// other half to make assertions after the run.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<Mutex<MockBackendState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_played_bytes(&self) -> usize {
        self.state.lock().unwrap().play_calls.iter().map(Vec::len).sum()
    }

    pub fn play_call_count(&self) -> usize {
        self.state.lock().unwrap().play_calls.len()
    }

    pub fn set_play_returns(&self, returns: impl IntoIterator<Item = Option<usize>>) {
        self.state.lock().unwrap().play_returns = returns.into_iter().collect();
    }

    pub fn set_enable_should_fail(&self, fail: bool) {
        self.state.lock().unwrap().enable_should_fail = fail;
    }

    pub fn set_pause_should_fail(&self, fail: bool) {
        self.state.lock().unwrap().pause_should_fail = fail;
    }

    pub fn close_call_count(&self) -> u32 {
        self.state.lock().unwrap().close_calls
    }

    pub fn cancel_call_count(&self) -> u32 {
        self.state.lock().unwrap().cancel_calls
    }

    pub fn drain_call_count(&self) -> u32 {
        self.state.lock().unwrap().drain_calls
    }

    pub fn pause_call_count(&self) -> u32 {
        self.state.lock().unwrap().pause_calls
    }
}

impl BackendPort for MockBackend {
    fn enable(&mut self) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.enable_calls += 1;
        if state.enable_should_fail {
            Err(BackendError::new("mock enable failure"))
        } else {
            Ok(())
        }
    }

    fn disable(&mut self) {}

    fn open(&mut self, _format: &AudioFormat) -> Result<(), BackendError> {
        self.state.lock().unwrap().open_calls += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().unwrap().close_calls += 1;
    }

    fn play(&mut self, data: &[u8]) -> usize {
        let mut state = self.state.lock().unwrap();
        state.play_calls.push(data.to_vec());
        match state.play_returns.pop_front() {
            Some(Some(n)) => n,
            Some(None) | None => data.len(),
        }
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.pause_calls += 1;
        if state.pause_should_fail {
            Err(BackendError::new("mock pause failure"))
        } else {
            Ok(())
        }
    }

    fn drain(&mut self) {
        self.state.lock().unwrap().drain_calls += 1;
    }

    fn cancel(&mut self) {
        self.state.lock().unwrap().cancel_calls += 1;
    }

    fn delay(&mut self) -> Duration {
        self.state.lock().unwrap().delay
    }

    fn send_tag(&mut self, _tag: &Tag) {
        self.state.lock().unwrap().send_tag_calls += 1;
    }
}

/// A channel-backed [`PlaybackObserver`], so a test can block until the
/// worker signals that a chunk stream finished instead of polling.
pub struct ChannelObserver {
    sender: std::sync::mpsc::Sender<()>,
}

impl ChannelObserver {
    pub fn new() -> (Self, std::sync::mpsc::Receiver<()>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl PlaybackObserver for ChannelObserver {
    fn chunk_finished(&self) {
        let _ = self.sender.send(());
    }
}

pub fn wait_for_signal(receiver: &std::sync::mpsc::Receiver<()>, timeout: Duration) {
    receiver
        .recv_timeout(timeout)
        .expect("expected a chunk-finished signal before the timeout");
}

pub fn stereo_s16() -> AudioFormat {
    AudioFormat::new(44_100, outworker::format::SampleFormat::S16, 2)
}
