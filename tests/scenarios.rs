//! Scenario-level integration tests covering plain playback, mid-play
//! cancellation, an unrecoverable play failure, the pause loop, and reopen
//! with an undefined config mask, run against a real worker thread and the
//! hand-rolled mocks in `tests/common`.

mod common;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use outworker::chunk::MusicChunk;
use outworker::filter::FilterChain;
use outworker::handle::OutputHandle;
use outworker::mailbox::{Command, CommandMailbox};
use outworker::options::WorkerOptions;
use outworker::pipe::QueuePipe;
use outworker::worker::state::OutputState;
use outworker::worker::OutputWorker;

use common::{stereo_s16, ChannelObserver, MockBackend};

/// Wire up a handle, a worker thread backed by `backend`, and a
/// chunk-finished channel, ready for a test to drive.
fn spawn_worker(backend: MockBackend) -> (OutputHandle, std::sync::mpsc::Receiver<()>, JoinHandle<()>) {
    let state = OutputState::new(FilterChain::new());
    let mailbox = Arc::new(CommandMailbox::new(state));
    let handle = OutputHandle::new(mailbox.clone());

    let (observer, receiver) = ChannelObserver::new();
    let worker = OutputWorker::new(mailbox, Box::new(backend), WorkerOptions::new(), "test-output", "mock")
        .with_observer(Box::new(observer));
    let join = worker.spawn();

    (handle, receiver, join)
}

fn s16_chunk(values: &[i16], next: Option<Arc<MusicChunk>>) -> Arc<MusicChunk> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut chunk = MusicChunk::new(data);
    chunk.next = next;
    Arc::new(chunk)
}

#[test]
fn plain_playback_delivers_every_chunk_then_idles() {
    let backend = MockBackend::new();
    let (handle, receiver, join) = spawn_worker(backend.clone());

    // Two chunks of 4 frames of 4 bytes each (stereo s16 => 4-byte frames).
    let second = s16_chunk(&[10, 20, 30, 40, 50, 60, 70, 80], None);
    let first = s16_chunk(&[1, 2, 3, 4, 5, 6, 7, 8], Some(second));
    let pipe = Arc::new(QueuePipe::with_head(first));

    handle.set_in_audio_format(stereo_s16());
    handle.set_pipe(Some(pipe));
    handle.set_allow_play(true);

    handle.enable();
    handle.open();
    assert!(handle.is_open());

    common::wait_for_signal(&receiver, Duration::from_secs(2));

    assert_eq!(backend.total_played_bytes(), 32);
    assert_eq!(backend.play_call_count(), 2);
    assert!(handle.current_chunk_finished());
    assert!(handle.is_open());

    handle.kill();
    join.join().unwrap();
}

#[test]
fn cancel_mid_play_stops_delivery_and_invokes_backend_cancel() {
    let backend = MockBackend::new();
    backend.state.lock().unwrap().delay = Duration::from_millis(300);
    let (handle, receiver, join) = spawn_worker(backend.clone());

    let chunk = s16_chunk(&[1, 2, 3, 4], None);
    let pipe = Arc::new(QueuePipe::with_head(chunk));

    handle.set_in_audio_format(stereo_s16());
    handle.set_pipe(Some(pipe));
    handle.set_allow_play(true);

    handle.enable();
    handle.open();

    // Give the worker time to enter WaitForDelay before the chunk is ever
    // written to the backend.
    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(backend.play_call_count(), 0, "backend.play should not have been reached yet");

    handle.cancel();
    common::wait_for_signal(&receiver, Duration::from_secs(2));

    assert_eq!(backend.play_call_count(), 0, "cancelled chunk's bytes must not be delivered");
    assert!(backend.cancel_call_count() >= 1);
    assert!(handle.is_open(), "CANCEL does not close the device");

    handle.kill();
    join.join().unwrap();
}

#[test]
fn zero_length_play_triggers_close_and_fail_timer() {
    let backend = MockBackend::new();
    backend.set_play_returns([None, Some(0)]);
    let (handle, receiver, join) = spawn_worker(backend.clone());

    let second = s16_chunk(&[10, 20, 30, 40], None);
    let first = s16_chunk(&[1, 2, 3, 4], Some(second));
    let pipe = Arc::new(QueuePipe::with_head(first));

    handle.set_in_audio_format(stereo_s16());
    handle.set_pipe(Some(pipe));
    handle.set_allow_play(true);

    handle.enable();
    handle.open();

    common::wait_for_signal(&receiver, Duration::from_secs(2));

    assert!(!handle.is_open(), "backend.play() returning 0 must close the device");
    assert!(backend.close_call_count() >= 1);
    assert!(handle.fail_timer_is_defined());

    handle.kill();
    join.join().unwrap();
}

#[test]
fn pause_cancels_then_polls_until_an_interrupting_command() {
    let backend = MockBackend::new();
    backend.state.lock().unwrap().delay = Duration::from_millis(15);
    let (handle, _receiver, join) = spawn_worker(backend.clone());

    let pipe = Arc::new(QueuePipe::new());
    handle.set_in_audio_format(stereo_s16());
    handle.set_pipe(Some(pipe));

    handle.enable();
    handle.open();
    assert!(handle.is_open());

    handle.pause();
    assert!(backend.cancel_call_count() >= 1, "PAUSE must cancel before polling");

    std::thread::sleep(Duration::from_millis(80));
    let pauses_before_close = backend.pause_call_count();
    assert!(pauses_before_close >= 1, "the pause loop should have polled backend.pause at least once");

    handle.close();
    assert!(!handle.is_open());

    handle.kill();
    join.join().unwrap();
}

#[test]
fn reopen_with_undefined_config_format_preserves_the_pipe() {
    let backend = MockBackend::new();
    let (handle, _receiver, join) = spawn_worker(backend.clone());

    let chunk = s16_chunk(&[1, 2, 3, 4], None);
    let pipe = Arc::new(QueuePipe::with_head(chunk));
    handle.set_in_audio_format(stereo_s16());
    handle.set_pipe(Some(pipe));

    handle.enable();
    handle.open();
    assert!(handle.is_open());

    handle.reopen();

    // Reopen implicitly closed (drain) and reopened the device; had the
    // pipe not been preserved across that implicit close, the reopen's
    // OPEN precondition would have failed silently and left it shut.
    assert!(handle.is_open(), "REOPEN with an undefined config mask must preserve the pipe across its implicit close");
    assert!(backend.drain_call_count() >= 1, "the implicit close is graceful (drain), not abrupt");

    handle.kill();
    join.join().unwrap();
}

#[test]
fn pause_loop_closes_abruptly_when_backend_pause_fails() {
    let backend = MockBackend::new();
    backend.state.lock().unwrap().delay = Duration::from_millis(15);
    backend.set_pause_should_fail(true);
    let (handle, _receiver, join) = spawn_worker(backend.clone());

    let pipe = Arc::new(QueuePipe::new());
    handle.set_in_audio_format(stereo_s16());
    handle.set_pipe(Some(pipe));

    handle.enable();
    handle.open();
    assert!(handle.is_open());

    handle.pause();
    assert!(backend.cancel_call_count() >= 1, "PAUSE must cancel before polling");

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while handle.is_open() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(!handle.is_open(), "a failing backend.pause() must close the device");
    assert!(backend.close_call_count() >= 1);
    assert!(handle.fail_timer_is_defined());

    handle.kill();
    join.join().unwrap();
}

#[test]
fn pause_with_device_closed_acks_without_touching_the_backend() {
    let backend = MockBackend::new();
    let (handle, _receiver, join) = spawn_worker(backend.clone());

    handle.pause();

    assert_eq!(backend.cancel_call_count(), 0);
    assert_eq!(backend.pause_call_count(), 0);

    handle.kill();
    join.join().unwrap();
}
