//! The hot path: pulling chunks from the pipe, filtering (including
//! cross-fade), and handing bytes to the backend.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::chunk::MusicChunk;
use crate::error::WorkerError;
use crate::mailbox::{Command, CommandMailbox, MailboxInner};
use crate::options::WorkerOptions;

use super::dispatch::close_abrupt;
use super::state::OutputState;

/// `GetNextChunk()`: the chunk after `current_chunk` if one is already in
/// flight, otherwise whatever the pipe currently has queued.
fn get_next_chunk(state: &OutputState) -> Option<Arc<MusicChunk>> {
    match &state.current_chunk {
        Some(chunk) => chunk.next.clone(),
        None => state.pipe.as_ref().and_then(|pipe| pipe.peek()),
    }
}

/// Apply the replay-gain filter to one chunk's raw PCM, reconfiguring it
/// first if the chunk's serial has changed since the last call.
fn chunk_data(
    chunk: &MusicChunk,
    frame_size: usize,
    rg_filter: &mut Option<Box<dyn crate::filter::ReplayGainFilter>>,
    rg_serial: &mut u64,
) -> Result<Vec<u8>, WorkerError> {
    debug_assert!(chunk.frame_aligned(frame_size), "chunk not frame-aligned to the input format");

    if chunk.replay_gain_serial != *rg_serial {
        if let Some(filter) = rg_filter.as_mut() {
            let info = if chunk.replay_gain_serial == 0 { None } else { chunk.replay_gain_info };
            filter.set_info(info);
        }
        *rg_serial = chunk.replay_gain_serial;
    }

    match rg_filter.as_mut() {
        Some(filter) => filter
            .filter_pcm(&chunk.data)
            .map(|cow| cow.into_owned())
            .map_err(WorkerError::FilterPcmFailed),
        None => Ok(chunk.data.clone()),
    }
}

/// `filter_chunk(chunk)`: primary replay-gain pass, optional cross-fade
/// against `chunk.other`, then the main filter chain.
fn filter_chunk(state: &mut OutputState, chunk: &MusicChunk) -> Result<Vec<u8>, WorkerError> {
    let frame_size = state.in_audio_format.frame_size();
    let primary = chunk_data(chunk, frame_size, &mut state.replay_gain_filter, &mut state.replay_gain_serial)?;
    if primary.is_empty() {
        return Ok(Vec::new());
    }

    let mixed = match chunk.other.as_ref() {
        None => primary,
        Some(other_chunk) => {
            let other = chunk_data(
                other_chunk,
                frame_size,
                &mut state.other_replay_gain_filter,
                &mut state.other_replay_gain_serial,
            )?;
            if other.is_empty() {
                return Ok(Vec::new());
            }
            let format = state
                .in_audio_format
                .format
                .ok_or(WorkerError::CrossFadeFormatUnsupported)?;
            state
                .cross_fade_buffer
                .mix(format, &primary, &other, chunk.mix_ratio)
                .to_vec()
        }
    };

    state
        .filter
        .filter_pcm(&mixed)
        .map(|cow| cow.into_owned())
        .map_err(WorkerError::FilterPcmFailed)
}

/// `WaitForDelay()`: ask the backend how long until it can accept more
/// audio; block on the mailbox's wake condvar for that long, or until a
/// command interrupts it. `backend.delay()` is called with the mutex held,
/// since it's a cheap local query rather than a blocking device call.
pub(super) fn wait_for_delay<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: std::sync::MutexGuard<'a, MailboxInner>,
    backend: &mut dyn crate::backend::BackendPort,
) -> (std::sync::MutexGuard<'a, MailboxInner>, bool) {
    loop {
        let delay = backend.delay();
        if delay == Duration::ZERO {
            return (guard, true);
        }
        guard = mailbox.wait_worker_ready_timeout(guard, delay);
        if guard.command != Command::None {
            return (guard, false);
        }
    }
}

/// `PlayChunk(chunk)`: deliver tag, filter, then write bytes to the
/// backend in a loop honoring `WaitForDelay`.
fn play_chunk<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: std::sync::MutexGuard<'a, MailboxInner>,
    backend: &mut dyn crate::backend::BackendPort,
    options: &WorkerOptions,
    chunk: &MusicChunk,
) -> (std::sync::MutexGuard<'a, MailboxInner>, bool) {
    if options.tag_delivery_enabled {
        if let Some(tag) = chunk.tag.clone() {
            let (g, ()) = mailbox.unlocked(guard, || backend.send_tag(&tag));
            guard = g;
        }
    }

    let filtered = match filter_chunk(&mut guard.state, chunk) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("filter_chunk failed: {err}");
            guard.state.last_error = Some(err);
            guard = close_abrupt(mailbox, guard, backend);
            guard.state.fail_timer.update();
            return (guard, false);
        }
    };

    let mut offset = 0usize;
    while offset < filtered.len() && guard.command == Command::None {
        let (g, proceed) = wait_for_delay(mailbox, guard, backend);
        guard = g;
        if !proceed {
            break;
        }

        let remaining = &filtered[offset..];
        let (g, written) = mailbox.unlocked(guard, || backend.play(remaining));
        guard = g;

        if written == 0 {
            warn!("backend.play reported an unrecoverable failure");
            guard.state.last_error = Some(WorkerError::PlayFailed);
            guard = close_abrupt(mailbox, guard, backend);
            guard.state.fail_timer.update();
            return (guard, false);
        }

        let frame_size = guard.state.out_audio_format.frame_size();
        debug_assert!(written <= remaining.len() && written % frame_size == 0);
        offset += written;
    }

    (guard, true)
}

/// `Play()`: walk the linked chunk chain, playing each one, until the
/// pipe runs dry or a command interrupts. Returns whether any chunk was
/// consumed at all.
pub(super) fn play<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: std::sync::MutexGuard<'a, MailboxInner>,
    backend: &mut dyn crate::backend::BackendPort,
    options: &WorkerOptions,
    observer: Option<&dyn crate::observer::PlaybackObserver>,
    output_name: &str,
) -> (std::sync::MutexGuard<'a, MailboxInner>, bool) {
    let Some(mut chunk) = get_next_chunk(&guard.state) else {
        return (guard, false);
    };

    debug_assert!(!guard.state.in_playback_loop, "Play() re-entered while already looping");
    guard.state.in_playback_loop = true;

    while guard.command == Command::None {
        guard.state.current_chunk = Some(chunk.clone());
        let (g, ok) = play_chunk(mailbox, guard, backend, options, &chunk);
        guard = g;
        if !ok {
            break;
        }
        match chunk.next.clone() {
            Some(next) => chunk = next,
            None => break,
        }
    }

    guard.state.in_playback_loop = false;
    guard.state.current_chunk_finished = true;
    debug!("output {output_name}: chunk stream finished");

    if let Some(observer) = observer {
        let (g, ()) = mailbox.unlocked(guard, || observer.chunk_finished());
        guard = g;
    }

    (guard, true)
}
