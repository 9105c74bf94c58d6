//! Single-slot command channel with rendezvous semantics between the
//! controller and the worker.
//!
//! One `Mutex` guards both the command slot and the worker's
//! [`crate::worker::OutputState`]: every field of the worker's state is
//! only ever read or written while this mutex is held. Two condvars are
//! bound to it: `worker_ready` wakes the worker (a new command, or
//! `allow_play`/`woken_for_play` being set) and `command_done` wakes a
//! controller blocked in `post` once the worker has reset the slot to
//! `Command::None`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::chunk::MusicChunk;
use crate::format::AudioFormat;
use crate::pipe::Pipe;
use crate::worker::state::OutputState;

/// One command a controller may post. `None` is the mailbox's empty slot,
/// never posted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    Enable,
    Disable,
    Open,
    Reopen,
    Close,
    Pause,
    Drain,
    Cancel,
    Kill,
}

/// The mutex-guarded payload: the command slot plus the worker's state.
pub struct MailboxInner {
    pub command: Command,
    pub state: OutputState,
}

/// Shared between an [`crate::handle::OutputHandle`] and the worker thread
/// it drives.
pub struct CommandMailbox {
    inner: Mutex<MailboxInner>,
    worker_ready: std::sync::Condvar,
    command_done: std::sync::Condvar,
}

impl CommandMailbox {
    pub fn new(state: OutputState) -> Self {
        Self {
            inner: Mutex::new(MailboxInner { command: Command::None, state }),
            worker_ready: std::sync::Condvar::new(),
            command_done: std::sync::Condvar::new(),
        }
    }

    /// Controller-side rendezvous: wait for an empty slot, post `command`,
    /// wake the worker, then block until the worker acknowledges it by
    /// resetting the slot back to `Command::None`.
    pub fn post(&self, command: Command) {
        let mut guard = self.inner.lock().unwrap();
        while guard.command != Command::None {
            guard = self.command_done.wait(guard).unwrap();
        }
        guard.command = command;
        guard.state.woken_for_play = true;
        self.worker_ready.notify_one();
        while guard.command != Command::None {
            guard = self.command_done.wait(guard).unwrap();
        }
    }

    /// Controller-side: toggle whether the worker is allowed to attempt a
    /// Play step when idle. This is not one of the named commands, so it
    /// wakes the worker through `woken_for_play` rather than the slot.
    pub fn set_allow_play(&self, allow: bool) {
        let mut guard = self.inner.lock().unwrap();
        guard.state.allow_play = allow;
        if allow {
            guard.state.woken_for_play = true;
            self.worker_ready.notify_one();
        }
    }

    /// Controller-side: install the upstream pipe ahead of an OPEN.
    pub fn set_pipe(&self, pipe: Option<Arc<dyn Pipe>>) {
        self.inner.lock().unwrap().state.pipe = pipe;
    }

    /// Controller-side: set the negotiated input format ahead of an OPEN.
    pub fn set_in_audio_format(&self, format: AudioFormat) {
        self.inner.lock().unwrap().state.in_audio_format = format;
    }

    /// Controller-side: narrow the negotiated output format (consulted on
    /// OPEN/REOPEN).
    pub fn set_config_audio_format(&self, mask: AudioFormat) {
        self.inner.lock().unwrap().state.config_audio_format = mask;
    }

    pub fn fail_timer_is_defined(&self) -> bool {
        self.inner.lock().unwrap().state.fail_timer.is_defined()
    }

    /// The configured automatic-reopen cooldown, mirrored from
    /// `WorkerOptions` when the worker was constructed.
    pub fn reopen_cooldown(&self) -> Duration {
        self.inner.lock().unwrap().state.reopen_cooldown
    }

    /// Worker-side: set the cooldown read back by `reopen_cooldown()`.
    pub(crate) fn set_reopen_cooldown(&self, cooldown: Duration) {
        self.inner.lock().unwrap().state.reopen_cooldown = cooldown;
    }

    pub fn current_chunk_finished(&self) -> bool {
        self.inner.lock().unwrap().state.current_chunk_finished
    }

    /// Snapshot of whether the device is currently open. Read-only
    /// convenience for callers deciding whether to post OPEN or REOPEN.
    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().state.open
    }

    /// Snapshot of the most recently used `other` chunk, for tests that
    /// want to hand the worker a pre-linked play-order chain.
    pub fn set_current_chunk_hint(&self, chunk: Option<Arc<MusicChunk>>) {
        self.inner.lock().unwrap().state.current_chunk = chunk;
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MailboxInner> {
        self.inner.lock().unwrap()
    }

    /// Worker-side: reset the slot to `Command::None` and wake any
    /// controller blocked in `post`.
    pub(crate) fn ack<'a>(&'a self, mut guard: MutexGuard<'a, MailboxInner>) -> MutexGuard<'a, MailboxInner> {
        guard.command = Command::None;
        self.command_done.notify_all();
        guard
    }

    /// Worker-side: block on `worker_ready` until woken, with no timeout.
    pub(crate) fn wait_worker_ready<'a>(&'a self, guard: MutexGuard<'a, MailboxInner>) -> MutexGuard<'a, MailboxInner> {
        self.worker_ready.wait(guard).unwrap()
    }

    /// Worker-side: block on `worker_ready` for at most `timeout`. A
    /// freshly posted command or `set_allow_play(true)` wakes this early,
    /// which is how `WaitForDelay` observes an interrupting command.
    pub(crate) fn wait_worker_ready_timeout<'a>(
        &'a self,
        guard: MutexGuard<'a, MailboxInner>,
        timeout: Duration,
    ) -> MutexGuard<'a, MailboxInner> {
        let (guard, _timeout_result) = self.worker_ready.wait_timeout(guard, timeout).unwrap();
        guard
    }

    /// Release `guard`, run `f` without the mutex held, then reacquire.
    /// The `MutexGuard` is consumed by value so a panic inside `f` cannot
    /// leave the lock held past this call.
    pub(crate) fn unlocked<'a, F, R>(&'a self, guard: MutexGuard<'a, MailboxInner>, f: F) -> (MutexGuard<'a, MailboxInner>, R)
    where
        F: FnOnce() -> R,
    {
        drop(guard);
        let result = f();
        (self.lock(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterChain;

    fn fresh_state() -> OutputState {
        OutputState::new(FilterChain::new())
    }

    #[test]
    fn post_and_ack_round_trip_the_slot() {
        let mailbox = Arc::new(CommandMailbox::new(fresh_state()));
        {
            let mut guard = mailbox.lock();
            assert_eq!(guard.command, Command::None);
            guard.command = Command::Enable;
            guard = mailbox.ack(guard);
            assert_eq!(guard.command, Command::None);
        }
    }

    #[test]
    fn set_allow_play_flags_woken_for_play() {
        let mailbox = CommandMailbox::new(fresh_state());
        mailbox.set_allow_play(true);
        assert!(mailbox.lock().state.woken_for_play);
    }

    #[test]
    fn reopen_cooldown_round_trips_through_the_setter() {
        let mailbox = CommandMailbox::new(fresh_state());
        let cooldown = Duration::from_secs(3);
        mailbox.set_reopen_cooldown(cooldown);
        assert_eq!(mailbox.reopen_cooldown(), cooldown);
    }
}
