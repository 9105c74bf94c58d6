//! The produced surface: a cheap, `Clone`-able handle the controller holds
//! to drive one [`crate::worker::OutputWorker`].
//!
//! A thin wrapper-methods-over-shared-state shape: every method here locks
//! the mailbox just long enough to read or write a field, or blocks for a
//! rendezvous in `post`. The handle never touches the backend or filters
//! directly — only the worker thread that owns them does.

use std::sync::Arc;

use crate::chunk::MusicChunk;
use crate::format::AudioFormat;
use crate::mailbox::{Command, CommandMailbox};
use crate::pipe::Pipe;

/// A handle to post commands to, and inspect the state of, one output
/// worker. Constructed alongside the [`crate::worker::OutputWorker`] that
/// shares its [`CommandMailbox`]; the worker must not be started before
/// the handle's backing `OutputState` is initialized.
#[derive(Clone)]
pub struct OutputHandle {
    mailbox: Arc<CommandMailbox>,
}

impl OutputHandle {
    pub fn new(mailbox: Arc<CommandMailbox>) -> Self {
        Self { mailbox }
    }

    /// Post a command and block until the worker acknowledges it
    /// (`CommandMailbox::post`'s rendezvous).
    ///
    /// # Arguments
    ///
    /// * `command` - One of the named commands; `Command::None` is the
    ///   mailbox's own empty-slot marker and must never be posted.
    pub fn post(&self, command: Command) {
        debug_assert_ne!(command, Command::None, "Command::None is not a postable command");
        self.mailbox.post(command);
    }

    /// Enable the backend device, opening it for later `Open` commands.
    pub fn enable(&self) {
        self.post(Command::Enable);
    }

    /// Disable the backend device, closing it first if currently open.
    pub fn disable(&self) {
        self.post(Command::Disable);
    }

    /// Open the device for I/O. Requires `set_pipe` and
    /// `set_in_audio_format` to have been called first.
    pub fn open(&self) {
        self.post(Command::Open);
    }

    /// Reopen against the current formats, preserving the pipe.
    pub fn reopen(&self) {
        self.post(Command::Reopen);
    }

    /// Close the device gracefully (drains rather than cancels).
    pub fn close(&self) {
        self.post(Command::Close);
    }

    /// Pause playback; the worker polls the backend until a new command
    /// arrives.
    pub fn pause(&self) {
        self.post(Command::Pause);
    }

    /// Block until the backend has finished playing everything already
    /// queued. Requires no chunk currently in flight.
    pub fn drain(&self) {
        self.post(Command::Drain);
    }

    /// Discard whatever the backend has queued but not yet played.
    pub fn cancel(&self) {
        self.post(Command::Cancel);
    }

    /// Terminate the worker thread. The only non-recoverable command.
    pub fn kill(&self) {
        self.post(Command::Kill);
    }

    /// Allow (or forbid) the worker from attempting a Play step while
    /// idle. Toggling this to `true` also wakes a worker that is
    /// currently blocked in its idle wait.
    ///
    /// # Arguments
    ///
    /// * `allow` - Whether the worker may pull chunks from the pipe.
    pub fn set_allow_play(&self, allow: bool) {
        self.mailbox.set_allow_play(allow);
    }

    /// Install the upstream pipe the worker reads chunks from. Must be
    /// set before `open()`.
    pub fn set_pipe(&self, pipe: Option<Arc<dyn Pipe>>) {
        self.mailbox.set_pipe(pipe);
    }

    /// Set the negotiated input format the worker opens its filter chain
    /// and backend against. Must be set before `open()`.
    pub fn set_in_audio_format(&self, format: AudioFormat) {
        self.mailbox.set_in_audio_format(format);
    }

    /// Narrow the negotiated output format; consulted on `open()`/
    /// `reopen()` via `AudioFormat::apply_mask`.
    pub fn set_config_audio_format(&self, mask: AudioFormat) {
        self.mailbox.set_config_audio_format(mask);
    }

    /// Whether the fail timer is currently counting down a cooldown after
    /// a device failure. An external scheduler consults this before
    /// retrying `open()`.
    pub fn fail_timer_is_defined(&self) -> bool {
        self.mailbox.fail_timer_is_defined()
    }

    /// The automatic-reopen cooldown this worker was configured with, for
    /// a scheduler to pair with `fail_timer_is_defined()` when deciding
    /// whether enough time has passed to retry `open()`.
    pub fn reopen_cooldown(&self) -> std::time::Duration {
        self.mailbox.reopen_cooldown()
    }

    /// Snapshot of whether the device is currently open.
    pub fn is_open(&self) -> bool {
        self.mailbox.is_open()
    }

    /// Whether the worker is at rest with no chunk stream in flight.
    pub fn current_chunk_finished(&self) -> bool {
        self.mailbox.current_chunk_finished()
    }

    /// Seed a pre-linked chunk as the current one, for exercising the
    /// worker with a hand-built play-order chain in tests.
    pub fn set_current_chunk_hint(&self, chunk: Option<Arc<MusicChunk>>) {
        self.mailbox.set_current_chunk_hint(chunk);
    }
}
