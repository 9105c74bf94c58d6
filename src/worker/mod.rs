//! The per-output audio worker: the cooperative state machine gluing
//! command dispatch, the hot-path Play loop, and the idle wait together.
//!
//! Split into a liveness [`guard`], the owned [`state`], the command
//! [`dispatch`] table, and the hot-path [`play`] loop, glued together by
//! [`OutputWorker::run`] below.

pub mod state;

mod dispatch;
mod guard;
mod play;

pub use dispatch::DispatchSignal;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::info;

use crate::backend::BackendPort;
use crate::mailbox::{Command, CommandMailbox};
use crate::observer::PlaybackObserver;
use crate::options::WorkerOptions;

use guard::WorkerAliveGuard;

/// Owns the backend and drives one [`CommandMailbox`] to completion.
/// Constructed once per output, consumed by [`OutputWorker::run`] (or
/// [`OutputWorker::spawn`], which runs it on a dedicated thread).
pub struct OutputWorker {
    mailbox: Arc<CommandMailbox>,
    backend: Box<dyn BackendPort>,
    options: WorkerOptions,
    observer: Option<Box<dyn PlaybackObserver>>,
    output_name: String,
    plugin_name: String,
    alive: Arc<AtomicBool>,
}

impl OutputWorker {
    pub fn new(
        mailbox: Arc<CommandMailbox>,
        backend: Box<dyn BackendPort>,
        options: WorkerOptions,
        output_name: impl Into<String>,
        plugin_name: impl Into<String>,
    ) -> Self {
        mailbox.set_reopen_cooldown(options.reopen_cooldown);
        Self {
            mailbox,
            backend,
            options,
            observer: None,
            output_name: output_name.into(),
            plugin_name: plugin_name.into(),
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn PlaybackObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// A handle other code can poll to check whether the worker thread is
    /// currently running.
    pub fn alive_flag(&self) -> Arc<AtomicBool> {
        self.alive.clone()
    }

    /// Spawn the worker loop on its own OS thread.
    pub fn spawn(self) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name(format!("output-worker-{}", self.output_name))
            .spawn(move || self.run())
            .expect("failed to spawn output worker thread")
    }

    /// The cooperative loop: dispatch the posted command (or idle-wait),
    /// then on an `Idle` signal attempt a Play step before waiting again.
    /// Runs until a `KILL` command returns `Terminated`.
    pub fn run(mut self) {
        let _alive = WorkerAliveGuard::new(self.alive.clone());
        info!("output {}: worker thread starting", self.output_name);

        let mut guard = self.mailbox.lock();
        loop {
            let (g, signal) = dispatch::dispatch(
                &self.mailbox,
                guard,
                self.backend.as_mut(),
                &self.output_name,
                &self.plugin_name,
            );
            guard = g;

            match signal {
                DispatchSignal::Terminated => break,
                DispatchSignal::Continue => continue,
                DispatchSignal::Idle => {}
            }

            if guard.state.open && guard.state.allow_play {
                let (g, played) = play::play(
                    &self.mailbox,
                    guard,
                    self.backend.as_mut(),
                    &self.options,
                    self.observer.as_deref(),
                    &self.output_name,
                );
                guard = g;
                if played {
                    continue;
                }
            }

            if guard.command == Command::None {
                guard.state.woken_for_play = false;
                guard = self.mailbox.wait_worker_ready(guard);
            }
        }

        info!("output {}: worker thread terminated", self.output_name);
    }
}
