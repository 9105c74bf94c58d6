//! Command dispatch: one transition per command. `dispatch()` itself is
//! the cooperative state machine's single decision point, returning an
//! explicit [`DispatchSignal`] instead of an ad hoc set of booleans.

use std::sync::MutexGuard;

use log::{info, warn};

use crate::backend::BackendPort;
use crate::error::WorkerError;
use crate::mailbox::{Command, CommandMailbox, MailboxInner};

use super::play;

/// Control signal returned by [`dispatch`]. `PAUSE`/`DRAIN`/`CANCEL`
/// return `Continue` so the outer loop re-dispatches immediately without
/// an intervening Play attempt; everything else that acks returns `Idle`;
/// `KILL` returns `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSignal {
    Idle,
    Continue,
    Terminated,
}

/// Close the device abruptly (cancel rather than drain), then the
/// backend and the filter chain. Used by every failure path and by
/// CANCEL/DISABLE.
pub(super) fn close_abrupt<'a>(
    mailbox: &'a CommandMailbox,
    guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
) -> MutexGuard<'a, MailboxInner> {
    close_with_mode(mailbox, guard, backend, false)
}

/// Shared CLOSE teardown, taking the guard by value, matching the
/// `unlocked(guard, closure)` release/reacquire pattern used everywhere
/// else in the worker.
fn close_with_mode<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    graceful: bool,
) -> MutexGuard<'a, MailboxInner> {
    guard.state.pipe = None;
    guard.state.current_chunk = None;
    guard.state.open = false;

    let (g, ()) = mailbox.unlocked(guard, || {
        if graceful {
            backend.drain();
        } else {
            backend.cancel();
        }
        backend.close();
    });
    guard = g;

    guard.state.filter.close();
    if let Some(filter) = guard.state.convert_filter.as_mut() {
        filter.close();
    }
    if let Some(filter) = guard.state.replay_gain_filter.as_mut() {
        filter.close();
    }
    if let Some(filter) = guard.state.other_replay_gain_filter.as_mut() {
        filter.close();
    }

    guard
}

fn do_close<'a>(
    mailbox: &'a CommandMailbox,
    guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    graceful: bool,
) -> MutexGuard<'a, MailboxInner> {
    close_with_mode(mailbox, guard, backend, graceful)
}

fn do_enable<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    output_name: &str,
) -> MutexGuard<'a, MailboxInner> {
    if !guard.state.really_enabled {
        let (g, result) = mailbox.unlocked(guard, || backend.enable());
        guard = g;
        match result {
            Ok(()) => {
                guard.state.really_enabled = true;
                info!("output {output_name}: enabled");
            }
            Err(err) => {
                warn!("output {output_name}: enable failed: {err}");
                guard.state.last_error = Some(WorkerError::EnableFailed(err));
            }
        }
    }
    guard
}

fn do_disable<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    output_name: &str,
) -> MutexGuard<'a, MailboxInner> {
    if guard.state.open {
        guard = do_close(mailbox, guard, backend, false);
    }
    if guard.state.really_enabled {
        let (g, ()) = mailbox.unlocked(guard, || backend.disable());
        guard = g;
        guard.state.really_enabled = false;
        info!("output {output_name}: disabled");
    }
    guard
}

fn do_open<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    output_name: &str,
    plugin_name: &str,
) -> MutexGuard<'a, MailboxInner> {
    if guard.state.open {
        return guard;
    }
    if guard.state.pipe.is_none() || !guard.state.in_audio_format.valid() {
        warn!("output {output_name}: OPEN requested with no pipe or invalid input format");
        return guard;
    }

    guard.state.fail_timer.reset();
    guard = do_enable(mailbox, guard, backend, output_name);
    if !guard.state.really_enabled {
        return guard;
    }

    let in_format = guard.state.in_audio_format;
    let opened = guard.state.filter.open(&in_format).map_err(WorkerError::FilterOpenFailed).and_then(|filter_out| {
        if let Some(rg) = guard.state.replay_gain_filter.as_mut() {
            rg.open(&in_format).map_err(WorkerError::FilterOpenFailed)?;
        }
        if let Some(rg) = guard.state.other_replay_gain_filter.as_mut() {
            rg.open(&in_format).map_err(WorkerError::FilterOpenFailed)?;
        }
        Ok(filter_out)
    });

    let filter_out = match opened {
        Ok(format) => format,
        Err(err) => {
            warn!("output {output_name}: filter open failed: {err}");
            guard.state.last_error = Some(err);
            guard = close_with_mode(mailbox, guard, backend, false);
            guard.state.fail_timer.update();
            return guard;
        }
    };

    let out_format = filter_out.apply_mask(&guard.state.config_audio_format);
    let (g, backend_result) = mailbox.unlocked(guard, || backend.open(&out_format));
    guard = g;

    if let Err(err) = backend_result {
        warn!("output {output_name} ({plugin_name}): backend open failed: {err}");
        guard.state.last_error = Some(WorkerError::BackendOpenFailed(err));
        guard = close_with_mode(mailbox, guard, backend, false);
        guard.state.fail_timer.update();
        return guard;
    }

    if let Some(convert) = guard.state.convert_filter.as_mut() {
        if let Err(err) = convert.open(&out_format).and_then(|_| convert.set_out_format(&out_format)) {
            warn!("output {output_name}: convert filter configuration failed: {err}");
            guard.state.last_error = Some(WorkerError::ConvertConfigFailed(err));
            guard = close_with_mode(mailbox, guard, backend, false);
            guard.state.fail_timer.update();
            return guard;
        }
    }

    guard.state.out_audio_format = out_format;
    guard.state.open = true;
    info!("output {output_name} ({plugin_name}): opened at {out_format:?}");
    guard
}

fn do_reopen<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    output_name: &str,
    plugin_name: &str,
) -> MutexGuard<'a, MailboxInner> {
    if !guard.state.config_audio_format.fully_defined() {
        let preserved_pipe = guard.state.pipe.clone();
        if guard.state.open {
            guard = do_close(mailbox, guard, backend, true);
        }
        guard.state.pipe = preserved_pipe;
        return do_open(mailbox, guard, backend, output_name, plugin_name);
    }

    if !guard.state.open {
        return do_open(mailbox, guard, backend, output_name, plugin_name);
    }

    guard.state.filter.close();
    let in_format = guard.state.in_audio_format;
    match guard.state.filter.open(&in_format) {
        Ok(filter_out) => {
            let out_format = filter_out.apply_mask(&guard.state.config_audio_format);
            guard.state.out_audio_format = out_format;
            if let Some(convert) = guard.state.convert_filter.as_mut() {
                if let Err(err) = convert.set_out_format(&out_format) {
                    warn!("output {output_name}: convert filter configuration failed on reopen: {err}");
                    guard.state.last_error = Some(WorkerError::ConvertConfigFailed(err));
                }
            }
            info!("output {output_name}: reopened filter chain at {out_format:?}");
            guard
        }
        Err(err) => {
            warn!("output {output_name}: reopen filter failed: {err}");
            guard.state.last_error = Some(WorkerError::FilterOpenFailed(err));
            guard.state.current_chunk = None;
            guard.state.open = false;
            let (g, ()) = mailbox.unlocked(guard, || {
                backend.cancel();
                backend.close();
            });
            guard = g;
            guard.state.fail_timer.update();
            guard
        }
    }
}

fn do_pause_loop<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
) -> MutexGuard<'a, MailboxInner> {
    if !guard.state.open {
        return mailbox.ack(guard);
    }

    let (g, ()) = mailbox.unlocked(guard, || backend.cancel());
    guard = g;
    guard.state.pause = true;
    guard = mailbox.ack(guard);

    loop {
        if guard.command != Command::None {
            break;
        }
        let (g, proceed) = play::wait_for_delay(mailbox, guard, backend);
        guard = g;
        if !proceed {
            break;
        }
        let (g, result) = mailbox.unlocked(guard, || backend.pause());
        guard = g;
        if let Err(err) = result {
            warn!("backend.pause failed: {err}");
            guard.state.last_error = Some(WorkerError::PauseFailed(err));
            guard = close_with_mode(mailbox, guard, backend, false);
            guard.state.fail_timer.update();
            break;
        }
        if guard.command != Command::None {
            break;
        }
    }

    guard.state.pause = false;
    guard
}

fn do_drain<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
) -> MutexGuard<'a, MailboxInner> {
    if guard.state.open {
        debug_assert!(
            guard.state.current_chunk.is_none() && guard.state.pipe.as_ref().and_then(|p| p.peek()).is_none(),
            "DRAIN requested with chunks still pending"
        );
        let (g, ()) = mailbox.unlocked(guard, || backend.drain());
        guard = g;
    }
    mailbox.ack(guard)
}

fn do_cancel<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
) -> MutexGuard<'a, MailboxInner> {
    guard.state.current_chunk = None;
    if guard.state.open {
        let (g, ()) = mailbox.unlocked(guard, || backend.cancel());
        guard = g;
    }
    mailbox.ack(guard)
}

/// The single decision point of the cooperative state machine. Called
/// with the mutex held; every command that performs backend I/O releases
/// it internally via `CommandMailbox::unlocked`.
pub(super) fn dispatch<'a>(
    mailbox: &'a CommandMailbox,
    mut guard: MutexGuard<'a, MailboxInner>,
    backend: &mut dyn BackendPort,
    output_name: &str,
    plugin_name: &str,
) -> (MutexGuard<'a, MailboxInner>, DispatchSignal) {
    let command = guard.command;
    let signal = match command {
        Command::None => DispatchSignal::Idle,
        Command::Enable => {
            guard = do_enable(mailbox, guard, backend, output_name);
            guard = mailbox.ack(guard);
            DispatchSignal::Idle
        }
        Command::Disable => {
            guard = do_disable(mailbox, guard, backend, output_name);
            guard = mailbox.ack(guard);
            DispatchSignal::Idle
        }
        Command::Open => {
            guard = do_open(mailbox, guard, backend, output_name, plugin_name);
            guard = mailbox.ack(guard);
            DispatchSignal::Idle
        }
        Command::Reopen => {
            guard = do_reopen(mailbox, guard, backend, output_name, plugin_name);
            guard = mailbox.ack(guard);
            DispatchSignal::Idle
        }
        Command::Close => {
            if guard.state.open {
                guard = do_close(mailbox, guard, backend, true);
            }
            guard = mailbox.ack(guard);
            DispatchSignal::Idle
        }
        Command::Pause => {
            guard = do_pause_loop(mailbox, guard, backend);
            DispatchSignal::Continue
        }
        Command::Drain => {
            guard = do_drain(mailbox, guard, backend);
            DispatchSignal::Continue
        }
        Command::Cancel => {
            guard = do_cancel(mailbox, guard, backend);
            DispatchSignal::Continue
        }
        Command::Kill => {
            guard.state.current_chunk = None;
            guard = mailbox.ack(guard);
            DispatchSignal::Terminated
        }
    };

    (guard, signal)
}
