//! The worker's own state, guarded by the same mutex as the command slot.

use std::sync::Arc;
use std::time::Duration;

use crate::chunk::MusicChunk;
use crate::cross_fade::CrossFadeBuffer;
use crate::error::WorkerError;
use crate::fail_timer::FailTimer;
use crate::filter::{ConvertFilter, FilterChain, ReplayGainFilter};
use crate::format::AudioFormat;
use crate::options::DEFAULT_REOPEN_COOLDOWN;
use crate::pipe::Pipe;

pub struct OutputState {
    pub in_audio_format: AudioFormat,
    pub out_audio_format: AudioFormat,
    pub config_audio_format: AudioFormat,

    pub really_enabled: bool,
    pub open: bool,
    pub pause: bool,
    pub allow_play: bool,
    pub woken_for_play: bool,

    pub current_chunk: Option<Arc<MusicChunk>>,
    pub current_chunk_finished: bool,
    pub in_playback_loop: bool,

    pub pipe: Option<Arc<dyn Pipe>>,

    pub filter: FilterChain,
    pub convert_filter: Option<Box<dyn ConvertFilter>>,
    pub replay_gain_filter: Option<Box<dyn ReplayGainFilter>>,
    pub other_replay_gain_filter: Option<Box<dyn ReplayGainFilter>>,
    pub replay_gain_serial: u64,
    pub other_replay_gain_serial: u64,

    pub cross_fade_buffer: CrossFadeBuffer,
    pub fail_timer: FailTimer,

    /// Cooldown a scheduler should honor before retrying OPEN after a
    /// failure, mirrored from `WorkerOptions::reopen_cooldown` when the
    /// worker is constructed so it's reachable through the handle.
    pub reopen_cooldown: Duration,

    pub last_error: Option<WorkerError>,
}

impl OutputState {
    pub fn new(filter: FilterChain) -> Self {
        Self {
            in_audio_format: AudioFormat::mask(),
            out_audio_format: AudioFormat::mask(),
            config_audio_format: AudioFormat::mask(),
            really_enabled: false,
            open: false,
            pause: false,
            allow_play: false,
            woken_for_play: false,
            current_chunk: None,
            current_chunk_finished: true,
            in_playback_loop: false,
            pipe: None,
            filter,
            convert_filter: None,
            replay_gain_filter: None,
            other_replay_gain_filter: None,
            replay_gain_serial: 0,
            other_replay_gain_serial: 0,
            cross_fade_buffer: CrossFadeBuffer::new(),
            fail_timer: FailTimer::new(),
            reopen_cooldown: DEFAULT_REOPEN_COOLDOWN,
            last_error: None,
        }
    }

    /// Debug-only invariant checks run at the state's boundary points.
    /// Compiled out of release builds: these are defensive checks, not
    /// user-facing errors.
    pub fn debug_check_invariants(&self) {
        debug_assert!(!self.open || self.pipe.is_some(), "open requires a pipe");
        debug_assert!(!self.open || self.in_audio_format.valid(), "open requires a valid in_audio_format");
        debug_assert!(!self.open || self.really_enabled, "open requires really_enabled");
        debug_assert!(
            self.current_chunk.is_none() || self.in_playback_loop,
            "current_chunk set outside the playback loop"
        );
    }

    /// Stronger-than-`debug_assert!` invariant check used only by tests,
    /// so a violation fails the test even in a release-mode test binary.
    #[cfg(test)]
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        if self.open && self.pipe.is_none() {
            return Err("open requires a pipe");
        }
        if self.open && !self.in_audio_format.valid() {
            return Err("open requires a valid in_audio_format");
        }
        if self.open && !self.really_enabled {
            return Err("open requires really_enabled");
        }
        if self.current_chunk.is_some() && !self.in_playback_loop {
            return Err("current_chunk set outside the playback loop");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterChain;

    #[test]
    fn fresh_state_satisfies_invariants() {
        let state = OutputState::new(FilterChain::new());
        assert!(state.check_invariants().is_ok());
        assert!(state.current_chunk_finished);
    }
}
