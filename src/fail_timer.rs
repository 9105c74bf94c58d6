//! Monotonic one-shot cooldown gate after a device failure.
//!
//! An `Instant`-backed clock answering the simple question this worker
//! actually asks: "did a failure happen, and if so, how long ago?" The
//! reopen policy itself lives outside this type, in whatever external
//! scheduler decides when to retry OPEN — `FailTimer` only tracks the
//! clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
pub struct FailTimer {
    failed_at: Option<Instant>,
}

impl FailTimer {
    pub fn new() -> Self {
        Self { failed_at: None }
    }

    /// Record a failure as having happened now.
    pub fn update(&mut self) {
        self.failed_at = Some(Instant::now());
    }

    /// Clear the cooldown, e.g. on a successful OPEN.
    pub fn reset(&mut self) {
        self.failed_at = None;
    }

    /// True between `update()` and `reset()`.
    pub fn is_defined(&self) -> bool {
        self.failed_at.is_some()
    }

    /// Time elapsed since the last `update()`, or `None` if not defined.
    pub fn elapsed(&self) -> Option<Duration> {
        self.failed_at.map(|at| at.elapsed())
    }

    /// Whether `cooldown` has passed since the last failure. Returns `true`
    /// (no gate) if the timer isn't defined at all.
    pub fn cooldown_elapsed(&self, cooldown: Duration) -> bool {
        match self.elapsed() {
            Some(elapsed) => elapsed >= cooldown,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_timer_is_not_defined() {
        let timer = FailTimer::new();
        assert!(!timer.is_defined());
        assert!(timer.cooldown_elapsed(Duration::from_secs(10)));
    }

    #[test]
    fn update_then_reset_round_trips() {
        let mut timer = FailTimer::new();
        timer.update();
        assert!(timer.is_defined());
        timer.reset();
        assert!(!timer.is_defined());
    }

    #[test]
    fn cooldown_not_elapsed_immediately_after_update() {
        let mut timer = FailTimer::new();
        timer.update();
        assert!(!timer.cooldown_elapsed(Duration::from_secs(10)));
    }
}
