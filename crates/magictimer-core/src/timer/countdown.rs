//! Countdown engine.
//!
//! Remaining time is a pure function of `(start, duration, now)`. Nothing is
//! decremented per tick, so a late or skipped sample just reads the correct
//! value the next time it runs.

use serde::{Deserialize, Serialize};

use super::duration::TimerDuration;

/// Whole seconds between `started_at_ms` and `now_ms`.
///
/// A clock reading before the start clamps to zero.
pub fn elapsed_secs(now_ms: u64, started_at_ms: u64) -> u64 {
    now_ms.saturating_sub(started_at_ms) / 1000
}

/// Seconds left on a countdown of `duration_secs` started at `started_at_ms`.
///
/// Never negative and never above `duration_secs`.
pub fn remaining_secs(now_ms: u64, started_at_ms: u64, duration_secs: u32) -> u32 {
    let elapsed = elapsed_secs(now_ms, started_at_ms);
    u64::from(duration_secs).saturating_sub(elapsed) as u32
}

/// Share of the countdown still left, 0.0 ..= 100.0.
pub fn percent_remaining(remaining_secs: u32, duration_secs: u32) -> f64 {
    if duration_secs == 0 {
        return 0.0;
    }
    (f64::from(remaining_secs) / f64::from(duration_secs) * 100.0).clamp(0.0, 100.0)
}

/// One timing run: a start instant and a validated duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub started_at_ms: u64,
    pub duration: TimerDuration,
}

impl Countdown {
    pub fn new(started_at_ms: u64, duration: TimerDuration) -> Self {
        Self {
            started_at_ms,
            duration,
        }
    }

    pub fn remaining_at(&self, now_ms: u64) -> u32 {
        remaining_secs(now_ms, self.started_at_ms, self.duration.secs())
    }

    pub fn percent_at(&self, now_ms: u64) -> f64 {
        percent_remaining(self.remaining_at(now_ms), self.duration.secs())
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.remaining_at(now_ms) == 0
    }
}
