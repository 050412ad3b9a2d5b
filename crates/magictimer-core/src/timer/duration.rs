use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Shortest accepted countdown (1 minute).
pub const MIN_DURATION_SECS: u32 = 60;
/// Longest accepted countdown (2 hours).
pub const MAX_DURATION_SECS: u32 = 7200;
/// Duration selected when the app starts (5 minutes).
pub const DEFAULT_DURATION_SECS: u32 = 300;

const MIN_MINUTES: i64 = (MIN_DURATION_SECS / 60) as i64;
const MAX_MINUTES: i64 = (MAX_DURATION_SECS / 60) as i64;
/// Where decrementing below the minimum lands.
const WRAP_DOWN_MINUTES: u32 = 60;

/// A validated countdown length in whole seconds, within
/// [`MIN_DURATION_SECS`]..=[`MAX_DURATION_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimerDuration(u32);

impl TimerDuration {
    pub fn from_secs(secs: u32) -> Result<Self, TimerError> {
        if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(TimerError::InvalidDuration { secs })
        }
    }

    pub fn from_minutes(minutes: u32) -> Result<Self, TimerError> {
        Self::from_secs(minutes.saturating_mul(60))
    }

    pub fn secs(self) -> u32 {
        self.0
    }

    /// Whole minutes, rounded down.
    pub fn minutes(self) -> u32 {
        self.0 / 60
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }

    /// Step the duration by `delta` whole minutes.
    ///
    /// Out-of-range results wrap instead of clamping: going below 1 minute
    /// lands on 60 minutes, going above 120 minutes lands on 1 minute.
    pub fn adjust_minutes(self, delta: i32) -> Self {
        let minutes = i64::from(self.minutes()) + i64::from(delta);
        let minutes = if minutes < MIN_MINUTES {
            WRAP_DOWN_MINUTES
        } else if minutes > MAX_MINUTES {
            MIN_MINUTES as u32
        } else {
            minutes as u32
        };
        Self(minutes * 60)
    }

    pub fn increment(self) -> Self {
        self.adjust_minutes(1)
    }

    pub fn decrement(self) -> Self {
        self.adjust_minutes(-1)
    }
}

impl Default for TimerDuration {
    fn default() -> Self {
        Self(DEFAULT_DURATION_SECS)
    }
}

impl TryFrom<u32> for TimerDuration {
    type Error = TimerError;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl From<TimerDuration> for u32 {
    fn from(duration: TimerDuration) -> Self {
        duration.0
    }
}

/// A one-tap duration choice offered on the configuration screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub label: &'static str,
    pub secs: u32,
}

impl Preset {
    pub fn duration(&self) -> TimerDuration {
        TimerDuration(self.secs)
    }
}

pub const PRESETS: [Preset; 6] = [
    Preset { label: "2 min", secs: 120 },
    Preset { label: "5 min", secs: 300 },
    Preset { label: "10 min", secs: 600 },
    Preset { label: "15 min", secs: 900 },
    Preset { label: "20 min", secs: 1200 },
    Preset { label: "30 min", secs: 1800 },
];
