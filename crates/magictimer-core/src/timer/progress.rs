//! What the presentation layer draws for a given remaining time.
//!
//! The view is a plain value: percentage for the fill, a big number with its
//! unit, the icon travelling along the bar and a short cheer line.

use serde::{Deserialize, Serialize};

use super::countdown::percent_remaining;

/// Below this percentage the character gives way to a sparkle.
const MARKER_MIN_PERCENT: f64 = 5.0;
/// Above this many seconds the cheer stays relaxed.
const CHEER_RELAXED_ABOVE_SECS: u32 = 10;

pub const SPARKLE: &str = "✨";
pub const CHEER_RELAXED: &str = "Aproveite! 🎉";
pub const CHEER_ALMOST: &str = "Quase lá! ⏳";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    Minutes,
    Seconds,
}

impl DisplayUnit {
    pub fn label(self) -> &'static str {
        match self {
            DisplayUnit::Minutes => "min",
            DisplayUnit::Seconds => "seg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    pub remaining_secs: u32,
    pub duration_secs: u32,
    /// 0.0 ..= 100.0, share of time still left.
    pub percent: f64,
    pub display_value: u32,
    pub display_unit: DisplayUnit,
    pub marker: String,
    pub cheer: String,
}

impl ProgressView {
    pub fn at(remaining_secs: u32, duration_secs: u32, character_icon: &str) -> Self {
        let percent = percent_remaining(remaining_secs, duration_secs);
        let (display_value, display_unit) = if remaining_secs > 60 {
            (remaining_secs.div_ceil(60), DisplayUnit::Minutes)
        } else {
            (remaining_secs, DisplayUnit::Seconds)
        };
        let marker = if percent > MARKER_MIN_PERCENT {
            character_icon
        } else {
            SPARKLE
        };
        let cheer = if remaining_secs > CHEER_RELAXED_ABOVE_SECS {
            CHEER_RELAXED
        } else {
            CHEER_ALMOST
        };

        Self {
            remaining_secs,
            duration_secs,
            percent,
            display_value,
            display_unit,
            marker: marker.to_string(),
            cheer: cheer.to_string(),
        }
    }

    /// e.g. "4 min" or "37 seg".
    pub fn display(&self) -> String {
        format!("{} {}", self.display_value, self.display_unit.label())
    }
}

/// Format seconds as "MM:SS" (minutes may exceed 59).
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_round_up_above_one_minute() {
        let view = ProgressView::at(61, 300, "🦖");
        assert_eq!(view.display_value, 2);
        assert_eq!(view.display_unit, DisplayUnit::Minutes);
        assert_eq!(view.display(), "2 min");

        let view = ProgressView::at(240, 300, "🦖");
        assert_eq!(view.display(), "4 min");
    }

    #[test]
    fn seconds_from_one_minute_down() {
        let view = ProgressView::at(60, 300, "🦖");
        assert_eq!(view.display(), "60 seg");
        assert_eq!(ProgressView::at(0, 300, "🦖").display(), "0 seg");
    }

    #[test]
    fn marker_turns_into_sparkle_near_the_end() {
        assert_eq!(ProgressView::at(120, 1200, "🚀").marker, "🚀");
        assert_eq!(ProgressView::at(60, 1200, "🚀").marker, SPARKLE);
    }

    #[test]
    fn cheer_changes_in_the_last_ten_seconds() {
        assert_eq!(ProgressView::at(11, 60, "🐰").cheer, CHEER_RELAXED);
        assert_eq!(ProgressView::at(10, 60, "🐰").cheer, CHEER_ALMOST);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(299), "04:59");
        assert_eq!(format_clock(7200), "120:00");
    }
}
