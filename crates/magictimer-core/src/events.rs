use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;
use crate::timer::ProgressView;

/// Everything the presentation layer needs to redraw.
/// Hosts receive these on the controller's event channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A progress sample. Remaining time never increases within a run.
    Tick {
        remaining_secs: u32,
        progress: ProgressView,
        at: DateTime<Utc>,
    },
    StateChanged {
        snapshot: SessionSnapshot,
        at: DateTime<Utc>,
    },
    /// Hold-to-stop gesture fill, 0..=100. Drops back to 0 on release.
    HoldProgress {
        percent: u8,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn tick(remaining_secs: u32, progress: ProgressView) -> Self {
        Event::Tick {
            remaining_secs,
            progress,
            at: Utc::now(),
        }
    }

    pub fn state_changed(snapshot: SessionSnapshot) -> Self {
        Event::StateChanged {
            snapshot,
            at: Utc::now(),
        }
    }

    pub fn hold_progress(percent: u8) -> Self {
        Event::HoldProgress {
            percent,
            at: Utc::now(),
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::Tick { at, .. } | Event::StateChanged { at, .. } | Event::HoldProgress { at, .. } => {
                *at
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::tick(42, ProgressView::at(42, 60, "🦖"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Tick");
        assert_eq!(json["remaining_secs"], 42);
        assert_eq!(json["progress"]["display_unit"], "seconds");
        assert!(json["at"].is_string());

        let json = serde_json::to_value(Event::hold_progress(40)).unwrap();
        assert_eq!(json["type"], "HoldProgress");
        assert_eq!(json["percent"], 40);
    }

    #[test]
    fn deserializes_back() {
        let event = Event::hold_progress(8);
        let text = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&text).unwrap();
        assert!(matches!(parsed, Event::HoldProgress { percent: 8, .. }));
        assert_eq!(parsed.at(), event.at());
    }
}
