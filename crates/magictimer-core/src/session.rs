//! Session state machine.
//!
//! The session is a plain value. Every change goes through [`Session::apply`],
//! which updates the phase and returns the side effects the caller must run.
//! Nothing here touches a timer, a sound or a channel, so every transition
//! can be checked with ordinary unit tests.
//!
//! ## State Transitions
//!
//! ```text
//! Configuring --Start--> Running --SamplerCompleted--> Finished
//!      ^                    |                              |
//!      +----HoldConfirmed---+                              |
//!      +------------------Acknowledge----------------------+
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Activity, Catalog, Character};
use crate::error::TimerError;
use crate::timer::{Countdown, TimerDuration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Picking activity, character and duration. Also the idle state.
    Configuring,
    Running,
    /// Reserved. No transition enters this state.
    Paused,
    Finished,
}

/// Identifies one timing run. Callbacks tagged with an older run are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(u64);

impl RunId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Configuring,
    Running { run: RunId, started_at_ms: u64 },
    Finished { run: RunId },
}

/// Configuration accepted when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub duration_secs: u32,
    pub activity_id: String,
    pub character_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start { now_ms: u64 },
    SamplerCompleted { run: RunId },
    HoldConfirmed { run: RunId },
    Acknowledge,
}

/// Work the caller must carry out after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartSampler { run: RunId, countdown: Countdown },
    StopSampler,
    CancelHold,
    /// Alert, then announce `message`. The message is captured when the
    /// transition is taken.
    Notify { run: RunId, message: String },
    CancelNotification,
    StateChanged(SessionSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub status: SessionStatus,
    pub duration: TimerDuration,
    pub activity_id: String,
    pub character_id: String,
    pub started_at_ms: Option<u64>,
    pub run: Option<RunId>,
}

#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    phase: Phase,
    duration: TimerDuration,
    activity_id: String,
    character_id: String,
    session_id: Option<Uuid>,
    last_run: u64,
}

impl Session {
    /// A fresh session: first activity, first character, default duration.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_duration(catalog, TimerDuration::default())
    }

    pub fn with_duration(catalog: Arc<Catalog>, duration: TimerDuration) -> Self {
        let activity_id = catalog.default_activity().id.clone();
        let character_id = catalog.default_character().id.clone();
        Self {
            catalog,
            phase: Phase::Configuring,
            duration,
            activity_id,
            character_id,
            session_id: None,
            last_run: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::Configuring => SessionStatus::Configuring,
            Phase::Running { .. } => SessionStatus::Running,
            Phase::Finished { .. } => SessionStatus::Finished,
        }
    }

    pub fn duration(&self) -> TimerDuration {
        self.duration
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn activity(&self) -> &Activity {
        self.catalog
            .activity(&self.activity_id)
            .unwrap_or_else(|_| self.catalog.default_activity())
    }

    pub fn character(&self) -> &Character {
        self.catalog
            .character(&self.character_id)
            .unwrap_or_else(|_| self.catalog.default_character())
    }

    /// Defined only while running.
    pub fn started_at_ms(&self) -> Option<u64> {
        match self.phase {
            Phase::Running { started_at_ms, .. } => Some(started_at_ms),
            _ => None,
        }
    }

    pub fn run(&self) -> Option<RunId> {
        match self.phase {
            Phase::Running { run, .. } | Phase::Finished { run } => Some(run),
            Phase::Configuring => None,
        }
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.started_at_ms()
            .map(|started_at_ms| Countdown::new(started_at_ms, self.duration))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            status: self.status(),
            duration: self.duration,
            activity_id: self.activity_id.clone(),
            character_id: self.character_id.clone(),
            started_at_ms: self.started_at_ms(),
            run: self.run(),
        }
    }

    // ── Configuration (only while configuring) ───────────────────────

    /// Returns `Ok(false)` when ignored because the session is not
    /// configuring.
    pub fn select_activity(&mut self, id: &str) -> Result<bool, TimerError> {
        if !self.is_configuring() {
            return Ok(false);
        }
        self.activity_id = self.catalog.activity(id)?.id.clone();
        Ok(true)
    }

    pub fn select_character(&mut self, id: &str) -> Result<bool, TimerError> {
        if !self.is_configuring() {
            return Ok(false);
        }
        self.character_id = self.catalog.character(id)?.id.clone();
        Ok(true)
    }

    pub fn set_duration(&mut self, duration: TimerDuration) -> bool {
        if !self.is_configuring() {
            return false;
        }
        self.duration = duration;
        true
    }

    /// Step by whole minutes with wraparound, see
    /// [`TimerDuration::adjust_minutes`].
    pub fn adjust_minutes(&mut self, delta: i32) -> bool {
        let adjusted = self.duration.adjust_minutes(delta);
        self.set_duration(adjusted)
    }

    /// Apply a full start configuration. Everything is validated before
    /// anything is changed.
    pub fn configure(&mut self, request: &StartRequest) -> Result<bool, TimerError> {
        if !self.is_configuring() {
            return Ok(false);
        }
        let duration = TimerDuration::from_secs(request.duration_secs)?;
        let activity_id = self.catalog.activity(&request.activity_id)?.id.clone();
        let character_id = self.catalog.character(&request.character_id)?.id.clone();
        self.duration = duration;
        self.activity_id = activity_id;
        self.character_id = character_id;
        Ok(true)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Feed an event. Events that do not match a transition for the current
    /// phase, or that carry a stale run id, are ignored and yield no effects.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match (self.phase, event) {
            (Phase::Configuring, SessionEvent::Start { now_ms }) => {
                self.last_run += 1;
                let run = RunId(self.last_run);
                self.phase = Phase::Running {
                    run,
                    started_at_ms: now_ms,
                };
                self.session_id = Some(Uuid::new_v4());
                vec![
                    Effect::StartSampler {
                        run,
                        countdown: Countdown::new(now_ms, self.duration),
                    },
                    Effect::StateChanged(self.snapshot()),
                ]
            }
            (Phase::Running { run, .. }, SessionEvent::SamplerCompleted { run: done })
                if run == done =>
            {
                self.phase = Phase::Finished { run };
                vec![
                    Effect::StopSampler,
                    Effect::CancelHold,
                    Effect::StateChanged(self.snapshot()),
                    Effect::Notify {
                        run,
                        message: self.activity().end_message.clone(),
                    },
                ]
            }
            (Phase::Running { run, .. }, SessionEvent::HoldConfirmed { run: held })
                if run == held =>
            {
                self.phase = Phase::Configuring;
                self.session_id = None;
                vec![
                    Effect::StopSampler,
                    Effect::CancelHold,
                    Effect::StateChanged(self.snapshot()),
                ]
            }
            (Phase::Finished { .. }, SessionEvent::Acknowledge) => {
                self.phase = Phase::Configuring;
                self.session_id = None;
                vec![
                    Effect::CancelNotification,
                    Effect::CancelHold,
                    Effect::StateChanged(self.snapshot()),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn is_configuring(&self) -> bool {
        self.phase == Phase::Configuring
    }
}
