//! # Magic Timer Core Library
//!
//! Core logic for a visual countdown timer for young children. A caregiver
//! picks an activity, a companion character and a duration; the timer shows
//! the time running out and, when it ends, plays an alert followed by a
//! spoken message about what comes next.
//!
//! ## Architecture
//!
//! - **Countdown**: remaining time derived from absolute clock readings, so
//!   late timer callbacks never skew it
//! - **Session**: a pure state machine (configuring, running, finished) whose
//!   transitions return the effects to perform
//! - **Controller**: runs those effects on a tokio-backed scheduler and
//!   publishes [`Event`]s for the presentation layer
//! - **Hold gate**: a press-and-hold gesture that must be kept up for a
//!   second before it cancels a running timer
//!
//! ## Key Components
//!
//! - [`TimerController`]: entry point for hosts
//! - [`Session`]: the state machine
//! - [`ProgressSampler`]: periodic progress emission
//! - [`HoldGate`]: hold-to-confirm gesture
//! - [`CompletionNotifier`]: trait for the host's sound and speech
//! - [`TimerConfig`]: timing configuration

pub mod catalog;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod notifier;
pub mod scheduler;
pub mod session;
pub mod timer;

pub use catalog::{Activity, Catalog, Character};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{HoldConfig, TimerConfig, CONFIG_ENV};
pub use controller::TimerController;
pub use error::{ConfigError, CoreError, NotifierError, TimerError};
pub use events::Event;
pub use notifier::{notify_completion, CompletionNotifier, LogNotifier, NotifyFuture, NotifyOutcome};
pub use scheduler::{Scheduler, TaskControl, TaskHandle, TokioScheduler};
pub use session::{
    Effect, RunId, Session, SessionEvent, SessionSnapshot, SessionStatus, StartRequest,
};
pub use timer::{
    format_clock, Countdown, HoldGate, ProgressSampler, ProgressView, TimerDuration, PRESETS,
};
