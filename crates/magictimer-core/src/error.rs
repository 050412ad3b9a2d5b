//! Core error types for magictimer-core.
//!
//! Timing and state-machine errors fail the triggering call with no state
//! change. Notifier errors never reach the state machine; they are logged at
//! the notifier boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::{MAX_DURATION_SECS, MIN_DURATION_SECS};

/// Core error type for magictimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer and session errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Completion notifier errors
    #[error("Notifier error: {0}")]
    Notifier(#[from] NotifierError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the countdown, sampler, hold gate and session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Duration outside the accepted range
    #[error(
        "Invalid duration: {secs}s (must be between {}s and {}s)",
        MIN_DURATION_SECS,
        MAX_DURATION_SECS
    )]
    InvalidDuration { secs: u32 },

    /// The host cannot provide timer scheduling
    #[error("Timer scheduling is unavailable: no async runtime is running")]
    SchedulingUnavailable,

    /// A sampling run is already active
    #[error("Progress sampler is already running")]
    SamplerBusy,

    /// Activity id not present in the catalog
    #[error("Unknown activity: {0}")]
    UnknownActivity(String),

    /// Character id not present in the catalog
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures reported by the sound/speech collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifierError {
    /// The alert sound could not be played
    #[error("Alert failed: {0}")]
    Alert(String),

    /// The spoken message could not be produced
    #[error("Announcement failed: {0}")]
    Announce(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
