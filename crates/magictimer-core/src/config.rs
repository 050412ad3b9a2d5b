//! TOML-based timer configuration.
//!
//! Every field has a default, so an empty file (or no file) gives the
//! standard behaviour:
//! - progress sampled once per second
//! - hold gesture of 20 ms steps adding 2 up to 100
//! - spoken message 1500 ms after the alert starts
//! - 5 minute default duration
//!
//! The configuration is read-only; nothing here writes to disk.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timer::{HoldAccumulator, TimerDuration};

/// Environment variable naming a config file when no path is given.
pub const CONFIG_ENV: &str = "MAGICTIMER_CONFIG";

/// Hold-to-confirm gesture settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldConfig {
    #[serde(default = "default_hold_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_hold_step")]
    pub step: u8,
    #[serde(default = "default_hold_threshold")]
    pub threshold: u8,
}

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_announce_delay_ms")]
    pub announce_delay_ms: u64,
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
    #[serde(default)]
    pub hold: HoldConfig,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_announce_delay_ms() -> u64 {
    1500
}
fn default_duration_secs() -> u32 {
    300
}
fn default_hold_interval_ms() -> u64 {
    20
}
fn default_hold_step() -> u8 {
    2
}
fn default_hold_threshold() -> u8 {
    100
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_hold_interval_ms(),
            step: default_hold_step(),
            threshold: default_hold_threshold(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            announce_delay_ms: default_announce_delay_ms(),
            default_duration_secs: default_duration_secs(),
            hold: HoldConfig::default(),
        }
    }
}

impl TimerConfig {
    /// Parse and validate TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::InvalidValue`]
    /// when a value is out of range.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let cfg: TimerConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load from `path` if given, else from the file named by
    /// [`CONFIG_ENV`], else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file cannot be loaded.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) if !path.is_empty() => Self::load_from(path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", "must be greater than 0"));
        }
        if self.hold.interval_ms == 0 {
            return Err(invalid("hold.interval_ms", "must be greater than 0"));
        }
        if self.hold.step == 0 {
            return Err(invalid("hold.step", "must be greater than 0"));
        }
        if !(1..=100).contains(&self.hold.threshold) {
            return Err(invalid("hold.threshold", "must be between 1 and 100"));
        }
        TimerDuration::from_secs(self.default_duration_secs)
            .map_err(|e| invalid("default_duration_secs", &e.to_string()))?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn announce_delay(&self) -> Duration {
        Duration::from_millis(self.announce_delay_ms)
    }

    pub fn hold_interval(&self) -> Duration {
        Duration::from_millis(self.hold.interval_ms)
    }

    pub fn hold_accumulator(&self) -> HoldAccumulator {
        HoldAccumulator::new(self.hold.step, self.hold.threshold)
    }

    /// Falls back to the built-in default if the value has not been
    /// validated.
    pub fn default_duration(&self) -> TimerDuration {
        TimerDuration::from_secs(self.default_duration_secs).unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        if key.is_empty() {
            return None;
        }
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its value, in dotted form, sorted by key.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            flatten("", &json, &mut out);
        }
        out.sort();
        out
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = TimerConfig::parse("").unwrap();
        assert_eq!(cfg, TimerConfig::default());
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
        assert_eq!(cfg.hold_interval(), Duration::from_millis(20));
        assert_eq!(cfg.announce_delay(), Duration::from_millis(1500));
        assert_eq!(cfg.default_duration().secs(), 300);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let cfg = TimerConfig::parse(
            r#"
            announce_delay_ms = 2000

            [hold]
            step = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.announce_delay_ms, 2000);
        assert_eq!(cfg.hold.step, 5);
        assert_eq!(cfg.hold.threshold, 100);
        assert_eq!(cfg.tick_interval_ms, 1000);
    }

    #[test]
    fn default_roundtrip() {
        let cfg = TimerConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(TimerConfig::parse(&toml_str).unwrap(), cfg);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = TimerConfig::parse("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tick_interval_ms"));

        let err = TimerConfig::parse("[hold]\nthreshold = 101").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "hold.threshold"));

        let err = TimerConfig::parse("[hold]\nstep = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "hold.step"));

        let err = TimerConfig::parse("default_duration_secs = 30").unwrap_err();
        assert!(err.to_string().contains("default_duration_secs"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = TimerConfig::parse("tick_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_duration_secs = 600").unwrap();
        let cfg = TimerConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.default_duration().minutes(), 10);

        let cfg = TimerConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(cfg.default_duration_secs, 600);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TimerConfig::load_from(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn get_and_list_by_dotted_key() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.get("hold.step").as_deref(), Some("2"));
        assert_eq!(cfg.get("announce_delay_ms").as_deref(), Some("1500"));
        assert_eq!(cfg.get("hold.missing"), None);
        assert_eq!(cfg.get(""), None);

        let keys: Vec<String> = cfg.list().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "announce_delay_ms",
                "default_duration_secs",
                "hold.interval_ms",
                "hold.step",
                "hold.threshold",
                "tick_interval_ms",
            ]
        );
    }
}
