//! Run configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default trailing buffer added to every clip (seconds).
pub const DEFAULT_BUFFER_SECS: f64 = 0.5;

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("buffer must be a finite value >= 0, got {0}")]
    InvalidBuffer(f64),

    #[error("time_offset must be finite, got {0}")]
    InvalidTimeOffset(f64),

    #[error("start_number must be >= 1, got {0}")]
    InvalidStartNumber(u32),

    #[error("start_number {start_number} leaves no room for {events} clip numbers")]
    ClipNumberOverflow { start_number: u32, events: usize },

    #[error("unreadable run configuration: {0}")]
    Parse(String),
}

/// Parameters for one pipeline run.
///
/// Immutable once a run starts and passed explicitly to every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunConfig {
    /// Cut the source video into clips
    #[serde(default = "default_true")]
    pub split_video: bool,

    /// Write a metadata sidecar per clip
    #[serde(default = "default_true")]
    pub create_metadata: bool,

    /// Events at 1-based position below this value are left out
    #[serde(default)]
    pub skip: u32,

    /// Re-encode for frame-exact cuts instead of stream copy
    #[serde(default)]
    pub reencode: bool,

    /// Seconds added to every event position (may be negative)
    #[serde(default)]
    pub time_offset: f64,

    /// Seconds added to every event duration
    #[serde(default = "default_buffer")]
    pub buffer: f64,

    /// Clip number assigned to the first event
    #[serde(default = "default_start_number")]
    pub start_number: u32,
}

fn default_true() -> bool {
    true
}
fn default_buffer() -> f64 {
    DEFAULT_BUFFER_SECS
}
fn default_start_number() -> u32 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            split_video: true,
            create_metadata: true,
            skip: 0,
            reencode: false,
            time_offset: 0.0,
            buffer: DEFAULT_BUFFER_SECS,
            start_number: 1,
        }
    }
}

impl RunConfig {
    /// Split only, no sidecars.
    pub fn split_only() -> Self {
        Self {
            create_metadata: false,
            ..Default::default()
        }
    }

    /// Sidecars for clips that already exist.
    pub fn sidecars_only() -> Self {
        Self {
            split_video: false,
            ..Default::default()
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(ConfigError::InvalidBuffer(self.buffer));
        }
        if !self.time_offset.is_finite() {
            return Err(ConfigError::InvalidTimeOffset(self.time_offset));
        }
        if self.start_number < 1 {
            return Err(ConfigError::InvalidStartNumber(self.start_number));
        }
        Ok(())
    }

    /// Check that `event_count` events numbered from `start_number` stay within `u32`.
    pub fn check_clip_numbers(&self, event_count: usize) -> Result<(), ConfigError> {
        let overflow = || ConfigError::ClipNumberOverflow {
            start_number: self.start_number,
            events: event_count,
        };
        let last_index = u32::try_from(event_count.saturating_sub(1)).map_err(|_| overflow())?;
        self.start_number
            .checked_add(last_index)
            .map(|_| ())
            .ok_or_else(overflow)
    }

    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert!(config.split_video);
        assert!(config.create_metadata);
        assert_eq!(config.skip, 0);
        assert!(!config.reencode);
        assert_eq!(config.buffer, 0.5);
        assert_eq!(config.start_number, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = RunConfig::from_json(r#"{"skip": 3, "time_offset": -1.5}"#).unwrap();
        assert_eq!(config.skip, 3);
        assert_eq!(config.time_offset, -1.5);
        assert_eq!(config.buffer, 0.5);
        assert_eq!(config.start_number, 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let negative_buffer = RunConfig {
            buffer: -0.1,
            ..Default::default()
        };
        assert_eq!(
            negative_buffer.validate(),
            Err(ConfigError::InvalidBuffer(-0.1))
        );

        let zero_start = RunConfig {
            start_number: 0,
            ..Default::default()
        };
        assert!(zero_start.validate().is_err());
        assert_eq!(
            RunConfig::from_json(r#"{"start_number": 0}"#),
            Err(ConfigError::InvalidStartNumber(0))
        );
        assert!(matches!(
            RunConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_clip_numbers_must_fit() {
        let near_max = RunConfig {
            start_number: u32::MAX - 1,
            ..Default::default()
        };
        assert!(near_max.validate().is_ok());
        assert!(near_max.check_clip_numbers(2).is_ok());
        assert_eq!(
            near_max.check_clip_numbers(3),
            Err(ConfigError::ClipNumberOverflow {
                start_number: u32::MAX - 1,
                events: 3
            })
        );
        assert!(RunConfig::default().check_clip_numbers(0).is_ok());
    }
}
