// src/domain/config.rs
//
// Monitor thresholds.
//
// Options arrive partially filled (camelCase names, milliseconds) and are
// merged over the defaults. The merged config is immutable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{VidmonError, VidmonResult};

pub const DEFAULT_TIMEUPDATE_THRESHOLD_MS: u64 = 10 * 1000;
pub const DEFAULT_JOINTIME_THRESHOLD_MS: u64 = 30 * 1000;
pub const DEFAULT_PLAY_AFTER_WAITING_THRESHOLD_MS: u64 = 5 * 1000;
pub const DEFAULT_WAITING_TS_DIFF_THRESHOLD_MS: u64 = 60 * 1000;

/// Partial configuration as supplied by the host.
///
/// Field names keep the historical spelling used by existing integrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorOptions {
    #[serde(rename = "timeupdateThreshold", default, skip_serializing_if = "Option::is_none")]
    pub timeupdate_threshold: Option<u64>,

    #[serde(rename = "jointimeThershold", default, skip_serializing_if = "Option::is_none")]
    pub jointime_threshold: Option<u64>,

    #[serde(rename = "playAfterWaitingThershold", default, skip_serializing_if = "Option::is_none")]
    pub play_after_waiting_threshold: Option<u64>,

    #[serde(rename = "waitingTSDiffThershold", default, skip_serializing_if = "Option::is_none")]
    pub waiting_ts_diff_threshold: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Max silence between `timeupdate` events before VISUAL_STALL
    pub timeupdate_threshold: Duration,
    /// Max time from `play` to the first `timeupdate` before LONG_JOIN_TIME
    pub jointime_threshold: Duration,
    /// Max time from `waiting` to the next `timeupdate` before LONG_WAITING_TIME
    pub play_after_waiting_threshold: Duration,
    /// Window in which four waiting occurrences raise MULTI_WAITING_IN_ROW
    pub waiting_ts_diff_threshold: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            timeupdate_threshold: Duration::from_millis(DEFAULT_TIMEUPDATE_THRESHOLD_MS),
            jointime_threshold: Duration::from_millis(DEFAULT_JOINTIME_THRESHOLD_MS),
            play_after_waiting_threshold: Duration::from_millis(
                DEFAULT_PLAY_AFTER_WAITING_THRESHOLD_MS,
            ),
            waiting_ts_diff_threshold: Duration::from_millis(DEFAULT_WAITING_TS_DIFF_THRESHOLD_MS),
        }
    }
}

impl MonitorConfig {
    /// Merge options over the defaults and validate the result.
    pub fn from_options(options: &MonitorOptions) -> VidmonResult<Self> {
        let defaults = Self::default();
        let pick = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };

        let config = Self {
            timeupdate_threshold: pick(options.timeupdate_threshold, defaults.timeupdate_threshold),
            jointime_threshold: pick(options.jointime_threshold, defaults.jointime_threshold),
            play_after_waiting_threshold: pick(
                options.play_after_waiting_threshold,
                defaults.play_after_waiting_threshold,
            ),
            waiting_ts_diff_threshold: pick(
                options.waiting_ts_diff_threshold,
                defaults.waiting_ts_diff_threshold,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON options object, e.g. `{"jointimeThershold": 15000}`.
    pub fn from_json(json: &str) -> VidmonResult<Self> {
        let options: MonitorOptions = serde_json::from_str(json)?;
        Self::from_options(&options)
    }

    pub fn validate(&self) -> VidmonResult<()> {
        let thresholds = [
            ("timeupdateThreshold", self.timeupdate_threshold),
            ("jointimeThershold", self.jointime_threshold),
            ("playAfterWaitingThershold", self.play_after_waiting_threshold),
            ("waitingTSDiffThershold", self.waiting_ts_diff_threshold),
        ];

        for (name, value) in thresholds {
            if value.is_zero() {
                return Err(VidmonError::InvalidThreshold { name });
            }
        }
        Ok(())
    }

    /// Back to the option form with every field explicit.
    pub fn to_options(&self) -> MonitorOptions {
        MonitorOptions {
            timeupdate_threshold: Some(self.timeupdate_threshold.as_millis() as u64),
            jointime_threshold: Some(self.jointime_threshold.as_millis() as u64),
            play_after_waiting_threshold: Some(self.play_after_waiting_threshold.as_millis() as u64),
            waiting_ts_diff_threshold: Some(self.waiting_ts_diff_threshold.as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options_yield_defaults() {
        let config = MonitorConfig::from_options(&MonitorOptions::default()).unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.timeupdate_threshold, Duration::from_secs(10));
        assert_eq!(config.jointime_threshold, Duration::from_secs(30));
        assert_eq!(config.play_after_waiting_threshold, Duration::from_secs(5));
        assert_eq!(config.waiting_ts_diff_threshold, Duration::from_secs(60));
    }

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = MonitorConfig::from_json("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_explicit_values_override_only_their_field() {
        let config = MonitorConfig::from_json(r#"{"jointimeThershold": 15000}"#).unwrap();
        assert_eq!(config.jointime_threshold, Duration::from_secs(15));
        assert_eq!(config.timeupdate_threshold, Duration::from_secs(10));
        assert_eq!(config.play_after_waiting_threshold, Duration::from_secs(5));
        assert_eq!(config.waiting_ts_diff_threshold, Duration::from_secs(60));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let first = MonitorConfig::from_json(r#"{"timeupdateThreshold": 4000}"#).unwrap();
        let second = MonitorConfig::from_options(&first.to_options()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"playAfterWaitingThershold": 0}"#).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(
            err,
            VidmonError::InvalidThreshold { name: "playAfterWaitingThershold" }
        ));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = MonitorConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, VidmonError::Serialization(_)));
    }
}
