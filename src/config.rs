//! Rollback configuration
//!
//! Plain serde struct; the host decides where it comes from. JSON loading
//! is provided for the demo runner and tests.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with a hit submitted while another is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentPolicy {
    /// Queue behind the pending hit (bounded by `max_pending_hits`)
    #[default]
    Queue,
    /// Reject while any hit is pending
    Reject,
}

impl ConcurrentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcurrentPolicy::Queue => "queue",
            ConcurrentPolicy::Reject => "reject",
        }
    }

}

impl FromStr for ConcurrentPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queue" => Ok(ConcurrentPolicy::Queue),
            "reject" => Ok(ConcurrentPolicy::Reject),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Rollback engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    /// Seconds of simulation retained for rollback
    pub history_duration_seconds: f64,
    /// Simulation rate (fixed timestep = 1 / ticks_per_second)
    pub ticks_per_second: u32,
    /// Replay budget per rollback; longer replays are clamped
    pub max_frames_per_resimulation: u32,
    /// Capture a snapshot every N live ticks
    pub capture_interval_ticks: u32,
    /// Handling of hits submitted while one is pending
    pub concurrent_policy: ConcurrentPolicy,
    /// Queue bound for `ConcurrentPolicy::Queue`
    pub max_pending_hits: usize,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            history_duration_seconds: 5.0,
            ticks_per_second: 60,
            max_frames_per_resimulation: 300,
            capture_interval_ticks: 1,
            concurrent_policy: ConcurrentPolicy::Queue,
            max_pending_hits: 16,
        }
    }
}

impl RollbackConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded rollback config: {}s @ {} Hz, {} snapshots, budget {} frames",
            config.history_duration_seconds,
            config.ticks_per_second,
            config.history_capacity(),
            config.max_frames_per_resimulation
        );
        Ok(config)
    }

    /// Reject configurations that would produce an unusable history
    pub fn validate(&self) -> Result<(), ConfigError> {
        let duration = self.history_duration_seconds;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ConfigError::InvalidDuration(duration));
        }
        if self.ticks_per_second == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.capture_interval_ticks == 0 {
            return Err(ConfigError::ZeroCaptureInterval);
        }
        if self.max_frames_per_resimulation == 0 {
            return Err(ConfigError::ZeroFrameBudget);
        }
        if self.history_capacity() == 0 {
            return Err(ConfigError::ZeroCapacity {
                duration,
                ticks_per_second: self.ticks_per_second,
            });
        }
        Ok(())
    }

    /// Fixed simulation timestep in seconds
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.ticks_per_second.max(1) as f32
    }

    /// Ticks covered by the history window
    pub fn window_ticks(&self) -> usize {
        (self.history_duration_seconds * f64::from(self.ticks_per_second)).round() as usize
    }

    /// Snapshot slots (window ticks divided by capture cadence)
    pub fn history_capacity(&self) -> usize {
        let interval = self.capture_interval_ticks.max(1) as usize;
        self.window_ticks().div_ceil(interval)
    }

    /// Input journal slots; covers every tick back to the oldest snapshot
    pub fn journal_capacity(&self) -> usize {
        self.history_capacity() * self.capture_interval_ticks.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let config = RollbackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_capacity(), 300);
        assert_eq!(config.journal_capacity(), 300);
        assert!((config.fixed_dt() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn test_capture_interval_shrinks_history() {
        let config = RollbackConfig {
            capture_interval_ticks: 4,
            ..Default::default()
        };
        assert_eq!(config.history_capacity(), 75);
        assert_eq!(config.journal_capacity(), 300);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = RollbackConfig {
            history_duration_seconds: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidDuration(0.0)));

        let config = RollbackConfig {
            ticks_per_second: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickRate));

        let config = RollbackConfig {
            max_frames_per_resimulation: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroFrameBudget));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            RollbackConfig::from_json_str(r#"{"ticks_per_second": 120, "concurrent_policy": "reject"}"#)
                .unwrap();
        assert_eq!(config.ticks_per_second, 120);
        assert_eq!(config.concurrent_policy, ConcurrentPolicy::Reject);
        assert_eq!(config.history_duration_seconds, 5.0);
        assert_eq!(config.history_capacity(), 600);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            RollbackConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RollbackConfig::from_json_str(r#"{"capture_interval_ticks": 0}"#),
            Err(ConfigError::ZeroCaptureInterval)
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Queue".parse::<ConcurrentPolicy>(), Ok(ConcurrentPolicy::Queue));
        assert_eq!("reject".parse::<ConcurrentPolicy>(), Ok(ConcurrentPolicy::Reject));
        assert_eq!(
            "drop".parse::<ConcurrentPolicy>(),
            Err(ConfigError::UnknownPolicy("drop".to_string()))
        );
        for policy in [ConcurrentPolicy::Queue, ConcurrentPolicy::Reject] {
            assert_eq!(policy.as_str().parse::<ConcurrentPolicy>(), Ok(policy));
        }
    }
}
