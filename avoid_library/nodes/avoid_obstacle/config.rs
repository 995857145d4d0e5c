use crate::algorithms::sector_avoidance::{
    MotionProfile, SafetyThreshold, SectorAvoidancePolicy, SectorLayout,
};
use avoid_core::{AvoidError, AvoidResult, RuntimeParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the node publishes when a scan is too short to sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedScanPolicy {
    /// Publish nothing for that scan
    Skip,
    /// Publish a zero-velocity command
    #[default]
    SafeStop,
}

impl FromStr for MalformedScanPolicy {
    type Err = AvoidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedScanPolicy::Skip),
            "safe_stop" | "stop" => Ok(MalformedScanPolicy::SafeStop),
            other => Err(AvoidError::InvalidConfig(format!(
                "unknown malformed_scan_policy '{}', expected 'skip' or 'safe_stop'",
                other
            ))),
        }
    }
}

impl fmt::Display for MalformedScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedScanPolicy::Skip => write!(f, "skip"),
            MalformedScanPolicy::SafeStop => write!(f, "safe_stop"),
        }
    }
}

/// Validated settings for [`AvoidObstacleNode`](super::AvoidObstacleNode)
///
/// Read once when the node is built. Changing [`RuntimeParams`] afterwards
/// does not affect a running node.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceConfig {
    pub threshold: SafetyThreshold,
    pub motion: MotionProfile,
    pub layout: SectorLayout,
    pub malformed_scan_policy: MalformedScanPolicy,
    pub scan_topic: String,
    pub cmd_topic: String,
    pub scan_queue_depth: usize,
    pub cmd_queue_depth: usize,
}

impl AvoidanceConfig {
    /// Build from a parameter store, rejecting values of the wrong type or
    /// out of range
    pub fn from_params(params: &RuntimeParams) -> AvoidResult<Self> {
        let defaults = Self::default();

        let threshold = SafetyThreshold::new(read(
            params,
            "safety_threshold",
            defaults.threshold.meters() as f64,
        )? as f32)?;
        let motion = MotionProfile::new(
            read(params, "forward_speed", defaults.motion.forward_speed() as f64)? as f32,
            read(params, "turn_rate", defaults.motion.turn_rate() as f64)? as f32,
        )?;
        let layout = SectorLayout::for_resolution(read(params, "beams_per_revolution", 360usize)?)?;
        let malformed_scan_policy: MalformedScanPolicy =
            read::<String>(params, "malformed_scan_policy", defaults.malformed_scan_policy.to_string())?
                .parse()?;

        let config = Self {
            threshold,
            motion,
            layout,
            malformed_scan_policy,
            scan_topic: read(params, "scan_topic", defaults.scan_topic)?,
            cmd_topic: read(params, "cmd_topic", defaults.cmd_topic)?,
            scan_queue_depth: read(params, "scan_queue_depth", defaults.scan_queue_depth)?,
            cmd_queue_depth: read(params, "cmd_queue_depth", defaults.cmd_queue_depth)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the threshold, validating the new value
    pub fn with_threshold(mut self, meters: f32) -> AvoidResult<Self> {
        self.threshold = SafetyThreshold::new(meters)?;
        Ok(self)
    }

    pub fn with_malformed_scan_policy(mut self, policy: MalformedScanPolicy) -> Self {
        self.malformed_scan_policy = policy;
        self
    }

    /// Policy configured from this snapshot
    pub fn policy(&self) -> SectorAvoidancePolicy {
        SectorAvoidancePolicy::new(self.threshold, self.motion)
    }

    fn validate(&self) -> AvoidResult<()> {
        if self.scan_topic.is_empty() || self.cmd_topic.is_empty() {
            return Err(AvoidError::InvalidConfig(
                "topic names must not be empty".to_string(),
            ));
        }
        if self.scan_topic == self.cmd_topic {
            return Err(AvoidError::InvalidConfig(format!(
                "scan and command topics must differ, both are '{}'",
                self.scan_topic
            )));
        }
        if self.scan_queue_depth == 0 || self.cmd_queue_depth == 0 {
            return Err(AvoidError::InvalidConfig(
                "queue depths must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            threshold: SafetyThreshold::default(),
            motion: MotionProfile::default(),
            layout: SectorLayout::default(),
            malformed_scan_policy: MalformedScanPolicy::default(),
            scan_topic: "scan".to_string(),
            cmd_topic: "cmd_vel".to_string(),
            scan_queue_depth: 5,
            cmd_queue_depth: 10,
        }
    }
}

fn read<T>(params: &RuntimeParams, key: &str, default: T) -> AvoidResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    if !params.has(key) {
        return Ok(default);
    }
    params.get(key).ok_or_else(|| {
        AvoidError::InvalidConfig(format!("parameter '{}' has the wrong type", key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::sector_avoidance::SectorRole;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_params() {
        let config = AvoidanceConfig::from_params(&RuntimeParams::new()).unwrap();
        assert_relative_eq!(config.threshold.meters(), 0.4);
        assert_relative_eq!(config.motion.forward_speed(), 0.2);
        assert_relative_eq!(config.motion.turn_rate(), 0.5);
        assert_eq!(config.layout, SectorLayout::default());
        assert_eq!(config.malformed_scan_policy, MalformedScanPolicy::SafeStop);
        assert_eq!(config.scan_topic, "scan");
        assert_eq!(config.cmd_topic, "cmd_vel");
        assert_eq!(config.scan_queue_depth, 5);
        assert_eq!(config.cmd_queue_depth, 10);
    }

    #[test]
    fn test_overrides() {
        let params = RuntimeParams::new();
        params.set("safety_threshold", 0.8).unwrap();
        params.set("beams_per_revolution", 720).unwrap();
        params.set("malformed_scan_policy", "skip").unwrap();
        let config = AvoidanceConfig::from_params(&params).unwrap();
        assert_relative_eq!(config.threshold.meters(), 0.8);
        assert_eq!(config.layout.index(SectorRole::FarLeft), 120);
        assert_eq!(config.malformed_scan_policy, MalformedScanPolicy::Skip);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let params = RuntimeParams::new();
        params.remove("safety_threshold");
        params.remove("cmd_topic");
        let config = AvoidanceConfig::from_params(&params).unwrap();
        assert_relative_eq!(config.threshold.meters(), 0.4);
        assert_eq!(config.cmd_topic, "cmd_vel");
    }

    #[test]
    fn test_rejects_bad_values() {
        let params = RuntimeParams::new();
        params.set("safety_threshold", -1.0).unwrap();
        assert!(AvoidanceConfig::from_params(&params).is_err());

        let params = RuntimeParams::new();
        params.set("safety_threshold", "close").unwrap();
        assert!(matches!(
            AvoidanceConfig::from_params(&params),
            Err(AvoidError::InvalidConfig(_))
        ));

        let params = RuntimeParams::new();
        params.set("malformed_scan_policy", "panic").unwrap();
        assert!(AvoidanceConfig::from_params(&params).is_err());

        let params = RuntimeParams::new();
        params.set("cmd_topic", "scan").unwrap();
        assert!(AvoidanceConfig::from_params(&params).is_err());

        let params = RuntimeParams::new();
        params.set("scan_queue_depth", 0).unwrap();
        assert!(AvoidanceConfig::from_params(&params).is_err());

        let params = RuntimeParams::new();
        params.set("beams_per_revolution", usize::MAX).unwrap();
        assert!(matches!(
            AvoidanceConfig::from_params(&params),
            Err(AvoidError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_snapshot_ignores_later_writes() {
        let params = RuntimeParams::new();
        let config = AvoidanceConfig::from_params(&params).unwrap();
        params.set("safety_threshold", 2.0).unwrap();
        assert_relative_eq!(config.policy().threshold().meters(), 0.4);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("SKIP".parse::<MalformedScanPolicy>().unwrap(), MalformedScanPolicy::Skip);
        assert_eq!(
            "safe_stop".parse::<MalformedScanPolicy>().unwrap(),
            MalformedScanPolicy::SafeStop
        );
        assert_eq!(MalformedScanPolicy::SafeStop.to_string(), "safe_stop");
    }
}
