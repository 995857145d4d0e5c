use avoid_core::LogSummary;
use serde::{Deserialize, Serialize};

/// Command velocity message for robot control
///
/// Positive `linear` drives forward, positive `angular` turns left
/// (counter-clockwise seen from above).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct CmdVel {
    pub stamp_nanos: u64,
    pub linear: f32,  // m/s forward velocity
    pub angular: f32, // rad/s turning velocity
}

impl CmdVel {
    /// Create a new CmdVel message with current timestamp
    pub fn new(linear: f32, angular: f32) -> Self {
        Self::with_timestamp(linear, angular, now_nanos())
    }

    /// Create a zero velocity command (stop)
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Create a CmdVel with explicit timestamp
    pub fn with_timestamp(linear: f32, angular: f32, stamp_nanos: u64) -> Self {
        Self {
            stamp_nanos,
            linear,
            angular,
        }
    }

    /// True when both velocity components are zero
    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }
}

fn now_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

impl Default for CmdVel {
    fn default() -> Self {
        Self::zero()
    }
}

impl LogSummary for CmdVel {
    fn log_summary(&self) -> String {
        format!("CmdVel(linear={:.2}, angular={:.2})", self.linear, self.angular)
    }
}

// Enable zero-copy serialization with bytemuck
unsafe impl bytemuck::Pod for CmdVel {}
unsafe impl bytemuck::Zeroable for CmdVel {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cmd_vel_creation() {
        let cmd = CmdVel::new(0.2, -0.5);
        assert_relative_eq!(cmd.linear, 0.2);
        assert_relative_eq!(cmd.angular, -0.5);
        assert!(cmd.stamp_nanos > 0);
    }

    #[test]
    fn test_cmd_vel_zero() {
        let cmd = CmdVel::zero();
        assert!(cmd.is_stop());
        assert!(!CmdVel::new(0.0, 0.5).is_stop());
    }

    #[test]
    fn test_cmd_vel_with_timestamp() {
        let cmd = CmdVel::with_timestamp(0.2, 0.0, 123456789);
        assert_eq!(cmd.stamp_nanos, 123456789);
    }

    #[test]
    fn test_bytemuck_traits() {
        let cmd = CmdVel::with_timestamp(1.0, 2.0, 7);
        let bytes: &[u8] = bytemuck::bytes_of(&cmd);
        assert_eq!(bytes.len(), 16);
        let back: CmdVel = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_json_shape() {
        let cmd = CmdVel::with_timestamp(0.2, 0.0, 1);
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"stamp_nanos":1,"linear":0.2,"angular":0.0}"#);
    }
}
