use avoid_core::LogSummary;
use serde::{Deserialize, Serialize};

/// One sweep of a planar range sensor
///
/// `ranges[i]` is the distance measured along the beam at
/// `angle_min + i * angle_increment`. A beam with no return is reported as a
/// non-finite value (usually `+inf`). JSON has no infinity, so such beams
/// serialize as `null` and `null` deserializes back to `+inf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserScan {
    /// Range readings in meters
    #[serde(deserialize_with = "deserialize_ranges")]
    pub ranges: Vec<f32>,
    /// Start angle of the scan in radians
    #[serde(default)]
    pub angle_min: f32,
    /// End angle of the scan in radians
    #[serde(default = "full_turn")]
    pub angle_max: f32,
    /// Angular distance between measurements in radians
    #[serde(default = "one_degree")]
    pub angle_increment: f32,
    /// Minimum valid range in meters
    #[serde(default)]
    pub range_min: f32,
    /// Maximum valid range in meters
    pub range_max: f32,
    /// Time between scans in seconds
    #[serde(default)]
    pub scan_time: f32,
    /// Nanoseconds since epoch
    #[serde(default)]
    pub timestamp: u64,
}

fn deserialize_ranges<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ranges: Vec<Option<f32>> = Deserialize::deserialize(deserializer)?;
    Ok(ranges
        .into_iter()
        .map(|r| r.unwrap_or(f32::INFINITY))
        .collect())
}

fn full_turn() -> f32 {
    std::f32::consts::TAU
}

fn one_degree() -> f32 {
    std::f32::consts::TAU / 360.0
}

impl LaserScan {
    /// Empty 360-beam sweep description with no readings
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            angle_min: 0.0,
            angle_max: full_turn(),
            angle_increment: one_degree(),
            range_min: 0.0,
            range_max: 0.0,
            scan_time: 0.0,
            timestamp: 0,
        }
    }

    /// Full sweep whose beams are spread evenly over one revolution
    pub fn with_ranges(ranges: Vec<f32>, range_max: f32) -> Self {
        let angle_increment = if ranges.is_empty() {
            one_degree()
        } else {
            full_turn() / ranges.len() as f32
        };
        Self {
            ranges,
            angle_increment,
            range_max,
            ..Self::new()
        }
    }

    /// Get the angle for a specific range index
    pub fn angle_at(&self, index: usize) -> f32 {
        self.angle_min + (index as f32) * self.angle_increment
    }

    /// Check if a range reading is a usable return
    pub fn is_range_valid(&self, index: usize) -> bool {
        self.ranges
            .get(index)
            .is_some_and(|&r| r.is_finite() && r >= self.range_min && r <= self.range_max)
    }

    /// Count valid range readings
    pub fn valid_count(&self) -> usize {
        (0..self.ranges.len())
            .filter(|&i| self.is_range_valid(i))
            .count()
    }

    /// Get minimum valid range reading
    pub fn min_range(&self) -> Option<f32> {
        self.ranges
            .iter()
            .copied()
            .filter(|r| r.is_finite() && *r >= self.range_min)
            .reduce(f32::min)
    }
}

impl Default for LaserScan {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSummary for LaserScan {
    fn log_summary(&self) -> String {
        format!(
            "LaserScan(beams={}, valid={}, range_max={:.2}, min={})",
            self.ranges.len(),
            self.valid_count(),
            self.range_max,
            self.min_range()
                .map(|r| format!("{:.3}", r))
                .unwrap_or_else(|| "none".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_with_ranges_spreads_beams() {
        let scan = LaserScan::with_ranges(vec![1.0; 720], 3.5);
        assert_relative_eq!(scan.angle_increment, std::f32::consts::TAU / 720.0);
        assert_relative_eq!(scan.angle_at(180), std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_validity() {
        let mut scan = LaserScan::with_ranges(vec![1.0, f32::INFINITY, f32::NAN, 5.0], 3.5);
        scan.range_min = 0.1;
        assert!(scan.is_range_valid(0));
        assert!(!scan.is_range_valid(1));
        assert!(!scan.is_range_valid(2));
        assert!(!scan.is_range_valid(3));
        assert!(!scan.is_range_valid(4));
        assert_eq!(scan.valid_count(), 1);
        assert_eq!(scan.min_range(), Some(1.0));
    }

    #[test]
    fn test_json_defaults() {
        let scan: LaserScan =
            serde_json::from_str(r#"{"ranges":[1.0,2.0],"range_max":3.5}"#).unwrap();
        assert_eq!(scan.ranges, vec![1.0, 2.0]);
        assert_relative_eq!(scan.range_max, 3.5);
        assert_relative_eq!(scan.angle_increment, std::f32::consts::TAU / 360.0);
        assert_eq!(scan.timestamp, 0);
    }

    #[test]
    fn test_json_null_is_no_return() {
        let scan: LaserScan =
            serde_json::from_str(r#"{"ranges":[null,0.5],"range_max":3.5}"#).unwrap();
        assert!(scan.ranges[0].is_infinite());

        let json = serde_json::to_string(&scan).unwrap();
        assert!(json.contains("[null,0.5]"));
    }

    #[test]
    fn test_log_summary_is_compact() {
        let scan = LaserScan::with_ranges(vec![f32::INFINITY; 360], 3.5);
        assert_eq!(
            scan.log_summary(),
            "LaserScan(beams=360, valid=0, range_max=3.50, min=none)"
        );
    }
}
