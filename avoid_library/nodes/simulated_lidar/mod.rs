use crate::messages::LaserScan;
use avoid_core::{AvoidError, AvoidResult, Hub, Node, NodeInfo, TopicMetadata};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

const RANGE_MIN: f32 = 0.12;
const RANGE_MAX: f32 = 3.5;
/// Half-angle, in degrees, over which an obstacle shadows beams
const OBSTACLE_HALF_WIDTH_DEG: f32 = 3.0;

/// A point-like obstacle seen by the simulated scanner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointObstacle {
    /// Bearing in degrees, counter-clockwise from straight ahead
    pub bearing_deg: f32,
    /// Distance in meters
    pub distance: f32,
}

impl PointObstacle {
    pub fn new(bearing_deg: f32, distance: f32) -> AvoidResult<Self> {
        if !bearing_deg.is_finite() {
            return Err(AvoidError::InvalidConfig(format!(
                "obstacle bearing must be finite, got {}",
                bearing_deg
            )));
        }
        if !distance.is_finite() || distance <= 0.0 {
            return Err(AvoidError::InvalidConfig(format!(
                "obstacle distance must be positive, got {}",
                distance
            )));
        }
        Ok(Self {
            bearing_deg: bearing_deg.rem_euclid(360.0),
            distance,
        })
    }
}

/// Parses `<bearing_deg>:<distance_m>`, e.g. `30:0.25`
impl FromStr for PointObstacle {
    type Err = AvoidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AvoidError::InvalidConfig(format!("expected <deg>:<meters>, got '{}'", s));
        let (bearing, distance) = s.split_once(':').ok_or_else(invalid)?;
        let bearing: f32 = bearing.trim().parse().map_err(|_| invalid())?;
        let distance: f32 = distance.trim().parse().map_err(|_| invalid())?;
        Self::new(bearing, distance)
    }
}

/// Simulated LiDAR Node - synthetic full-turn scans for bench testing
///
/// Every tick publishes one scan of `beams` evenly spaced beams. A beam
/// returns the distance of the nearest obstacle within a few degrees of its
/// bearing; beams hitting nothing report `+inf`, like a real scanner
/// with no return.
pub struct SimulatedLidarNode {
    publisher: Hub<LaserScan>,

    // Configuration
    beams: usize,
    scan_frequency: f32,
    obstacles: Vec<PointObstacle>,

    // State
    scan_count: u64,
}

impl SimulatedLidarNode {
    /// Create a simulated scanner publishing on a fresh "scan" topic
    pub fn new() -> AvoidResult<Self> {
        Ok(Self::with_hub(Hub::new_with_capacity("scan", 5)?))
    }

    /// Create a simulated scanner publishing on `publisher`
    pub fn with_hub(publisher: Hub<LaserScan>) -> Self {
        Self {
            publisher,
            beams: 360,
            scan_frequency: 10.0,
            obstacles: Vec::new(),
            scan_count: 0,
        }
    }

    /// Set beams per revolution
    pub fn set_beams(&mut self, beams: usize) -> AvoidResult<()> {
        if beams == 0 {
            return Err(AvoidError::InvalidConfig(
                "beams per revolution must be positive".to_string(),
            ));
        }
        self.beams = beams;
        Ok(())
    }

    /// Set the nominal scan frequency (Hz), reported as `scan_time`
    pub fn set_scan_frequency(&mut self, frequency: f32) {
        self.scan_frequency = frequency.clamp(0.1, 100.0);
    }

    pub fn add_obstacle(&mut self, obstacle: PointObstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Handle for subscribing to the scans this node publishes
    pub fn hub(&self) -> Hub<LaserScan> {
        self.publisher.clone()
    }

    /// Build one scan of the current scene without publishing it
    pub fn generate_scan(&self) -> LaserScan {
        let step = 360.0 / self.beams as f32;
        let ranges = (0..self.beams)
            .map(|i| self.range_at(i as f32 * step))
            .collect();

        let mut scan = LaserScan::with_ranges(ranges, RANGE_MAX);
        scan.range_min = RANGE_MIN;
        scan.scan_time = 1.0 / self.scan_frequency;
        scan.timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        scan
    }

    fn range_at(&self, bearing_deg: f32) -> f32 {
        self.obstacles
            .iter()
            .filter(|o| angular_gap(o.bearing_deg, bearing_deg) <= OBSTACLE_HALF_WIDTH_DEG)
            .map(|o| o.distance)
            .filter(|&d| d <= RANGE_MAX)
            .fold(f32::INFINITY, f32::min)
    }
}

fn angular_gap(a_deg: f32, b_deg: f32) -> f32 {
    let diff = (a_deg - b_deg).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

impl Node for SimulatedLidarNode {
    fn name(&self) -> &'static str {
        "simulated_lidar_node"
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> AvoidResult<()> {
        ctx.log_info(&format!(
            "Simulating {} beam(s) with {} obstacle(s) on '{}'",
            self.beams,
            self.obstacles.len(),
            self.publisher.get_topic_name()
        ));
        Ok(())
    }

    fn tick(&mut self, ctx: Option<&mut NodeInfo>) {
        let scan = self.generate_scan();
        self.scan_count += 1;
        if self.publisher.send(scan, ctx).is_err() {
            log::warn!(
                "Topic '{}' closed, dropping simulated scan",
                self.publisher.get_topic_name()
            );
        }
    }

    fn get_publishers(&self) -> Vec<TopicMetadata> {
        vec![TopicMetadata {
            topic_name: self.publisher.get_topic_name().to_string(),
            type_name: "LaserScan".to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_scene_has_no_returns() {
        let lidar = SimulatedLidarNode::new().unwrap();
        let scan = lidar.generate_scan();
        assert_eq!(scan.ranges.len(), 360);
        assert!(scan.ranges.iter().all(|r| r.is_infinite()));
        assert_eq!(scan.valid_count(), 0);
    }

    #[test]
    fn test_obstacle_shadows_nearby_beams() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        lidar.add_obstacle(PointObstacle::new(30.0, 0.25).unwrap());
        let scan = lidar.generate_scan();

        assert_eq!(scan.ranges[30], 0.25);
        assert_eq!(scan.ranges[27], 0.25);
        assert_eq!(scan.ranges[33], 0.25);
        assert!(scan.ranges[26].is_infinite());
        assert!(scan.ranges[0].is_infinite());
    }

    #[test]
    fn test_obstacle_wraps_around_zero() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        lidar.add_obstacle(PointObstacle::new(-1.0, 0.3).unwrap());
        let scan = lidar.generate_scan();
        assert_eq!(scan.ranges[0], 0.3);
        assert_eq!(scan.ranges[359], 0.3);
    }

    #[test]
    fn test_nearest_obstacle_wins() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        lidar.add_obstacle(PointObstacle::new(0.0, 1.0).unwrap());
        lidar.add_obstacle(PointObstacle::new(0.0, 0.2).unwrap());
        assert_eq!(lidar.generate_scan().ranges[0], 0.2);
    }

    #[test]
    fn test_beyond_range_is_no_return() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        lidar.add_obstacle(PointObstacle::new(0.0, 10.0).unwrap());
        assert!(lidar.generate_scan().ranges[0].is_infinite());
    }

    #[test]
    fn test_tick_publishes() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        let hub = lidar.hub();
        lidar.tick(None);
        lidar.tick(None);
        assert_eq!(hub.pending(), 2);
        assert_eq!(lidar.scan_count(), 2);
    }

    #[test]
    fn test_parse_obstacle() {
        let o: PointObstacle = "330:0.35".parse().unwrap();
        assert_eq!(o, PointObstacle::new(330.0, 0.35).unwrap());
        assert_eq!("-30:1".parse::<PointObstacle>().unwrap().bearing_deg, 330.0);
        assert!("30".parse::<PointObstacle>().is_err());
        assert!("a:1".parse::<PointObstacle>().is_err());
        assert!("30:-1".parse::<PointObstacle>().is_err());
    }

    #[test]
    fn test_custom_resolution() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        lidar.set_beams(720).unwrap();
        lidar.add_obstacle(PointObstacle::new(60.0, 0.3).unwrap());
        let scan = lidar.generate_scan();
        assert_eq!(scan.ranges.len(), 720);
        assert_eq!(scan.ranges[120], 0.3);
        assert!(lidar.set_beams(0).is_err());
    }

    #[test]
    fn test_scan_time_follows_frequency() {
        let mut lidar = SimulatedLidarNode::new().unwrap();
        assert_relative_eq!(lidar.generate_scan().scan_time, 0.1);

        lidar.set_scan_frequency(20.0);
        assert_relative_eq!(lidar.generate_scan().scan_time, 0.05);

        // Clamped to 0.1 Hz
        lidar.set_scan_frequency(0.0);
        assert_relative_eq!(lidar.generate_scan().scan_time, 10.0);
    }
}
