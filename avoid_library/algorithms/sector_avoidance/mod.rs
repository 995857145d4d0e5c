//! Sector-based Reactive Obstacle Avoidance
//!
//! Samples five directions of a full laser sweep and maps them to a single
//! velocity command through a fixed priority cascade.
//!
//! # Features
//!
//! - Front, front-left, left, right and front-right sampling
//! - Single safety threshold with strict comparisons
//! - Right-preferred escape when the front is blocked
//! - Configurable sample layout for non 1° scanners
//!
//! # Decision cascade
//!
//! Evaluated in order, first match wins (`t` is the safety threshold):
//!
//! 1. front `< t`: stop and rotate. Right if both right samples are `> t`,
//!    else left.
//! 2. either left sample `< t`: rotate right in place
//! 3. either right sample `< t`: rotate left in place
//! 4. otherwise drive straight ahead
//!
//! A reading exactly equal to `t` is neither blocked nor clear.
//!
//! # Example
//!
//! ```rust
//! use avoid_library::algorithms::sector_avoidance::{
//!     Decision, SectorAvoidancePolicy, SectorReadings, Turn,
//! };
//!
//! let policy = SectorAvoidancePolicy::default();
//! // front, near left, far left, far right, near right
//! let readings = SectorReadings::from_distances([0.2, 1.0, 1.0, 1.0, 1.0], 3.5);
//!
//! assert_eq!(policy.decide(&readings), Decision::FrontBlocked { turn: Turn::Right, boxed_in: false });
//! let cmd = policy.command(&readings);
//! assert_eq!((cmd.linear, cmd.angular), (0.0, -0.5));
//! ```

mod layout;


pub use layout::{SectorLayout, SectorRole};

use crate::messages::{CmdVel, LaserScan};
use avoid_core::{AvoidError, AvoidResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default safety threshold in meters
pub const DEFAULT_SAFETY_THRESHOLD: f32 = 0.4;
/// Default forward speed in m/s
pub const DEFAULT_FORWARD_SPEED: f32 = 0.2;
/// Default in-place turn rate in rad/s
pub const DEFAULT_TURN_RATE: f32 = 0.5;

/// A single sampled beam
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanSample {
    /// Index into the originating scan
    pub index: usize,
    /// Distance in meters, always finite
    pub distance: f32,
}

/// The five sampled distances of one scan
///
/// Every distance is finite: non-finite readings are replaced with the
/// scan's `range_max` during extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorReadings {
    samples: [ScanSample; 5],
}

impl SectorReadings {
    /// Sample a scan according to `layout`
    ///
    /// Fails with [`AvoidError::MalformedScan`] when the scan is too short
    /// to contain every index of the layout.
    pub fn extract(scan: &LaserScan, layout: &SectorLayout) -> AvoidResult<Self> {
        Self::extract_ranges(&scan.ranges, scan.range_max, layout)
    }

    /// Same as [`extract`](Self::extract) over a bare range slice
    pub fn extract_ranges(ranges: &[f32], range_max: f32, layout: &SectorLayout) -> AvoidResult<Self> {
        let required = layout.required_len();
        if ranges.len() < required {
            return Err(AvoidError::MalformedScan {
                len: ranges.len(),
                required,
            });
        }

        let mut samples = [ScanSample {
            index: 0,
            distance: 0.0,
        }; 5];
        for (role, index) in layout.iter() {
            samples[role.slot()] = ScanSample {
                index,
                distance: sanitize(ranges[index], range_max),
            };
        }
        Ok(Self { samples })
    }

    /// Readings from already-sampled distances, ordered front, near left,
    /// far left, far right, near right
    ///
    /// Indices follow the default layout.
    pub fn from_distances(distances: [f32; 5], range_max: f32) -> Self {
        let layout = SectorLayout::default();
        let mut samples = [ScanSample {
            index: 0,
            distance: 0.0,
        }; 5];
        for (role, index) in layout.iter() {
            samples[role.slot()] = ScanSample {
                index,
                distance: sanitize(distances[role.slot()], range_max),
            };
        }
        Self { samples }
    }

    pub fn get(&self, role: SectorRole) -> ScanSample {
        self.samples[role.slot()]
    }

    pub fn distance(&self, role: SectorRole) -> f32 {
        self.get(role).distance
    }

    pub fn front(&self) -> f32 {
        self.distance(SectorRole::Front)
    }

    pub fn near_left(&self) -> f32 {
        self.distance(SectorRole::NearLeft)
    }

    pub fn far_left(&self) -> f32 {
        self.distance(SectorRole::FarLeft)
    }

    pub fn far_right(&self) -> f32 {
        self.distance(SectorRole::FarRight)
    }

    pub fn near_right(&self) -> f32 {
        self.distance(SectorRole::NearRight)
    }

    /// Samples in priority order
    pub fn samples(&self) -> &[ScanSample; 5] {
        &self.samples
    }

    /// Closest of the five samples
    pub fn nearest(&self) -> (SectorRole, f32) {
        SectorRole::ALL
            .into_iter()
            .map(|role| (role, self.distance(role)))
            .fold((SectorRole::Front, f32::INFINITY), |best, cur| {
                if cur.1 < best.1 {
                    cur
                } else {
                    best
                }
            })
    }
}

// NaN fails is_finite too, so it is treated as "no return".
fn sanitize(reading: f32, range_max: f32) -> f32 {
    if reading.is_finite() {
        reading
    } else {
        range_max
    }
}

/// Minimum distance a sampled direction must keep to count as clear
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SafetyThreshold(f32);

impl SafetyThreshold {
    /// Validated threshold, rejecting negative and non-finite values
    pub fn new(meters: f32) -> AvoidResult<Self> {
        if !meters.is_finite() || meters < 0.0 {
            return Err(AvoidError::InvalidConfig(format!(
                "safety threshold must be a finite, non-negative distance, got {}",
                meters
            )));
        }
        Ok(Self(meters))
    }

    pub fn meters(&self) -> f32 {
        self.0
    }

    /// Strictly closer than the threshold
    pub fn is_blocked(&self, distance: f32) -> bool {
        distance < self.0
    }

    /// Strictly farther than the threshold
    pub fn is_clear(&self, distance: f32) -> bool {
        distance > self.0
    }
}

impl Default for SafetyThreshold {
    fn default() -> Self {
        Self(DEFAULT_SAFETY_THRESHOLD)
    }
}

impl fmt::Display for SafetyThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} m", self.0)
    }
}

/// Magnitudes used for the two kinds of motion the policy emits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    forward_speed: f32,
    turn_rate: f32,
}

impl MotionProfile {
    pub fn new(forward_speed: f32, turn_rate: f32) -> AvoidResult<Self> {
        if !forward_speed.is_finite() || forward_speed <= 0.0 {
            return Err(AvoidError::InvalidConfig(format!(
                "forward_speed must be positive, got {}",
                forward_speed
            )));
        }
        if !turn_rate.is_finite() || turn_rate <= 0.0 {
            return Err(AvoidError::InvalidConfig(format!(
                "turn_rate must be positive, got {}",
                turn_rate
            )));
        }
        Ok(Self {
            forward_speed,
            turn_rate,
        })
    }

    pub fn forward_speed(&self) -> f32 {
        self.forward_speed
    }

    pub fn turn_rate(&self) -> f32 {
        self.turn_rate
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            forward_speed: DEFAULT_FORWARD_SPEED,
            turn_rate: DEFAULT_TURN_RATE,
        }
    }
}

/// Direction of an in-place rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    /// Counter-clockwise, positive yaw
    Left,
    /// Clockwise, negative yaw
    Right,
}

impl Turn {
    pub fn sign(self) -> f32 {
        match self {
            Turn::Left => 1.0,
            Turn::Right => -1.0,
        }
    }
}

/// Which branch of the cascade fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Front sample below threshold; rotate in place
    ///
    /// `boxed_in` is set when neither side was clear and the left turn is
    /// the fallback rather than a choice.
    FrontBlocked { turn: Turn, boxed_in: bool },
    /// A left sample is below threshold; rotate right
    LeftBlocked,
    /// A right sample is below threshold; rotate left
    RightBlocked,
    /// Nothing within threshold; drive forward
    Clear,
}

impl Decision {
    /// Velocity this decision maps to under `motion`
    pub fn velocity(self, motion: &MotionProfile) -> VelocityCommand {
        match self {
            Decision::FrontBlocked { turn, .. } => {
                VelocityCommand::rotate(turn.sign() * motion.turn_rate())
            }
            Decision::LeftBlocked => VelocityCommand::rotate(Turn::Right.sign() * motion.turn_rate()),
            Decision::RightBlocked => VelocityCommand::rotate(Turn::Left.sign() * motion.turn_rate()),
            Decision::Clear => VelocityCommand {
                linear: motion.forward_speed(),
                angular: 0.0,
            },
        }
    }

    /// Rotation direction, if the decision rotates
    pub fn turn(self) -> Option<Turn> {
        match self {
            Decision::FrontBlocked { turn, .. } => Some(turn),
            Decision::LeftBlocked => Some(Turn::Right),
            Decision::RightBlocked => Some(Turn::Left),
            Decision::Clear => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::FrontBlocked {
                turn: Turn::Right, ..
            } => write!(f, "front blocked, turning right"),
            Decision::FrontBlocked {
                turn: Turn::Left,
                boxed_in: false,
            } => write!(f, "front blocked, turning left"),
            Decision::FrontBlocked {
                turn: Turn::Left,
                boxed_in: true,
            } => write!(f, "front blocked, boxed in, turning left"),
            Decision::LeftBlocked => write!(f, "left blocked, turning right"),
            Decision::RightBlocked => write!(f, "right blocked, turning left"),
            Decision::Clear => write!(f, "clear, driving forward"),
        }
    }
}

/// Planar velocity produced by the policy, without a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Forward speed in m/s
    pub linear: f32,
    /// Yaw rate in rad/s, positive counter-clockwise
    pub angular: f32,
}

impl VelocityCommand {
    pub const STOP: VelocityCommand = VelocityCommand {
        linear: 0.0,
        angular: 0.0,
    };

    fn rotate(angular: f32) -> Self {
        Self {
            linear: 0.0,
            angular,
        }
    }

    /// Stamp with the current time
    pub fn to_cmd_vel(self) -> CmdVel {
        CmdVel::new(self.linear, self.angular)
    }
}

impl From<VelocityCommand> for CmdVel {
    fn from(cmd: VelocityCommand) -> Self {
        cmd.to_cmd_vel()
    }
}

/// Stateless five-sector avoidance policy
///
/// Pure function of its configuration and the readings it is given: the
/// same readings always produce the same command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectorAvoidancePolicy {
    threshold: SafetyThreshold,
    motion: MotionProfile,
}

impl SectorAvoidancePolicy {
    pub fn new(threshold: SafetyThreshold, motion: MotionProfile) -> Self {
        Self { threshold, motion }
    }

    /// Default motion with a custom threshold
    pub fn with_threshold(threshold: SafetyThreshold) -> Self {
        Self {
            threshold,
            motion: MotionProfile::default(),
        }
    }

    pub fn threshold(&self) -> SafetyThreshold {
        self.threshold
    }

    pub fn motion(&self) -> MotionProfile {
        self.motion
    }

    /// Run the cascade and report which branch fired
    pub fn decide(&self, readings: &SectorReadings) -> Decision {
        let t = &self.threshold;

        if t.is_blocked(readings.front()) {
            let right_clear = t.is_clear(readings.far_right()) && t.is_clear(readings.near_right());
            let left_clear = t.is_clear(readings.near_left()) && t.is_clear(readings.far_left());
            return if right_clear {
                Decision::FrontBlocked {
                    turn: Turn::Right,
                    boxed_in: false,
                }
            } else {
                Decision::FrontBlocked {
                    turn: Turn::Left,
                    boxed_in: !left_clear,
                }
            };
        }

        if t.is_blocked(readings.near_left()) || t.is_blocked(readings.far_left()) {
            Decision::LeftBlocked
        } else if t.is_blocked(readings.far_right()) || t.is_blocked(readings.near_right()) {
            Decision::RightBlocked
        } else {
            Decision::Clear
        }
    }

    /// Velocity command for the given readings
    pub fn command(&self, readings: &SectorReadings) -> VelocityCommand {
        self.decide(readings).velocity(&self.motion)
    }

    /// Extract readings from `scan` and compute its command in one step
    pub fn command_for_scan(
        &self,
        scan: &LaserScan,
        layout: &SectorLayout,
    ) -> AvoidResult<(Decision, VelocityCommand)> {
        let readings = SectorReadings::extract(scan, layout)?;
        let decision = self.decide(&readings);
        Ok((decision, decision.velocity(&self.motion)))
    }
}
