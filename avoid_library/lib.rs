//! # Avoid Library
//!
//! Messages, the sector-avoidance algorithm, and the nodes that host it.
//!
//! ## Structure
//!
//! ```text
//! avoid_library/
//! ── messages/       # LaserScan in, CmdVel out
//! ── algorithms/     # Pure decision logic, no I/O
//! ── nodes/          # Scheduler-driven wrappers around the algorithm
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use avoid_library::algorithms::sector_avoidance::{
//!     SectorAvoidancePolicy, SectorLayout, SectorReadings,
//! };
//! use avoid_library::LaserScan;
//!
//! let mut scan = LaserScan::with_ranges(vec![1.0; 360], 3.5);
//! scan.ranges[0] = 0.2; // something right ahead
//!
//! let readings = SectorReadings::extract(&scan, &SectorLayout::default()).unwrap();
//! let cmd = SectorAvoidancePolicy::default().command(&readings);
//! assert_eq!((cmd.linear, cmd.angular), (0.0, -0.5));
//! ```

pub mod algorithms;
pub mod messages;
pub mod nodes;

// Re-export core traits needed for message types
pub use avoid_core::LogSummary;

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use nodes::{AvoidObstacleNode, CommandSink, ScanSource, SimulatedLidarNode};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::LogSummary;

    pub use crate::messages::{CmdVel, LaserScan};

    pub use crate::algorithms::sector_avoidance::{
        Decision, MotionProfile, SafetyThreshold, ScanSample, SectorAvoidancePolicy,
        SectorLayout, SectorReadings, SectorRole, Turn, VelocityCommand,
    };

    pub use crate::nodes::{
        AvoidObstacleNode, AvoidanceConfig, CommandSink, MalformedScanPolicy, ScanSource,
        SimulatedLidarNode,
    };
}
