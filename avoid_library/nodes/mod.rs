//! Scheduler-driven nodes
//!
//! - `AvoidObstacleNode` - subscribes to `scan`, publishes `cmd_vel`
//! - `SimulatedLidarNode` - publishes synthetic scans of point obstacles
//!
//! ```rust
//! use avoid_core::Scheduler;
//! use avoid_library::nodes::{AvoidObstacleNode, PointObstacle, SimulatedLidarNode};
//!
//! let avoid = AvoidObstacleNode::new().unwrap();
//! let cmds = avoid.cmd_hub();
//!
//! let mut lidar = SimulatedLidarNode::with_hub(avoid.scan_hub());
//! lidar.add_obstacle(PointObstacle::new(0.0, 0.2).unwrap());
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add(Box::new(lidar), 0, None);
//! scheduler.add(Box::new(avoid), 1, None);
//! scheduler.tick_once().unwrap();
//!
//! let cmd = cmds.recv(None).unwrap();
//! assert_eq!((cmd.linear, cmd.angular), (0.0, -0.5));
//! ```

pub mod avoid_obstacle;
pub mod simulated_lidar;

pub use avoid_obstacle::{
    AvoidObstacleNode, AvoidanceConfig, AvoidanceStats, CommandSink, MalformedScanPolicy,
    ScanSource,
};
pub use simulated_lidar::{PointObstacle, SimulatedLidarNode};
