//! Message types exchanged by the controller
//!
//! - Sensor: [`LaserScan`], the full angular sweep the controller consumes
//! - Control: [`CmdVel`], the velocity command it produces
//!
//! All message types are re-exported at the crate root for convenience.

pub mod cmd_vel;
pub mod sensor;

pub use cmd_vel::CmdVel;
pub use sensor::LaserScan;
