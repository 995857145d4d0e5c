//! Pure computational algorithms
//!
//! Nothing in here performs I/O or keeps state between calls; nodes wrap
//! these with transport and lifecycle.
//!
//! # Available Algorithms
//!
//! ## Safety & Collision Avoidance
//! - **sector_avoidance**: five-beam reactive obstacle avoidance with a
//!   single safety threshold and a priority-ordered steering cascade

pub mod sector_avoidance;
