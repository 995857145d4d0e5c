//! # Avoid Core
//!
//! The runtime the obstacle-avoidance controller is hosted on.
//!
//! The decision logic lives in `avoid_library` and knows nothing about
//! transport. This crate provides the pieces around it:
//!
//! - **Nodes**: lifecycle trait plus per-node context, metrics and logging
//! - **Communication**: named in-process topics with keep-last queues
//! - **Scheduling**: a fixed-rate, priority-ordered tick loop
//! - **Params**: YAML-backed runtime parameters read once at startup
//!
//! ## Quick Start
//!
//! ```rust
//! use avoid_core::{Hub, Node, NodeInfo, Scheduler};
//!
//! struct Counter {
//!     output: Hub<u64>,
//!     count: u64,
//! }
//!
//! impl Node for Counter {
//!     fn name(&self) -> &'static str { "counter" }
//!
//!     fn tick(&mut self, ctx: Option<&mut NodeInfo>) {
//!         self.count += 1;
//!         let _ = self.output.send(self.count, ctx);
//!     }
//! }
//!
//! let output = Hub::new("count").unwrap();
//! let mut scheduler = Scheduler::new().name("example");
//! scheduler.add(Box::new(Counter { output: output.clone(), count: 0 }), 0, None);
//! scheduler.tick_once().unwrap();
//! assert_eq!(output.recv(None), Some(1));
//! ```

pub mod communication;
pub mod core;
pub mod error;
pub mod params;
pub mod scheduling;

// Re-export commonly used types for easy access
pub use communication::{Hub, HubMetrics};
pub use self::core::{LogSummary, Node, NodeConfig, NodeInfo, NodeState, TopicMetadata};
pub use error::{AvoidError, AvoidResult};
pub use params::RuntimeParams;
pub use scheduling::Scheduler;
