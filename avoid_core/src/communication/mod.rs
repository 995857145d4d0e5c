//! In-process publish/subscribe
//!
//! A [`Hub`] is a named keep-last topic. Scans and velocity commands move
//! between nodes through hubs.

pub mod hub;

pub use hub::{Hub, HubMetrics};
