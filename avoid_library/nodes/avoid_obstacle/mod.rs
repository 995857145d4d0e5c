//! Reactive obstacle-avoidance node
//!
//! Consumes laser scans, runs [`SectorAvoidancePolicy`] on each one and
//! publishes the resulting velocity command. The transport on either side is
//! injected through [`ScanSource`] and [`CommandSink`], so the node can be
//! driven by in-process [`Hub`]s, a replay file or a test double.

mod config;

pub use config::{AvoidanceConfig, MalformedScanPolicy};

use crate::algorithms::sector_avoidance::{Decision, SectorAvoidancePolicy, SectorReadings};
use crate::messages::{CmdVel, LaserScan};
use avoid_core::{AvoidError, AvoidResult, Hub, Node, NodeInfo, RuntimeParams, TopicMetadata};

/// Where the node gets its scans from
pub trait ScanSource: Send {
    /// Oldest scan not yet handed out, if any
    fn next_scan(&mut self, ctx: Option<&mut NodeInfo>) -> Option<LaserScan>;

    fn topic_name(&self) -> &str;
}

/// Where the node sends its commands to
pub trait CommandSink: Send {
    fn send_command(&mut self, cmd: CmdVel, ctx: Option<&mut NodeInfo>) -> AvoidResult<()>;

    fn topic_name(&self) -> &str;
}

impl ScanSource for Hub<LaserScan> {
    fn next_scan(&mut self, ctx: Option<&mut NodeInfo>) -> Option<LaserScan> {
        self.recv(ctx)
    }

    fn topic_name(&self) -> &str {
        self.get_topic_name()
    }
}

impl CommandSink for Hub<CmdVel> {
    fn send_command(&mut self, cmd: CmdVel, ctx: Option<&mut NodeInfo>) -> AvoidResult<()> {
        self.send(cmd, ctx).map_err(|_| {
            AvoidError::Communication(format!("topic '{}' is closed", self.get_topic_name()))
        })
    }

    fn topic_name(&self) -> &str {
        self.get_topic_name()
    }
}

/// Running totals kept for introspection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvoidanceStats {
    pub scans_received: u64,
    pub commands_sent: u64,
    pub malformed_scans: u64,
    pub send_failures: u64,
}

/// Obstacle-avoidance node: `scan` in, `cmd_vel` out
///
/// Every tick drains all pending scans in arrival order and emits exactly
/// one command per well-formed scan. Scans too short to sample are handled
/// according to [`MalformedScanPolicy`].
pub struct AvoidObstacleNode<S = Hub<LaserScan>, C = Hub<CmdVel>> {
    source: S,
    sink: C,
    config: AvoidanceConfig,
    policy: SectorAvoidancePolicy,

    stats: AvoidanceStats,
    last_decision: Option<Decision>,
    last_send_failed: bool,
}

impl AvoidObstacleNode {
    /// Create the node with default configuration and fresh topics
    pub fn new() -> AvoidResult<Self> {
        Self::from_config(AvoidanceConfig::default())
    }

    /// Create the node from a parameter store and fresh topics
    pub fn from_params(params: &RuntimeParams) -> AvoidResult<Self> {
        Self::from_config(AvoidanceConfig::from_params(params)?)
    }

    /// Create the node with topics named and sized by `config`
    pub fn from_config(config: AvoidanceConfig) -> AvoidResult<Self> {
        let scans = Hub::new_with_capacity(&config.scan_topic, config.scan_queue_depth)?;
        let commands = Hub::new_with_capacity(&config.cmd_topic, config.cmd_queue_depth)?;
        Ok(Self::with_transport(scans, commands, config))
    }

    /// Handle for publishing scans into this node
    pub fn scan_hub(&self) -> Hub<LaserScan> {
        self.source.clone()
    }

    /// Handle for receiving this node's commands
    pub fn cmd_hub(&self) -> Hub<CmdVel> {
        self.sink.clone()
    }
}

impl<S: ScanSource, C: CommandSink> AvoidObstacleNode<S, C> {
    /// Create the node over an arbitrary transport
    pub fn with_transport(source: S, sink: C, config: AvoidanceConfig) -> Self {
        let policy = config.policy();
        Self {
            source,
            sink,
            config,
            policy,
            stats: AvoidanceStats::default(),
            last_decision: None,
            last_send_failed: false,
        }
    }

    pub fn config(&self) -> &AvoidanceConfig {
        &self.config
    }

    pub fn policy(&self) -> &SectorAvoidancePolicy {
        &self.policy
    }

    pub fn stats(&self) -> AvoidanceStats {
        self.stats
    }

    /// Branch taken for the most recent well-formed scan
    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }

    /// Command for one scan, or `None` when a malformed scan is skipped
    pub fn process_scan(&mut self, scan: &LaserScan, ctx: Option<&mut NodeInfo>) -> Option<CmdVel> {
        self.stats.scans_received += 1;

        match SectorReadings::extract(scan, &self.config.layout) {
            Ok(readings) => {
                let decision = self.policy.decide(&readings);
                let velocity = decision.velocity(&self.policy.motion());
                self.last_decision = Some(decision);

                if let Some(ctx) = ctx {
                    ctx.log_debug(&format!(
                        "front={:.3} left=({:.3}, {:.3}) right=({:.3}, {:.3}): {}",
                        readings.front(),
                        readings.near_left(),
                        readings.far_left(),
                        readings.far_right(),
                        readings.near_right(),
                        decision
                    ));
                }
                Some(stamp(velocity.linear, velocity.angular, scan.timestamp))
            }
            Err(e) => {
                self.stats.malformed_scans += 1;
                let msg = format!("Dropping scan: {} (policy: {})", e, self.config.malformed_scan_policy);
                match ctx {
                    Some(ctx) => ctx.log_warning(&msg),
                    None => log::warn!("{}", msg),
                }

                match self.config.malformed_scan_policy {
                    MalformedScanPolicy::Skip => None,
                    MalformedScanPolicy::SafeStop => Some(stamp(0.0, 0.0, scan.timestamp)),
                }
            }
        }
    }

    fn publish(&mut self, cmd: CmdVel, ctx: Option<&mut NodeInfo>) {
        // The sink consumes ctx for its pub log, so failures go to the facade.
        match self.sink.send_command(cmd, ctx) {
            Ok(()) => {
                self.stats.commands_sent += 1;
                self.last_send_failed = false;
            }
            Err(e) => {
                self.stats.send_failures += 1;
                self.last_send_failed = true;
                log::error!("Failed to publish on '{}': {}", self.sink.topic_name(), e);
            }
        }
    }
}

// Commands carry their scan's timestamp so replays are reproducible; live
// scans without one are stamped on the spot.
fn stamp(linear: f32, angular: f32, scan_timestamp: u64) -> CmdVel {
    if scan_timestamp == 0 {
        CmdVel::new(linear, angular)
    } else {
        CmdVel::with_timestamp(linear, angular, scan_timestamp)
    }
}

impl<S: ScanSource, C: CommandSink> Node for AvoidObstacleNode<S, C> {
    fn name(&self) -> &'static str {
        "avoid_obstacle_node"
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> AvoidResult<()> {
        ctx.log_info(&format!(
            "Avoiding obstacles closer than {} ('{}' -> '{}', malformed scans: {})",
            self.config.threshold,
            self.source.topic_name(),
            self.sink.topic_name(),
            self.config.malformed_scan_policy
        ));
        Ok(())
    }

    fn tick(&mut self, mut ctx: Option<&mut NodeInfo>) {
        while let Some(scan) = self.source.next_scan(ctx.as_deref_mut()) {
            if let Some(cmd) = self.process_scan(&scan, ctx.as_deref_mut()) {
                self.publish(cmd, ctx.as_deref_mut());
            }
        }
    }

    fn shutdown(&mut self, ctx: &mut NodeInfo) -> AvoidResult<()> {
        ctx.log_info(&format!(
            "Processed {} scan(s), sent {} command(s), {} malformed",
            self.stats.scans_received, self.stats.commands_sent, self.stats.malformed_scans
        ));
        ctx.log_info("Avoid Obstacle node has been terminated");
        Ok(())
    }

    fn get_publishers(&self) -> Vec<TopicMetadata> {
        vec![TopicMetadata {
            topic_name: self.sink.topic_name().to_string(),
            type_name: "CmdVel".to_string(),
        }]
    }

    fn get_subscribers(&self) -> Vec<TopicMetadata> {
        vec![TopicMetadata {
            topic_name: self.source.topic_name().to_string(),
            type_name: "LaserScan".to_string(),
        }]
    }

    fn is_healthy(&self) -> bool {
        !self.last_send_failed
    }
}
