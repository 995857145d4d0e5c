use crate::core::{Node, NodeInfo, NodeMetrics, NodeState};
use crate::error::{AvoidError, AvoidResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Node registration info with lifecycle tracking
struct RegisteredNode {
    node: Box<dyn Node>,
    priority: u32,
    initialized: bool,
    shut_down: bool,
    context: NodeInfo,
}

/// Central orchestrator: holds nodes, drives the tick loop.
///
/// Nodes run one after another in ascending priority order (0 first), so a
/// producer registered ahead of its consumer hands over data within the
/// same pass.
pub struct Scheduler {
    nodes: Vec<RegisteredNode>,
    running: Arc<AtomicBool>,
    scheduler_name: String,
    tick_period: Duration,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            scheduler_name: "AvoidScheduler".to_string(),
            tick_period: Duration::from_millis(100),
        }
    }

    /// Set scheduler name (chainable)
    pub fn name(mut self, name: &str) -> Self {
        self.scheduler_name = name.to_string();
        self
    }

    /// Set the global tick rate in Hz (chainable); non-positive rates are ignored
    pub fn with_tick_rate(mut self, rate_hz: f64) -> Self {
        if rate_hz.is_finite() && rate_hz > 0.0 {
            self.tick_period = Duration::from_secs_f64(1.0 / rate_hz);
        } else {
            log::warn!("Ignoring invalid tick rate {}", rate_hz);
        }
        self
    }

    /// Register a node; lower `priority` values tick first
    pub fn add(
        &mut self,
        node: Box<dyn Node>,
        priority: u32,
        logging_enabled: Option<bool>,
    ) -> &mut Self {
        let node_name = node.name().to_string();
        let logging_enabled = logging_enabled.unwrap_or(true);
        let context = NodeInfo::new(node_name.clone(), logging_enabled);

        // Stable insert keeps registration order among equal priorities
        let position = self
            .nodes
            .iter()
            .position(|registered| registered.priority > priority)
            .unwrap_or(self.nodes.len());
        self.nodes.insert(
            position,
            RegisteredNode {
                node,
                priority,
                initialized: false,
                shut_down: false,
                context,
            },
        );

        log::info!(
            "Added node '{}' with priority {} (logging: {})",
            node_name,
            priority,
            logging_enabled
        );
        self
    }

    /// Check if the scheduler is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the scheduler
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Run a single pass over every node
    pub fn tick_once(&mut self) -> AvoidResult<()> {
        if self.nodes.is_empty() {
            return Err(AvoidError::Internal(format!(
                "scheduler '{}' has no nodes",
                self.scheduler_name
            )));
        }

        for registered in self.nodes.iter_mut() {
            if !registered.initialized {
                Self::initialize(registered);
            }
            if !matches!(registered.context.state(), NodeState::Running) {
                continue;
            }

            registered.context.start_tick();
            registered.node.tick(Some(&mut registered.context));
            registered.context.record_tick();
        }
        Ok(())
    }

    /// Main loop with Ctrl+C handling and cleanup
    pub fn run(&mut self) -> AvoidResult<()> {
        self.run_with_limit(None)
    }

    /// Run all nodes for a specified duration, then shutdown gracefully
    pub fn run_for(&mut self, duration: Duration) -> AvoidResult<()> {
        self.run_with_limit(Some(duration))
    }

    fn run_with_limit(&mut self, duration: Option<Duration>) -> AvoidResult<()> {
        let running = self.running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            log::warn!("Ctrl+C received, shutting down");
            running.store(false, Ordering::Release);
        }) {
            log::warn!("Failed to set signal handler: {}", e);
        }

        let start_time = Instant::now();
        log::info!(
            "Scheduler '{}' running {} node(s) every {:?}",
            self.scheduler_name,
            self.nodes.len(),
            self.tick_period
        );

        while self.is_running() {
            if let Some(max_duration) = duration {
                if start_time.elapsed() >= max_duration {
                    log::info!("Scheduler reached time limit of {:?}", max_duration);
                    break;
                }
            }

            let tick_start = Instant::now();
            self.tick_once()?;

            if let Some(remaining) = self.tick_period.checked_sub(tick_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        self.shutdown()
    }

    /// Shut every initialized node down exactly once
    pub fn shutdown(&mut self) -> AvoidResult<()> {
        for registered in self.nodes.iter_mut() {
            if !registered.initialized || registered.shut_down {
                continue;
            }
            registered.shut_down = true;

            let name = registered.node.name();
            if let Err(e) = registered.node.shutdown(&mut registered.context) {
                registered
                    .context
                    .log_error(&format!("Shutdown of '{}' failed: {}", name, e));
            }
            registered.context.shutdown();
        }
        Ok(())
    }

    fn initialize(registered: &mut RegisteredNode) {
        registered.initialized = true;
        let name = registered.node.name();
        match registered.node.init(&mut registered.context) {
            Ok(()) => {
                registered.context.initialize();
                log::info!("Initialized node '{}'", name);
            }
            Err(e) => {
                registered
                    .context
                    .transition_to_error(format!("Initialization failed: {}", e));
            }
        }
    }

    /// Names of registered nodes in execution order
    pub fn get_node_list(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|registered| registered.node.name().to_string())
            .collect()
    }

    pub fn node_metrics(&self, name: &str) -> Option<&NodeMetrics> {
        self.find(name).map(|registered| registered.context.metrics())
    }

    pub fn node_state(&self, name: &str) -> Option<&NodeState> {
        self.find(name).map(|registered| registered.context.state())
    }

    fn find(&self, name: &str) -> Option<&RegisteredNode> {
        self.nodes
            .iter()
            .find(|registered| registered.node.name() == name)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
