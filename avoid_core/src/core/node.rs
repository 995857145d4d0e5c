use crate::error::AvoidResult;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Trait for providing lightweight logging summaries of message types
///
/// Scans carry hundreds of ranges; implementations should only include
/// metadata so a log line stays short.
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}

/// Node states for monitoring and lifecycle management
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error(String),
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "Uninitialized"),
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Running => write!(f, "Running"),
            NodeState::Stopping => write!(f, "Stopping"),
            NodeState::Stopped => write!(f, "Stopped"),
            NodeState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Performance metrics for node execution
#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    pub total_ticks: u64,
    pub successful_ticks: u64,
    pub failed_ticks: u64,
    pub avg_tick_duration_ms: f64,
    pub max_tick_duration_ms: f64,
    pub last_tick_duration_ms: f64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub errors_count: u64,
    pub warnings_count: u64,
}

/// Configuration parameters for node behavior
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub enable_logging: bool,
    pub log_level: log::LevelFilter,
    /// Bound on the warning and error history kept in memory
    pub history_len: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            enable_logging: true,
            log_level: log::LevelFilter::Debug,
            history_len: 100,
        }
    }
}

/// Context handed to a node on every lifecycle call
pub struct NodeInfo {
    name: String,
    instance_id: String,

    state: NodeState,
    previous_state: NodeState,

    config: NodeConfig,
    metrics: NodeMetrics,
    tick_start_time: Option<Instant>,

    error_history: Vec<(Instant, String)>,
    warning_history: Vec<(Instant, String)>,

    // topic -> message count
    published_topics: HashMap<String, u64>,
    subscribed_topics: HashMap<String, u64>,
}

impl NodeInfo {
    pub fn new(node_name: String, logging_enabled: bool) -> Self {
        let config = NodeConfig {
            enable_logging: logging_enabled,
            ..Default::default()
        };
        Self::new_with_config(node_name, config)
    }

    pub fn new_with_config(node_name: String, config: NodeConfig) -> Self {
        Self {
            name: node_name,
            instance_id: uuid::Uuid::new_v4().to_string(),
            state: NodeState::Uninitialized,
            previous_state: NodeState::Uninitialized,
            config,
            metrics: NodeMetrics::default(),
            tick_start_time: None,
            error_history: Vec::new(),
            warning_history: Vec::new(),
            published_topics: HashMap::new(),
            subscribed_topics: HashMap::new(),
        }
    }

    // State Management Methods
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn previous_state(&self) -> &NodeState {
        &self.previous_state
    }

    pub fn set_state(&mut self, new_state: NodeState) {
        if self.state != new_state {
            self.previous_state = self.state.clone();
            self.state = new_state;
        }
    }

    pub fn transition_to_error(&mut self, error_msg: String) {
        self.log_error(&error_msg);
        self.set_state(NodeState::Error(error_msg));
    }

    // Lifecycle Methods
    pub fn initialize(&mut self) {
        self.set_state(NodeState::Initializing);
        self.set_state(NodeState::Running);
    }

    pub fn shutdown(&mut self) {
        self.set_state(NodeState::Stopping);
        self.set_state(NodeState::Stopped);
    }

    // Tick Management
    pub fn start_tick(&mut self) {
        self.tick_start_time = Some(Instant::now());
        if self.state == NodeState::Uninitialized {
            self.initialize();
        }
    }

    pub fn record_tick(&mut self) {
        if let Some(start_time) = self.tick_start_time.take() {
            let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

            self.metrics.total_ticks += 1;
            self.metrics.successful_ticks += 1;
            self.metrics.last_tick_duration_ms = duration_ms;
            if duration_ms > self.metrics.max_tick_duration_ms {
                self.metrics.max_tick_duration_ms = duration_ms;
            }

            let total_duration =
                self.metrics.avg_tick_duration_ms * (self.metrics.successful_ticks - 1) as f64;
            self.metrics.avg_tick_duration_ms =
                (total_duration + duration_ms) / self.metrics.successful_ticks as f64;
        }
    }

    pub fn record_tick_failure(&mut self, error_msg: String) {
        self.metrics.total_ticks += 1;
        self.metrics.failed_ticks += 1;
        if let Some(start_time) = self.tick_start_time.take() {
            self.metrics.last_tick_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        }
        self.log_error(&error_msg);
    }

    // Logging Methods
    pub fn log_pub<T: LogSummary>(&mut self, topic: &str, data: &T) {
        let summary = data.log_summary();
        self.log_pub_summary(topic, &summary);
    }

    pub fn log_sub<T: LogSummary>(&mut self, topic: &str, data: &T) {
        let summary = data.log_summary();
        self.log_sub_summary(topic, &summary);
    }

    /// Record a publish using a summary computed before the message moved
    pub fn log_pub_summary(&mut self, topic: &str, summary: &str) {
        if self.logs_at(log::Level::Debug) {
            log::debug!(
                target: "avoid::pubsub",
                "[{}] [tick {}us] {} --PUB--> '{}' = {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                self.current_tick_us(),
                self.name,
                topic,
                summary
            );
        }
        *self.published_topics.entry(topic.to_string()).or_insert(0) += 1;
        self.metrics.messages_sent += 1;
    }

    /// Record a receive using a summary computed before the message moved
    pub fn log_sub_summary(&mut self, topic: &str, summary: &str) {
        if self.logs_at(log::Level::Debug) {
            log::debug!(
                target: "avoid::pubsub",
                "[{}] [tick {}us] {} <--SUB-- '{}' = {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                self.current_tick_us(),
                self.name,
                topic,
                summary
            );
        }
        *self.subscribed_topics.entry(topic.to_string()).or_insert(0) += 1;
        self.metrics.messages_received += 1;
    }

    pub fn log_info(&self, message: &str) {
        if self.logs_at(log::Level::Info) {
            log::info!("[{}] {}", self.name, message);
        }
    }

    pub fn log_warning(&mut self, message: &str) {
        if self.logs_at(log::Level::Warn) {
            log::warn!("[{}] {}", self.name, message);
        }
        push_bounded(&mut self.warning_history, message, self.config.history_len);
        self.metrics.warnings_count += 1;
    }

    pub fn log_error(&mut self, message: &str) {
        if self.logs_at(log::Level::Error) {
            log::error!("[{}] {}", self.name, message);
        }
        push_bounded(&mut self.error_history, message, self.config.history_len);
        self.metrics.errors_count += 1;
    }

    pub fn log_debug(&self, message: &str) {
        if self.logs_at(log::Level::Debug) {
            log::debug!("[{}] {}", self.name, message);
        }
    }

    fn logs_at(&self, level: log::Level) -> bool {
        self.config.enable_logging && level <= self.config.log_level
    }

    fn current_tick_us(&self) -> u64 {
        self.tick_start_time
            .map(|start| start.elapsed().as_micros() as u64)
            .unwrap_or(0)
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }
    pub fn published_topics(&self) -> &HashMap<String, u64> {
        &self.published_topics
    }
    pub fn subscribed_topics(&self) -> &HashMap<String, u64> {
        &self.subscribed_topics
    }
    pub fn warning_history(&self) -> impl Iterator<Item = &str> {
        self.warning_history.iter().map(|(_, msg)| msg.as_str())
    }
    pub fn error_history(&self) -> impl Iterator<Item = &str> {
        self.error_history.iter().map(|(_, msg)| msg.as_str())
    }
}

fn push_bounded(history: &mut Vec<(Instant, String)>, message: &str, max_len: usize) {
    history.push((Instant::now(), message.to_string()));
    if history.len() > max_len {
        history.remove(0);
    }
}

/// Topic metadata for monitoring and introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub topic_name: String,
    pub type_name: String,
}

/// Lifecycle trait for everything the scheduler drives
pub trait Node: Send {
    /// Get the node's name (must be unique)
    fn name(&self) -> &'static str;

    /// Initialize the node (called once at startup)
    fn init(&mut self, ctx: &mut NodeInfo) -> AvoidResult<()> {
        ctx.log_info("Node initialized successfully");
        Ok(())
    }

    /// Main execution step (called repeatedly)
    fn tick(&mut self, ctx: Option<&mut NodeInfo>);

    /// Shutdown the node (called once at cleanup)
    fn shutdown(&mut self, ctx: &mut NodeInfo) -> AvoidResult<()> {
        ctx.log_info("Node shutdown successfully");
        Ok(())
    }

    /// Get list of publishers (topic metadata)
    fn get_publishers(&self) -> Vec<TopicMetadata> {
        Vec::new()
    }

    /// Get list of subscribers (topic metadata)
    fn get_subscribers(&self) -> Vec<TopicMetadata> {
        Vec::new()
    }

    /// Health check (optional override)
    fn is_healthy(&self) -> bool {
        true
    }
}

// LogSummary implementations for primitive types
impl LogSummary for f32 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

impl LogSummary for f64 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

impl LogSummary for u64 {
    fn log_summary(&self) -> String {
        self.to_string()
    }
}

impl LogSummary for bool {
    fn log_summary(&self) -> String {
        self.to_string()
    }
}

impl LogSummary for String {
    fn log_summary(&self) -> String {
        self.clone()
    }
}
