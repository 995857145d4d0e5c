use crate::core::node::{LogSummary, NodeInfo};
use crate::error::{AvoidError, AvoidResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Default queue depth for a topic created with [`Hub::new`]
pub const DEFAULT_DEPTH: usize = 10;

/// Lock-free atomic metrics for Hub monitoring
#[derive(Debug, Default)]
struct AtomicHubMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    send_failures: AtomicU64,
}

impl AtomicHubMetrics {
    fn snapshot(&self) -> HubMetrics {
        HubMetrics {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a hub's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubMetrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    /// Messages evicted by a newer one while the queue was full
    pub messages_dropped: u64,
    pub send_failures: u64,
}

struct HubInner<T> {
    topic_name: String,
    depth: usize,
    queue: Mutex<VecDeque<T>>,
    closed: AtomicBool,
    metrics: AtomicHubMetrics,
}

/// Named in-process topic with keep-last semantics
///
/// Every clone refers to the same queue. When the queue already holds
/// `depth` messages, sending evicts the oldest one, so a slow consumer
/// always sees the most recent data. Messages are received in send order.
pub struct Hub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for Hub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Hub<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("topic_name", &self.inner.topic_name)
            .field("depth", &self.inner.depth)
            .field("closed", &self.inner.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T> Hub<T> {
    /// Create a new Hub
    pub fn new(topic_name: &str) -> AvoidResult<Self> {
        Self::new_with_capacity(topic_name, DEFAULT_DEPTH)
    }

    /// Create a new Hub keeping at most `depth` pending messages
    pub fn new_with_capacity(topic_name: &str, depth: usize) -> AvoidResult<Self> {
        if topic_name.is_empty() {
            return Err(AvoidError::InvalidConfig(
                "topic name must not be empty".to_string(),
            ));
        }
        if depth == 0 {
            return Err(AvoidError::InvalidConfig(format!(
                "topic '{}' needs a queue depth of at least 1",
                topic_name
            )));
        }

        Ok(Hub {
            inner: Arc::new(HubInner {
                topic_name: topic_name.to_string(),
                depth,
                queue: Mutex::new(VecDeque::with_capacity(depth)),
                closed: AtomicBool::new(false),
                metrics: AtomicHubMetrics::default(),
            }),
        })
    }

    /// Send a message, handing it back if the topic is closed
    pub fn send(&self, msg: T, ctx: Option<&mut NodeInfo>) -> Result<(), T>
    where
        T: LogSummary,
    {
        let summary = ctx.as_ref().map(|_| msg.log_summary());
        self.push(msg)?;

        if let (Some(ctx), Some(summary)) = (ctx, summary) {
            ctx.log_pub_summary(&self.inner.topic_name, &summary);
        }
        Ok(())
    }

    /// Receive the oldest pending message
    pub fn recv(&self, ctx: Option<&mut NodeInfo>) -> Option<T>
    where
        T: LogSummary,
    {
        let msg = self.pop()?;
        if let Some(ctx) = ctx {
            ctx.log_sub_summary(&self.inner.topic_name, &msg.log_summary());
        }
        Some(msg)
    }

    /// Stop accepting messages; pending ones can still be received
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of messages waiting to be received
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Get current metrics snapshot (lock-free)
    pub fn get_metrics(&self) -> HubMetrics {
        self.inner.metrics.snapshot()
    }

    /// Get the topic name for this Hub
    pub fn get_topic_name(&self) -> &str {
        &self.inner.topic_name
    }

    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    fn push(&self, msg: T) -> Result<(), T> {
        let metrics = &self.inner.metrics;
        if self.is_closed() {
            metrics.send_failures.fetch_add(1, Ordering::Relaxed);
            return Err(msg);
        }

        let mut queue = self.inner.queue.lock();
        if queue.len() >= self.inner.depth {
            queue.pop_front();
            metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(msg);
        metrics.messages_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn pop(&self) -> Option<T> {
        let msg = self.inner.queue.lock().pop_front()?;
        self.inner
            .metrics
            .messages_received
            .fetch_add(1, Ordering::Relaxed);
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let hub = Hub::new("numbers").unwrap();
        for i in 0..3u64 {
            hub.send(i, None).unwrap();
        }
        assert_eq!(hub.recv(None), Some(0));
        assert_eq!(hub.recv(None), Some(1));
        assert_eq!(hub.recv(None), Some(2));
        assert_eq!(hub.recv(None), None);
    }

    #[test]
    fn test_keep_last_drops_oldest() {
        let hub = Hub::new_with_capacity("scan", 2).unwrap();
        for i in 0..5u64 {
            hub.send(i, None).unwrap();
        }
        assert_eq!(hub.pending(), 2);
        assert_eq!(hub.recv(None), Some(3));
        assert_eq!(hub.recv(None), Some(4));

        let metrics = hub.get_metrics();
        assert_eq!(metrics.messages_sent, 5);
        assert_eq!(metrics.messages_dropped, 3);
        assert_eq!(metrics.messages_received, 2);
    }

    #[test]
    fn test_clones_share_queue() {
        let publisher = Hub::new("cmd_vel").unwrap();
        let subscriber = publisher.clone();
        publisher.send(7u64, None).unwrap();
        assert_eq!(subscriber.recv(None), Some(7));
    }

    #[test]
    fn test_closed_hub_returns_message() {
        let hub = Hub::new("cmd_vel").unwrap();
        hub.send(1u64, None).unwrap();
        hub.close();

        assert_eq!(hub.send(2u64, None), Err(2));
        assert_eq!(hub.get_metrics().send_failures, 1);
        // Pending messages survive closing
        assert_eq!(hub.recv(None), Some(1));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(Hub::<u64>::new_with_capacity("scan", 0).is_err());
        assert!(Hub::<u64>::new("").is_err());
    }

    #[test]
    fn test_send_logs_through_context() {
        let hub = Hub::new("count").unwrap();
        let mut ctx = NodeInfo::new("producer".to_string(), false);
        hub.send(1u64, Some(&mut ctx)).unwrap();
        assert_eq!(ctx.published_topics().get("count"), Some(&1));

        let mut sub_ctx = NodeInfo::new("consumer".to_string(), false);
        assert_eq!(hub.recv(Some(&mut sub_ctx)), Some(1));
        assert_eq!(sub_ctx.subscribed_topics().get("count"), Some(&1));
    }
}
