//! Actor metrics and mailbox monitoring.
//!
//! Provides mailbox depth monitoring with configurable thresholds:
//!
//! | Actor Type | Normal | Warning | Critical |
//! |------------|--------|---------|----------|
//! | Registry   | < 200  | 200-800 | > 800    |
//! | Connection | < 64   | 64-256  | > 256    |
//!
//! Prometheus emission lives in [`crate::observability::metrics`]; the
//! counters here are the in-process view used by status queries and tests.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Mailbox depth thresholds for the registry actor.
pub const REGISTRY_MAILBOX_NORMAL: usize = 200;
pub const REGISTRY_MAILBOX_WARNING: usize = 800;

/// Outbound buffer thresholds for connection handles.
pub const CONNECTION_MAILBOX_NORMAL: usize = 64;
pub const CONNECTION_MAILBOX_WARNING: usize = 256;

/// Log a drop warning once per this many drops (plus the first one).
const DROP_LOG_INTERVAL: u64 = 1000;

/// Actor type for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorType {
    /// SessionRegistry actor (singleton).
    Registry,
    /// Outbound side of one connection handle.
    Connection,
}

impl ActorType {
    /// Returns the actor type as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorType::Registry => "registry",
            ActorType::Connection => "connection",
        }
    }

    /// Returns the warning threshold for this actor type.
    #[must_use]
    pub const fn warning_threshold(&self) -> usize {
        match self {
            ActorType::Registry => REGISTRY_MAILBOX_WARNING,
            ActorType::Connection => CONNECTION_MAILBOX_WARNING,
        }
    }

    /// Returns the normal threshold for this actor type.
    #[must_use]
    pub const fn normal_threshold(&self) -> usize {
        match self {
            ActorType::Registry => REGISTRY_MAILBOX_NORMAL,
            ActorType::Connection => CONNECTION_MAILBOX_NORMAL,
        }
    }
}

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailboxLevel {
    /// Below normal threshold.
    Normal,
    /// Between normal and warning thresholds.
    Warning,
    /// Above warning threshold.
    Critical,
}

/// Mailbox monitor for tracking queue depth and drops.
#[derive(Debug)]
pub struct MailboxMonitor {
    /// Actor type for labeling.
    actor_type: ActorType,
    /// Actor identifier (registry_id, connection_id, etc.).
    actor_id: String,
    /// Last observed queue depth.
    depth: AtomicUsize,
    /// Highest observed queue depth.
    peak_depth: AtomicUsize,
    /// Total messages processed.
    messages_processed: AtomicU64,
    /// Messages dropped due to backpressure.
    messages_dropped: AtomicU64,
}

impl MailboxMonitor {
    /// Create a new mailbox monitor for the given actor.
    #[must_use]
    pub fn new(actor_type: ActorType, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type,
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
        }
    }

    /// Record an observed queue depth.
    ///
    /// Callers sample the real queue length (`Receiver::len` for the
    /// registry, used buffer slots for a connection). Crossing into a
    /// higher level is logged once per crossing.
    pub fn observe_depth(&self, depth: usize) {
        let previous = self.depth.swap(depth, Ordering::Relaxed);
        self.peak_depth.fetch_max(depth, Ordering::Relaxed);

        let level = self.level_for_depth(depth);
        if level <= self.level_for_depth(previous) {
            return;
        }

        match level {
            MailboxLevel::Critical => warn!(
                target: "rc.actor.mailbox",
                actor_type = self.actor_type.as_str(),
                actor_id = %self.actor_id,
                depth,
                threshold = self.actor_type.warning_threshold(),
                "Mailbox depth critical"
            ),
            MailboxLevel::Warning => debug!(
                target: "rc.actor.mailbox",
                actor_type = self.actor_type.as_str(),
                actor_id = %self.actor_id,
                depth,
                "Mailbox depth elevated"
            ),
            MailboxLevel::Normal => {}
        }
    }

    /// Record a message handled (registry) or accepted into the buffer
    /// (connection).
    pub fn record_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message being dropped due to backpressure.
    pub fn record_drop(&self) {
        let dropped = self.messages_dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if dropped == 1 || dropped % DROP_LOG_INTERVAL == 0 {
            warn!(
                target: "rc.actor.mailbox",
                actor_type = self.actor_type.as_str(),
                actor_id = %self.actor_id,
                dropped = dropped,
                "Message dropped due to backpressure"
            );
        }
    }

    /// Get the current mailbox depth.
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Get the peak mailbox depth.
    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    /// Get total messages processed.
    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Get total messages dropped.
    #[must_use]
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }

    /// Get the current mailbox level.
    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        self.level_for_depth(self.current_depth())
    }

    /// Determine mailbox level for a given depth.
    fn level_for_depth(&self, depth: usize) -> MailboxLevel {
        if depth > self.actor_type.warning_threshold() {
            MailboxLevel::Critical
        } else if depth > self.actor_type.normal_threshold() {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

/// Aggregated metrics for the relay.
///
/// Shared between the registry actor (writer) and status/health readers.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Sessions currently registered.
    pub active_sessions: AtomicUsize,
    /// Observer handles currently attached across all sessions.
    pub active_observers: AtomicUsize,
    /// Frames forwarded to observers (counted once per frame, not per observer).
    pub frames_forwarded: AtomicU64,
    /// Delta frames dropped by the backlog policy.
    pub frames_dropped: AtomicU64,
    /// Individual deliveries dropped because an observer buffer was full.
    pub deliveries_dropped: AtomicU64,
    /// Liveness watches that fired and were applied.
    pub liveness_fired: AtomicU64,
    /// Total actor panics (indicates bugs).
    pub actor_panics: AtomicU64,
    /// Total messages processed by the registry.
    pub total_messages_processed: AtomicU64,
}

impl RelayMetrics {
    /// Create a new shared metrics instance.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Increment active session count.
    pub fn session_created(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active session count.
    pub fn session_removed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    /// Increment active observer count.
    pub fn observer_attached(&self) {
        self.active_observers.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrease active observer count by `count`.
    pub fn observers_detached(&self, count: usize) {
        self.active_observers.fetch_sub(count, Ordering::Relaxed);
    }

    /// Record a forwarded frame.
    pub fn record_frame_forwarded(&self) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delta frame dropped for congestion.
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record per-observer deliveries dropped on full buffers.
    pub fn record_deliveries_dropped(&self, count: u64) {
        self.deliveries_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record an applied liveness firing.
    pub fn record_liveness_fired(&self) {
        self.liveness_fired.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an actor panic.
    pub fn record_panic(&self, actor_type: ActorType) {
        self.actor_panics.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            target: "rc.actor.panic",
            actor_type = actor_type.as_str(),
            total_panics = self.actor_panics.load(Ordering::Relaxed),
            "Actor panic detected - indicates bug, investigation required"
        );
    }

    /// Record a message being processed.
    pub fn record_message_processed(&self) {
        self.total_messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total messages processed by the registry.
    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.total_messages_processed.load(Ordering::Relaxed)
    }

    /// Get current session count.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Get current observer count.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.active_observers.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_type_as_str() {
        assert_eq!(ActorType::Registry.as_str(), "registry");
        assert_eq!(ActorType::Connection.as_str(), "connection");
    }

    #[test]
    fn test_actor_type_thresholds() {
        assert_eq!(ActorType::Registry.normal_threshold(), 200);
        assert_eq!(ActorType::Registry.warning_threshold(), 800);
        assert_eq!(ActorType::Connection.normal_threshold(), 64);
        assert_eq!(ActorType::Connection.warning_threshold(), 256);
    }

    #[test]
    fn test_mailbox_monitor_observe_depth() {
        let monitor = MailboxMonitor::new(ActorType::Registry, "rc-relay-1");
        assert_eq!(monitor.current_depth(), 0);

        monitor.observe_depth(3);
        monitor.observe_depth(12);
        monitor.observe_depth(4);
        assert_eq!(monitor.current_depth(), 4);
        assert_eq!(monitor.peak_depth(), 12);

        monitor.record_processed();
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_mailbox_monitor_levels() {
        let monitor = MailboxMonitor::new(ActorType::Registry, "rc-relay-1");
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        monitor.observe_depth(300);
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        monitor.observe_depth(900);
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);

        // Draining brings the level back down; the peak is kept.
        monitor.observe_depth(10);
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);
        assert_eq!(monitor.peak_depth(), 900);
    }

    #[test]
    fn test_connection_levels_use_connection_thresholds() {
        let monitor = MailboxMonitor::new(ActorType::Connection, "conn-1");

        monitor.observe_depth(100);
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        monitor.observe_depth(300);
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_mailbox_level_ordering() {
        assert!(MailboxLevel::Normal < MailboxLevel::Warning);
        assert!(MailboxLevel::Warning < MailboxLevel::Critical);
    }

    #[test]
    fn test_mailbox_monitor_drop_and_processed() {
        let monitor = MailboxMonitor::new(ActorType::Connection, "conn-1");

        monitor.record_processed();
        monitor.record_drop();
        monitor.record_drop();

        assert_eq!(monitor.messages_processed(), 1);
        assert_eq!(monitor.messages_dropped(), 2);
        assert_eq!(monitor.current_depth(), 0);
    }

    #[test]
    fn test_relay_metrics_counts() {
        let metrics = RelayMetrics::new();

        metrics.session_created();
        metrics.session_created();
        metrics.observer_attached();
        metrics.observer_attached();
        metrics.observer_attached();
        assert_eq!(metrics.session_count(), 2);
        assert_eq!(metrics.observer_count(), 3);

        metrics.session_removed();
        metrics.observers_detached(2);
        assert_eq!(metrics.session_count(), 1);
        assert_eq!(metrics.observer_count(), 1);
    }

    #[test]
    fn test_relay_metrics_frames() {
        let metrics = RelayMetrics::new();

        metrics.record_frame_forwarded();
        metrics.record_frame_dropped();
        metrics.record_frame_dropped();
        metrics.record_deliveries_dropped(3);

        assert_eq!(metrics.frames_forwarded.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.frames_dropped.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.deliveries_dropped.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_relay_metrics_panics() {
        let metrics = RelayMetrics::new();

        metrics.record_panic(ActorType::Registry);
        assert_eq!(metrics.actor_panics.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_relay_metrics_messages_processed() {
        let metrics = RelayMetrics::new();

        metrics.record_message_processed();
        metrics.record_message_processed();
        assert_eq!(metrics.messages_processed(), 2);
    }
}
