//! Prometheus metrics for the RC relay.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rc_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Every label is bounded by an enum in the crate:
//! - `frame_type`: 2 values (keyframe, delta)
//! - `reason` on drops: 2 values (backlog, observer_full)
//! - `reason` on session end: 4 values (`EndReason`)
//! - `role`: 2 values (observer, producer)
//! - `operation`: one per registry operation (~10 values)
//!
//! Session and device ids never appear as labels.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used to
/// render `/metrics`.
///
/// Registry operations are in-memory, so the operation histogram uses
/// sub-millisecond buckets.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("rc_operation".to_string()),
            &[
                0.000_05, 0.000_1, 0.000_25, 0.000_5, 0.001, 0.005, 0.010, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set operation duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Session Gauges
// ============================================================================

/// Set the number of registered sessions.
///
/// Metric: `rc_sessions_active`
pub fn set_sessions_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_sessions_active").set(count as f64);
}

/// Set the number of attached observers across all sessions.
///
/// Metric: `rc_observers_active`
pub fn set_observers_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_observers_active").set(count as f64);
}

/// Set the registry mailbox depth.
///
/// Metric: `rc_registry_mailbox_depth`
///
/// High values mean the registry is falling behind its callers.
pub fn set_registry_mailbox_depth(depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_registry_mailbox_depth").set(depth as f64);
}

// ============================================================================
// Frame Counters
// ============================================================================

/// Record a frame accepted by the relay policy.
///
/// Metric: `rc_frames_forwarded_total`
/// Labels: `frame_type`
pub fn record_frame_forwarded(frame_type: &str) {
    counter!("rc_frames_forwarded_total", "frame_type" => frame_type.to_string()).increment(1);
}

/// Record dropped frames.
///
/// Metric: `rc_frames_dropped_total`
/// Labels: `reason` (`backlog` for policy drops, `observer_full` for
/// per-observer deliveries that hit a full buffer)
pub fn record_frames_dropped(reason: &str, count: u64) {
    counter!("rc_frames_dropped_total", "reason" => reason.to_string()).increment(count);
}

// ============================================================================
// Lifecycle Counters
// ============================================================================

/// Record a session ending.
///
/// Metric: `rc_session_ended_total`
/// Labels: `reason`
pub fn record_session_ended(reason: &str) {
    counter!("rc_session_ended_total", "reason" => reason.to_string()).increment(1);
}

/// Record an applied liveness firing.
///
/// Metric: `rc_liveness_fired_total`
/// Labels: `role`
pub fn record_liveness_fired(role: &str) {
    counter!("rc_liveness_fired_total", "role" => role.to_string()).increment(1);
}

/// Record an actor panic.
///
/// Metric: `rc_actor_panics_total`
/// Labels: `actor_type`
///
/// ALERT: any non-zero value is a bug. All sessions are lost on a registry panic.
pub fn record_actor_panic(actor_type: &str) {
    counter!("rc_actor_panics_total", "actor_type" => actor_type.to_string()).increment(1);
}

/// Record an operation that returned an error to its caller.
///
/// Metric: `rc_errors_total`
/// Labels: `operation`, `error_type`, `status_code`
pub fn record_error(operation: &str, error_type: &str, status_code: u16) {
    counter!("rc_errors_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// Latency
// ============================================================================

/// Record how long the registry spent handling one operation.
///
/// Metric: `rc_operation_duration_seconds`
/// Labels: `operation`
pub fn record_operation_duration(operation: &str, duration: Duration) {
    histogram!("rc_operation_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}
