//! Pre-configured test data for RC relay tests.

use bytes::Bytes;
use rc_relay::actors::{MediaFrame, RegistryConfig, RelayMetrics, SessionRegistryHandle};
use std::sync::Arc;
use uuid::Uuid;

/// Session/device id pair.
#[derive(Debug, Clone)]
pub struct TestSession {
    pub session_id: String,
    pub device_id: String,
}

impl TestSession {
    #[must_use]
    pub fn new(session_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            device_id: device_id.into(),
        }
    }

    /// Random session on a random device.
    #[must_use]
    pub fn random() -> Self {
        Self::new(
            format!("rc-{}", Uuid::new_v4()),
            format!("device-{}", Uuid::new_v4()),
        )
    }

    /// Random session on the given device.
    #[must_use]
    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self::new(format!("rc-{}", Uuid::new_v4()), device_id)
    }
}

/// Keyframe whose payload encodes `marker`.
#[must_use]
pub fn keyframe(marker: u32) -> MediaFrame {
    MediaFrame::keyframe(payload("key", marker))
}

/// Delta frame whose payload encodes `marker`.
#[must_use]
pub fn delta(marker: u32) -> MediaFrame {
    MediaFrame::delta(payload("delta", marker))
}

fn payload(prefix: &str, marker: u32) -> Bytes {
    Bytes::from(format!("{prefix}-{marker}"))
}

/// Registry with the given backlog capacity and fresh metrics.
#[must_use]
pub fn test_registry(frame_backlog_capacity: usize) -> SessionRegistryHandle {
    test_registry_with_metrics(frame_backlog_capacity).0
}

/// Registry plus its metrics handle.
#[must_use]
pub fn test_registry_with_metrics(
    frame_backlog_capacity: usize,
) -> (SessionRegistryHandle, Arc<RelayMetrics>) {
    let metrics = RelayMetrics::new();
    let registry = SessionRegistryHandle::new(
        RegistryConfig {
            registry_id: format!("rc-test-{}", Uuid::new_v4()),
            frame_backlog_capacity,
            ..RegistryConfig::default()
        },
        Arc::clone(&metrics),
    );
    (registry, metrics)
}
