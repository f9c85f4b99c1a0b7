//! Session record owned by the registry.
//!
//! A `Session` is plain data: the registry actor is its only writer and
//! nothing else holds a reference to it. Readers get a [`SessionSnapshot`].

use super::connection::ConnectionHandle;
use super::relay::FrameRelay;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, no producer attached yet.
    Pending,
    /// Producer attached, frames flowing.
    Active,
    /// Terminal. Only ever observed in snapshots taken while removing.
    Stopped,
}

impl SessionStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Stopped => "stopped",
        }
    }
}

/// One relay session.
#[derive(Debug)]
pub(crate) struct Session {
    pub session_id: String,
    pub device_id: String,
    /// Keyed by connection id.
    pub observers: HashMap<String, ConnectionHandle>,
    pub producer: Option<ConnectionHandle>,
    pub status: SessionStatus,
    pub relay: FrameRelay,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        session_id: String,
        device_id: String,
        observer: ConnectionHandle,
        frame_backlog_capacity: usize,
    ) -> Self {
        let mut observers = HashMap::new();
        observers.insert(observer.connection_id().to_string(), observer);

        Self {
            session_id,
            device_id,
            observers,
            producer: None,
            status: SessionStatus::Pending,
            relay: FrameRelay::new(frame_backlog_capacity),
            created_at: Utc::now(),
            started_at: None,
        }
    }

    /// Attach or replace the producer. Returns the replaced handle, if any.
    pub fn set_producer(&mut self, producer: ConnectionHandle) -> Option<ConnectionHandle> {
        self.status = SessionStatus::Active;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.producer.replace(producer)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut observers: Vec<String> = self.observers.keys().cloned().collect();
        observers.sort();

        SessionSnapshot {
            session_id: self.session_id.clone(),
            device_id: self.device_id.clone(),
            status: self.status,
            observers,
            producer: self
                .producer
                .as_ref()
                .map(|p| p.connection_id().to_string()),
            backlog_count: self.relay.backlog_count(),
            dropped_count: self.relay.dropped_count(),
            frames_forwarded: self.relay.frames_forwarded(),
            created_at: self.created_at,
            started_at: self.started_at,
        }
    }
}

/// Point-in-time copy of a session, safe to hand outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub device_id: String,
    pub status: SessionStatus,
    /// Attached observer connection ids, sorted.
    pub observers: Vec<String>,
    /// Producer connection id, if attached.
    pub producer: Option<String>,
    pub backlog_count: usize,
    pub dropped_count: u64,
    pub frames_forwarded: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Whether the observer with this connection id is attached.
    #[must_use]
    pub fn has_observer(&self, connection_id: &str) -> bool {
        self.observers.iter().any(|id| id == connection_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_pending() {
        let (observer, _rx) = ConnectionHandle::new("obs-1", 4);
        let session = Session::new("rc-1".into(), "dev-1".into(), observer, 100);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Pending);
        assert_eq!(snapshot.observers, vec!["obs-1".to_string()]);
        assert!(snapshot.producer.is_none());
        assert!(snapshot.started_at.is_none());
        assert_eq!(snapshot.backlog_count, 0);
        assert_eq!(snapshot.dropped_count, 0);
    }

    #[test]
    fn test_set_producer_activates_and_keeps_start_time() {
        let (observer, _rx) = ConnectionHandle::new("obs-1", 4);
        let (first, _rx1) = ConnectionHandle::new("prod-1", 4);
        let (second, _rx2) = ConnectionHandle::new("prod-2", 4);
        let mut session = Session::new("rc-1".into(), "dev-1".into(), observer, 100);

        assert!(session.set_producer(first).is_none());
        assert_eq!(session.status, SessionStatus::Active);
        let started = session.started_at;
        assert!(started.is_some());

        let replaced = session.set_producer(second).unwrap();
        assert_eq!(replaced.connection_id(), "prod-1");
        assert_eq!(session.started_at, started);
        assert_eq!(session.snapshot().producer.as_deref(), Some("prod-2"));
    }

    #[test]
    fn test_snapshot_sorts_observers() {
        let (b, _rx_b) = ConnectionHandle::new("obs-b", 4);
        let (a, _rx_a) = ConnectionHandle::new("obs-a", 4);
        let mut session = Session::new("rc-1".into(), "dev-1".into(), b, 100);
        session.observers.insert("obs-a".into(), a);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.observers, vec!["obs-a", "obs-b"]);
        assert!(snapshot.has_observer("obs-a"));
        assert!(!snapshot.has_observer("obs-c"));
    }

    #[test]
    fn test_snapshot_serializes_rest_fields() {
        let (observer, _rx) = ConnectionHandle::new("obs-1", 4);
        let session = Session::new("rc-9".into(), "dev-9".into(), observer, 100);

        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["session_id"], "rc-9");
        assert_eq!(json["device_id"], "dev-9");
        assert_eq!(json["status"], "pending");
        assert!(json["started_at"].is_null());
        assert!(json["created_at"].is_string());
    }
}
