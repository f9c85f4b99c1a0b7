//! Message types for actor communication.
//!
//! All registry requests travel as strongly-typed `RegistryMessage`s over a
//! `tokio::sync::mpsc` mailbox. Request-reply operations carry a
//! `tokio::sync::oneshot` sender; frames are fire-and-forget.

use crate::errors::RelayError;

use super::connection::ConnectionHandle;
use super::liveness::WatchKey;
use super::metrics::MailboxLevel;
use super::session::SessionSnapshot;

use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;

/// Messages sent to the `SessionRegistry` actor.
#[derive(Debug)]
pub enum RegistryMessage {
    /// Create a session with its first observer.
    CreateSession {
        session_id: String,
        device_id: String,
        observer: ConnectionHandle,
        /// Response channel for the created session or `SessionExists`.
        respond_to: oneshot::Sender<Result<SessionSnapshot, RelayError>>,
    },

    /// Attach an additional observer (no-op for unknown sessions).
    AttachObserver {
        session_id: String,
        observer: ConnectionHandle,
        respond_to: oneshot::Sender<()>,
    },

    /// Detach an observer; stops the session when it was the last one.
    DetachObserver {
        session_id: String,
        connection_id: String,
        respond_to: oneshot::Sender<()>,
    },

    /// Attach (or replace) the device's producer connection.
    AttachProducer {
        session_id: String,
        producer: ConnectionHandle,
        respond_to: oneshot::Sender<()>,
    },

    /// Submit one media frame for relay.
    EnqueueFrame {
        session_id: String,
        frame: MediaFrame,
    },

    /// Stop and remove a session.
    StopSession {
        session_id: String,
        respond_to: oneshot::Sender<()>,
    },

    /// Read a snapshot of one session.
    GetSession {
        session_id: String,
        respond_to: oneshot::Sender<Result<SessionSnapshot, RelayError>>,
    },

    /// Read snapshots of every session controlling a device.
    ListSessionsForDevice {
        device_id: String,
        respond_to: oneshot::Sender<Vec<SessionSnapshot>>,
    },

    /// A liveness watch fired.
    ConnectionTerminated { key: WatchKey, watch_id: u64 },

    /// Get registry status (for health checks).
    GetStatus {
        respond_to: oneshot::Sender<RegistryStatus>,
    },

    /// Initiate graceful shutdown.
    Shutdown {
        deadline: Duration,
        respond_to: oneshot::Sender<Result<(), RelayError>>,
    },
}

impl RegistryMessage {
    /// Operation name used as the `operation` metric label.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            RegistryMessage::CreateSession { .. } => "create_session",
            RegistryMessage::AttachObserver { .. } => "attach_observer",
            RegistryMessage::DetachObserver { .. } => "detach_observer",
            RegistryMessage::AttachProducer { .. } => "attach_producer",
            RegistryMessage::EnqueueFrame { .. } => "enqueue_frame",
            RegistryMessage::StopSession { .. } => "stop_session",
            RegistryMessage::GetSession { .. } => "get_session",
            RegistryMessage::ListSessionsForDevice { .. } => "list_sessions_for_device",
            RegistryMessage::ConnectionTerminated { .. } => "connection_terminated",
            RegistryMessage::GetStatus { .. } => "get_status",
            RegistryMessage::Shutdown { .. } => "shutdown",
        }
    }
}

// ----------------------------------------------------------------------------
// Supporting Types
// ----------------------------------------------------------------------------

/// Classification of a video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Self-contained frame; decoders resynchronize from it.
    Keyframe,
    /// Depends on preceding frames; safe to drop under congestion.
    Delta,
}

impl FrameKind {
    /// Returns the frame kind as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Keyframe => "keyframe",
            FrameKind::Delta => "delta",
        }
    }
}

/// A frame submitted by a producer.
#[derive(Debug, Clone)]
pub struct MediaFrame {
    /// Keyframe or delta.
    pub kind: FrameKind,
    /// Encoded frame bytes (reference-counted, never copied per observer).
    pub payload: Bytes,
}

impl MediaFrame {
    /// Build a keyframe.
    #[must_use]
    pub fn keyframe(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Keyframe,
            payload: payload.into(),
        }
    }

    /// Build a delta frame.
    #[must_use]
    pub fn delta(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Delta,
            payload: payload.into(),
        }
    }

    /// Whether this frame is a keyframe.
    #[must_use]
    pub fn is_keyframe(&self) -> bool {
        self.kind == FrameKind::Keyframe
    }
}

/// A frame accepted by the relay policy, as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedFrame {
    /// Session the frame belongs to.
    pub session_id: String,
    /// Per-session sequence number of accepted frames (starts at 0).
    pub sequence: u64,
    /// Keyframe or delta.
    pub kind: FrameKind,
    /// Frame bytes.
    pub payload: Bytes,
}

/// Events delivered to connection handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A relayed media frame.
    Frame(RelayedFrame),
    /// The session ended; no further frames follow.
    SessionEnded {
        session_id: String,
        reason: EndReason,
    },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Explicit `stop_session`.
    Stopped,
    /// The producer connection terminated.
    ProducerDisconnected,
    /// The last observer detached or disconnected.
    ObserversLeft,
    /// Registry shutdown.
    Shutdown,
}

impl EndReason {
    /// Returns the reason as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EndReason::Stopped => "stopped",
            EndReason::ProducerDisconnected => "producer_disconnected",
            EndReason::ObserversLeft => "observers_left",
            EndReason::Shutdown => "shutdown",
        }
    }
}

/// Role of a connection within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// RC window viewing/controlling the device.
    Observer,
    /// The device's streaming connection.
    Producer,
}

impl Role {
    /// Returns the role as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Observer => "observer",
            Role::Producer => "producer",
        }
    }
}

/// Status of the `SessionRegistry`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    /// Sessions currently registered.
    pub session_count: usize,
    /// Observers attached across all sessions.
    pub observer_count: usize,
    /// Sessions with a producer attached.
    pub producer_count: usize,
    /// Whether the registry is draining.
    pub is_draining: bool,
    /// Messages waiting in the registry mailbox.
    pub mailbox_depth: usize,
    /// Highest mailbox depth seen since start.
    pub mailbox_peak_depth: usize,
    /// Alert level for the current mailbox depth.
    pub mailbox_level: MailboxLevel,
    /// Messages handled since start.
    pub messages_processed: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_media_frame_constructors() {
        let key = MediaFrame::keyframe(vec![1u8, 2, 3]);
        assert!(key.is_keyframe());
        assert_eq!(key.payload.len(), 3);

        let delta = MediaFrame::delta(Bytes::from_static(b"d"));
        assert!(!delta.is_keyframe());
        assert_eq!(delta.kind, FrameKind::Delta);
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(FrameKind::Keyframe.as_str(), "keyframe");
        assert_eq!(FrameKind::Delta.as_str(), "delta");
        assert_eq!(Role::Observer.as_str(), "observer");
        assert_eq!(Role::Producer.as_str(), "producer");
        assert_eq!(EndReason::ProducerDisconnected.as_str(), "producer_disconnected");
        assert_eq!(EndReason::ObserversLeft.as_str(), "observers_left");
    }

    #[test]
    fn test_relayed_frame_shares_payload() {
        let payload = Bytes::from(vec![0u8; 1024]);
        let frame = RelayedFrame {
            session_id: "rc-1".to_string(),
            sequence: 7,
            kind: FrameKind::Delta,
            payload: payload.clone(),
        };
        let cloned = frame.clone();
        assert_eq!(cloned.payload.as_ptr(), payload.as_ptr());
    }

    #[test]
    fn test_operation_labels() {
        let (tx, _rx) = oneshot::channel();
        let msg = RegistryMessage::StopSession {
            session_id: "rc-1".to_string(),
            respond_to: tx,
        };
        assert_eq!(msg.operation(), "stop_session");

        let msg = RegistryMessage::EnqueueFrame {
            session_id: "rc-1".to_string(),
            frame: MediaFrame::delta(Bytes::new()),
        };
        assert_eq!(msg.operation(), "enqueue_frame");
    }

    #[test]
    fn test_end_reason_serializes_snake_case() {
        let json = serde_json::to_string(&EndReason::ProducerDisconnected).unwrap();
        assert_eq!(json, "\"producer_disconnected\"");
    }
}
