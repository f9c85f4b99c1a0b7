//! Mock RC client connection.
//!
//! Stands in for a transport connection: owns the receiving end of a
//! `ConnectionHandle` and lets tests read what the relay delivered.
//!
//! # Example
//!
//! ```rust,ignore
//! use rc_test_utils::MockRcClient;
//!
//! let mut window = MockRcClient::new("window-1");
//! registry.attach_observer("rc-1", window.handle()).await.unwrap();
//!
//! let frame = window.next_frame().await;
//! window.disconnect(); // fires the liveness watch
//! ```

use rc_relay::actors::{ConnectionHandle, EndReason, RelayEvent, RelayedFrame};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// How long `next_*` helpers wait before failing the test.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default outbound buffer for mock connections.
pub const DEFAULT_MOCK_BUFFER: usize = 256;

/// In-process connection with an inspectable event stream.
#[derive(Debug)]
pub struct MockRcClient {
    handle: ConnectionHandle,
    events: mpsc::Receiver<RelayEvent>,
}

impl MockRcClient {
    #[must_use]
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self::with_buffer(connection_id, DEFAULT_MOCK_BUFFER)
    }

    /// Connection whose outbound buffer holds `buffer` events.
    #[must_use]
    pub fn with_buffer(connection_id: impl Into<String>, buffer: usize) -> Self {
        let (handle, events) = ConnectionHandle::new(connection_id, buffer);
        Self { handle, events }
    }

    /// Handle to pass to the registry.
    #[must_use]
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.handle.connection_id()
    }

    /// Simulate the connection dropping.
    pub fn disconnect(&self) {
        self.handle.terminate();
    }

    /// Next event, failing the test after `EVENT_TIMEOUT`.
    pub async fn next_event(&mut self) -> RelayEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .unwrap_or_else(|_| panic!("{}: no event within {EVENT_TIMEOUT:?}", self.id()))
            .unwrap_or_else(|| panic!("{}: event channel closed", self.id()))
    }

    /// Next event, which must be a frame.
    pub async fn next_frame(&mut self) -> RelayedFrame {
        match self.next_event().await {
            RelayEvent::Frame(frame) => frame,
            other => panic!("{}: expected frame, got {other:?}", self.id()),
        }
    }

    /// Next event must be `SessionEnded` with `reason`.
    pub async fn expect_ended(&mut self, reason: EndReason) {
        match self.next_event().await {
            RelayEvent::SessionEnded { reason: got, .. } => {
                assert_eq!(got, reason, "{}: wrong end reason", self.id());
            }
            other => panic!("{}: expected SessionEnded, got {other:?}", self.id()),
        }
    }

    /// Every event already buffered, without waiting.
    pub fn drain(&mut self) -> Vec<RelayEvent> {
        let mut drained = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return drained,
            }
        }
    }

    /// Buffered frames only, without waiting.
    pub fn drain_frames(&mut self) -> Vec<RelayedFrame> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                RelayEvent::Frame(frame) => Some(frame),
                RelayEvent::SessionEnded { .. } => None,
            })
            .collect()
    }

    /// Assert nothing arrives within `window`.
    pub async fn assert_silent(&mut self, window: Duration) {
        if let Ok(Some(event)) = tokio::time::timeout(window, self.events.recv()).await {
            panic!("{}: unexpected event {event:?}", self.id());
        }
    }
}
