//! `ConnectionHandle` - reference to one live network connection.
//!
//! The transport layer owns the actual socket. It creates a handle with
//! [`ConnectionHandle::new`], keeps the returned receiver, and drains
//! [`RelayEvent`]s from it onto the wire. The registry only ever holds
//! clones of the handle:
//!
//! - Delivery is a non-blocking `try_send` into a bounded outbound buffer.
//!   A full buffer drops the event instead of waiting.
//! - Termination is signalled by cancelling the handle's token or by the
//!   transport dropping the receiver. Either one resolves [`terminated`].
//!
//! [`terminated`]: ConnectionHandle::terminated

use super::messages::RelayEvent;
use super::metrics::{ActorType, MailboxMonitor};

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of a single non-blocking delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Event placed in the outbound buffer.
    Delivered,
    /// Outbound buffer full, event dropped.
    Dropped,
    /// Receiving side is gone.
    Closed,
}

/// Handle to one live connection.
///
/// Cheap to clone; identity is the `connection_id`.
#[derive(Clone)]
pub struct ConnectionHandle {
    sender: mpsc::Sender<RelayEvent>,
    cancel_token: CancellationToken,
    connection_id: String,
    outbound: Arc<MailboxMonitor>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("connection_id", &self.connection_id)
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.connection_id == other.connection_id
    }
}

impl Eq for ConnectionHandle {}

impl ConnectionHandle {
    /// Create a handle with an outbound buffer of `buffer` events.
    ///
    /// Returns the handle and the receiving end the transport drains.
    /// A `buffer` of zero is raised to one.
    #[must_use]
    pub fn new(
        connection_id: impl Into<String>,
        buffer: usize,
    ) -> (Self, mpsc::Receiver<RelayEvent>) {
        Self::with_token(connection_id, buffer, CancellationToken::new())
    }

    /// Create a handle whose termination is tied to an existing token,
    /// typically a child of the transport's per-connection token.
    #[must_use]
    pub fn with_token(
        connection_id: impl Into<String>,
        buffer: usize,
        cancel_token: CancellationToken,
    ) -> (Self, mpsc::Receiver<RelayEvent>) {
        let connection_id = connection_id.into();
        let (sender, receiver) = mpsc::channel(buffer.max(1));

        let handle = Self {
            sender,
            cancel_token,
            outbound: Arc::new(MailboxMonitor::new(ActorType::Connection, &connection_id)),
            connection_id,
        };

        (handle, receiver)
    }

    /// Get the connection ID.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Deliver an event without waiting.
    pub fn deliver(&self, event: RelayEvent) -> DeliveryOutcome {
        if self.is_terminated() {
            return DeliveryOutcome::Closed;
        }

        match self.sender.try_send(event) {
            Ok(()) => {
                self.outbound.observe_depth(self.queued());
                self.outbound.record_processed();
                DeliveryOutcome::Delivered
            }
            Err(TrySendError::Full(_)) => {
                self.outbound.record_drop();
                DeliveryOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    target: "rc.connection",
                    connection_id = %self.connection_id,
                    "Delivery to closed connection"
                );
                DeliveryOutcome::Closed
            }
        }
    }

    /// Mark the connection as terminated. Idempotent.
    pub fn terminate(&self) {
        self.cancel_token.cancel();
    }

    /// Check whether the connection has terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.cancel_token.is_cancelled() || self.sender.is_closed()
    }

    /// Resolves once the connection terminates.
    pub async fn terminated(&self) {
        tokio::select! {
            () = self.cancel_token.cancelled() => {}
            () = self.sender.closed() => {}
        }
    }

    /// Events waiting in the outbound buffer.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.sender
            .max_capacity()
            .saturating_sub(self.sender.capacity())
    }

    /// Highest outbound buffer depth seen at delivery time.
    #[must_use]
    pub fn peak_queued(&self) -> usize {
        self.outbound.peak_depth()
    }

    /// Events dropped because the outbound buffer was full.
    #[must_use]
    pub fn events_dropped(&self) -> u64 {
        self.outbound.messages_dropped()
    }

    /// Events accepted into the outbound buffer.
    #[must_use]
    pub fn events_delivered(&self) -> u64 {
        self.outbound.messages_processed()
    }
}
