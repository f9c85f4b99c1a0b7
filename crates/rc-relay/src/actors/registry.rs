//! `SessionRegistry` - single writer for all RC session state.
//!
//! The registry is one tokio task owning `HashMap<String, Session>` behind a
//! bounded mailbox. Every public operation becomes a [`RegistryMessage`] and
//! is applied one at a time, which is what keeps session ids unique and the
//! lifecycle consistent without per-session locks.
//!
//! # Lifecycle
//!
//! ```text
//! pending --attach_producer--> active --stop | producer gone | last observer gone--> removed
//!    \_____________________ sole observer gone ______________________________________/
//! ```
//!
//! Removed sessions are deleted, never archived. Their snapshot status is
//! `stopped` only in the reply of a `create_session` whose first observer
//! was already dead.
//!
//! # Graceful Shutdown
//!
//! `shutdown()`:
//! 1. Sets `accepting_new = false` (`create_session` returns `Draining`)
//! 2. Ends every session with `EndReason::Shutdown`
//! 3. Cancels the root `CancellationToken` (stops liveness watches)

use crate::config::{DEFAULT_FRAME_BACKLOG_CAPACITY, DEFAULT_OBSERVER_BUFFER};
use crate::errors::RelayError;
use crate::observability::metrics as prom;

use super::connection::ConnectionHandle;
use super::liveness::{LivenessMonitor, WatchKey};
use super::messages::{
    EndReason, MediaFrame, RegistryMessage, RegistryStatus, RelayEvent, RelayedFrame, Role,
};
use super::metrics::{ActorType, MailboxMonitor, RelayMetrics};
use super::relay::{fan_out, RelayDecision};
use super::session::{Session, SessionSnapshot, SessionStatus};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

/// Registry mailbox capacity.
const REGISTRY_CHANNEL_BUFFER: usize = 1000;

/// Settings for one registry instance.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Identifier used in logs and mailbox metrics.
    pub registry_id: String,
    /// Delta frames forwarded since the last keyframe before drops start.
    pub frame_backlog_capacity: usize,
    /// Outbound buffer size for connections opened through the handle.
    pub observer_buffer: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_id: "rc-relay".to_string(),
            frame_backlog_capacity: DEFAULT_FRAME_BACKLOG_CAPACITY,
            observer_buffer: DEFAULT_OBSERVER_BUFFER,
        }
    }
}

/// Handle to the `SessionRegistry` actor.
///
/// This is the interface transport and REST collaborators call. Cloning is
/// cheap; every clone talks to the same actor.
#[derive(Clone)]
pub struct SessionRegistryHandle {
    sender: mpsc::Sender<RegistryMessage>,
    cancel_token: CancellationToken,
    observer_buffer: usize,
}

impl SessionRegistryHandle {
    /// Spawn the registry actor and return a handle to it.
    ///
    /// A supervisor task watches the actor's `JoinHandle` and records a
    /// panic if the actor dies abnormally.
    #[must_use]
    pub fn new(config: RegistryConfig, metrics: Arc<RelayMetrics>) -> Self {
        let (sender, receiver) = mpsc::channel(REGISTRY_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();
        let registry_id = config.registry_id.clone();
        let observer_buffer = config.observer_buffer;

        let actor = SessionRegistry::new(
            config,
            receiver,
            sender.downgrade(),
            cancel_token.clone(),
            Arc::clone(&metrics),
        );

        let task = tokio::spawn(actor.run());
        tokio::spawn(supervise(task, registry_id, metrics));

        Self {
            sender,
            cancel_token,
            observer_buffer,
        }
    }

    /// Open a connection handle sized with the configured outbound buffer.
    ///
    /// Transports keep the receiver and drain it onto the wire.
    #[must_use]
    pub fn open_connection(
        &self,
        connection_id: impl Into<String>,
    ) -> (ConnectionHandle, mpsc::Receiver<RelayEvent>) {
        ConnectionHandle::new(connection_id, self.observer_buffer)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryMessage,
    ) -> Result<T, RelayError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| RelayError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RelayError::Internal(format!("response receive failed: {e}")))
    }

    /// Create a session with its first observer.
    ///
    /// Returns `SessionExists` if the id is taken and `Draining` once
    /// shutdown has begun.
    pub async fn create_session(
        &self,
        session_id: impl Into<String>,
        device_id: impl Into<String>,
        observer: ConnectionHandle,
    ) -> Result<SessionSnapshot, RelayError> {
        if self.cancel_token.is_cancelled() {
            return Err(RelayError::Draining);
        }

        let session_id = session_id.into();
        let device_id = device_id.into();
        self.request(|respond_to| RegistryMessage::CreateSession {
            session_id,
            device_id,
            observer,
            respond_to,
        })
        .await?
    }

    /// Attach another observer. Unknown sessions are ignored.
    pub async fn attach_observer(
        &self,
        session_id: impl Into<String>,
        observer: ConnectionHandle,
    ) -> Result<(), RelayError> {
        let session_id = session_id.into();
        self.request(|respond_to| RegistryMessage::AttachObserver {
            session_id,
            observer,
            respond_to,
        })
        .await
    }

    /// Detach an observer. Detaching the last one stops the session.
    pub async fn detach_observer(
        &self,
        session_id: impl Into<String>,
        observer: &ConnectionHandle,
    ) -> Result<(), RelayError> {
        let session_id = session_id.into();
        let connection_id = observer.connection_id().to_string();
        self.request(|respond_to| RegistryMessage::DetachObserver {
            session_id,
            connection_id,
            respond_to,
        })
        .await
    }

    /// Attach the device's producer connection, activating the session.
    /// A previously attached producer is replaced.
    pub async fn attach_producer(
        &self,
        session_id: impl Into<String>,
        producer: ConnectionHandle,
    ) -> Result<(), RelayError> {
        let session_id = session_id.into();
        self.request(|respond_to| RegistryMessage::AttachProducer {
            session_id,
            producer,
            respond_to,
        })
        .await
    }

    /// Submit a frame for relay.
    ///
    /// Fire-and-forget: this only waits for mailbox space, never for
    /// observers. Drops are reported through counters, not errors.
    pub async fn enqueue_frame(
        &self,
        session_id: impl Into<String>,
        frame: MediaFrame,
    ) -> Result<(), RelayError> {
        self.sender
            .send(RegistryMessage::EnqueueFrame {
                session_id: session_id.into(),
                frame,
            })
            .await
            .map_err(|e| RelayError::Internal(format!("channel send failed: {e}")))
    }

    /// Stop and remove a session. Idempotent.
    pub async fn stop_session(&self, session_id: impl Into<String>) -> Result<(), RelayError> {
        let session_id = session_id.into();
        self.request(|respond_to| RegistryMessage::StopSession {
            session_id,
            respond_to,
        })
        .await
    }

    /// Snapshot of one session, or `SessionNotFound`.
    pub async fn get_session(
        &self,
        session_id: impl Into<String>,
    ) -> Result<SessionSnapshot, RelayError> {
        let session_id = session_id.into();
        self.request(|respond_to| RegistryMessage::GetSession {
            session_id,
            respond_to,
        })
        .await?
    }

    /// Snapshots of every session for `device_id`, oldest first.
    pub async fn list_sessions_for_device(
        &self,
        device_id: impl Into<String>,
    ) -> Result<Vec<SessionSnapshot>, RelayError> {
        let device_id = device_id.into();
        self.request(|respond_to| RegistryMessage::ListSessionsForDevice {
            device_id,
            respond_to,
        })
        .await
    }

    /// Get the current registry status.
    pub async fn get_status(&self) -> Result<RegistryStatus, RelayError> {
        self.request(|respond_to| RegistryMessage::GetStatus { respond_to })
            .await
    }

    /// Initiate graceful shutdown.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), RelayError> {
        self.request(|respond_to| RegistryMessage::Shutdown {
            deadline,
            respond_to,
        })
        .await?
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token tied to the registry's lifetime.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// Wait for the registry task and record abnormal exits.
async fn supervise(task: JoinHandle<()>, registry_id: String, metrics: Arc<RelayMetrics>) {
    match task.await {
        Ok(()) => {
            debug!(
                target: "rc.actor.registry",
                registry_id = %registry_id,
                "Registry task completed"
            );
        }
        Err(join_error) if join_error.is_panic() => {
            error!(
                target: "rc.actor.registry",
                registry_id = %registry_id,
                error = ?join_error,
                "Registry panicked - all sessions lost"
            );
            metrics.record_panic(ActorType::Registry);
            prom::record_actor_panic(ActorType::Registry.as_str());
        }
        Err(join_error) => {
            warn!(
                target: "rc.actor.registry",
                registry_id = %registry_id,
                error = ?join_error,
                "Registry task aborted"
            );
        }
    }
}

/// The `SessionRegistry` actor.
struct SessionRegistry {
    registry_id: String,
    receiver: mpsc::Receiver<RegistryMessage>,
    cancel_token: CancellationToken,
    sessions: HashMap<String, Session>,
    liveness: LivenessMonitor,
    accepting_new: bool,
    frame_backlog_capacity: usize,
    metrics: Arc<RelayMetrics>,
    mailbox: MailboxMonitor,
}

impl SessionRegistry {
    fn new(
        config: RegistryConfig,
        receiver: mpsc::Receiver<RegistryMessage>,
        weak_sender: mpsc::WeakSender<RegistryMessage>,
        cancel_token: CancellationToken,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        let mailbox = MailboxMonitor::new(ActorType::Registry, &config.registry_id);
        let liveness = LivenessMonitor::new(cancel_token.clone(), weak_sender);

        Self {
            registry_id: config.registry_id,
            receiver,
            cancel_token,
            sessions: HashMap::new(),
            liveness,
            accepting_new: true,
            frame_backlog_capacity: config.frame_backlog_capacity,
            metrics,
            mailbox,
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "rc.actor.registry", fields(registry_id = %self.registry_id))]
    async fn run(mut self) {
        info!(
            target: "rc.actor.registry",
            registry_id = %self.registry_id,
            frame_backlog_capacity = self.frame_backlog_capacity,
            "SessionRegistry started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "rc.actor.registry",
                        registry_id = %self.registry_id,
                        "SessionRegistry received cancellation signal"
                    );
                    self.graceful_shutdown();
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            // Backlog still waiting behind this message.
                            let depth = self.receiver.len();
                            self.mailbox.observe_depth(depth);
                            prom::set_registry_mailbox_depth(depth);

                            self.handle_message(message);
                            self.mailbox.record_processed();
                            self.metrics.record_message_processed();
                        }
                        None => {
                            info!(
                                target: "rc.actor.registry",
                                registry_id = %self.registry_id,
                                "SessionRegistry channel closed, exiting"
                            );
                            self.graceful_shutdown();
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "rc.actor.registry",
            registry_id = %self.registry_id,
            sessions_remaining = self.sessions.len(),
            messages_processed = self.mailbox.messages_processed(),
            peak_mailbox_depth = self.mailbox.peak_depth(),
            "SessionRegistry stopped"
        );
    }

    fn handle_message(&mut self, message: RegistryMessage) {
        let operation = message.operation();
        let start = Instant::now();

        match message {
            RegistryMessage::CreateSession {
                session_id,
                device_id,
                observer,
                respond_to,
            } => {
                let result = self.create_session(session_id, device_id, observer);
                if let Err(e) = &result {
                    prom::record_error(operation, e.kind(), e.status_code());
                }
                let _ = respond_to.send(result);
            }

            RegistryMessage::AttachObserver {
                session_id,
                observer,
                respond_to,
            } => {
                self.attach_observer(&session_id, observer);
                let _ = respond_to.send(());
            }

            RegistryMessage::DetachObserver {
                session_id,
                connection_id,
                respond_to,
            } => {
                self.remove_observer(&session_id, &connection_id);
                let _ = respond_to.send(());
            }

            RegistryMessage::AttachProducer {
                session_id,
                producer,
                respond_to,
            } => {
                self.attach_producer(&session_id, producer);
                let _ = respond_to.send(());
            }

            RegistryMessage::EnqueueFrame { session_id, frame } => {
                self.enqueue_frame(&session_id, frame);
            }

            RegistryMessage::StopSession {
                session_id,
                respond_to,
            } => {
                self.end_session(&session_id, EndReason::Stopped);
                let _ = respond_to.send(());
            }

            RegistryMessage::GetSession {
                session_id,
                respond_to,
            } => {
                let result = self
                    .sessions
                    .get(&session_id)
                    .map(Session::snapshot)
                    .ok_or(RelayError::SessionNotFound(session_id));
                let _ = respond_to.send(result);
            }

            RegistryMessage::ListSessionsForDevice {
                device_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.list_sessions_for_device(&device_id));
            }

            RegistryMessage::ConnectionTerminated { key, watch_id } => {
                self.connection_terminated(key, watch_id);
            }

            RegistryMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.get_status());
            }

            RegistryMessage::Shutdown {
                deadline,
                respond_to,
            } => {
                self.initiate_shutdown(deadline);
                let _ = respond_to.send(Ok(()));
            }
        }

        prom::record_operation_duration(operation, start.elapsed());
    }

    fn create_session(
        &mut self,
        session_id: String,
        device_id: String,
        observer: ConnectionHandle,
    ) -> Result<SessionSnapshot, RelayError> {
        if !self.accepting_new {
            return Err(RelayError::Draining);
        }

        if self.sessions.contains_key(&session_id) {
            debug!(
                target: "rc.actor.registry",
                session_id = %session_id,
                "Rejecting duplicate session id"
            );
            return Err(RelayError::SessionExists);
        }

        let key = WatchKey::new(&session_id, Role::Observer, observer.connection_id());
        let mut session = Session::new(
            session_id.clone(),
            device_id,
            observer.clone(),
            self.frame_backlog_capacity,
        );

        if !self.liveness.watch(key, &observer) {
            // The sole observer is already gone: the session ends before it
            // is ever visible to other callers.
            session.observers.clear();
            session.status = SessionStatus::Stopped;
            prom::record_session_ended(EndReason::ObserversLeft.as_str());
            info!(
                target: "rc.actor.registry",
                session_id = %session_id,
                "First observer already terminated, session not retained"
            );
            return Ok(session.snapshot());
        }

        let snapshot = session.snapshot();
        self.sessions.insert(session_id.clone(), session);
        self.metrics.session_created();
        self.metrics.observer_attached();
        self.publish_gauges();

        info!(
            target: "rc.actor.registry",
            session_id = %session_id,
            device_id = %snapshot.device_id,
            total_sessions = self.sessions.len(),
            "Session created"
        );

        Ok(snapshot)
    }

    fn attach_observer(&mut self, session_id: &str, observer: ConnectionHandle) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            debug!(
                target: "rc.actor.registry",
                session_id = %session_id,
                "attach_observer for unknown session ignored"
            );
            return;
        };

        let connection_id = observer.connection_id().to_string();
        let reattach = match session.observers.get(&connection_id) {
            Some(existing) if !existing.is_terminated() => return,
            Some(_) => true,
            None => false,
        };

        let key = WatchKey::new(session_id, Role::Observer, &connection_id);
        if !self.liveness.watch(key, &observer) {
            // Attaching then immediately detaching leaves the session as it was.
            debug!(
                target: "rc.actor.registry",
                session_id = %session_id,
                connection_id = %connection_id,
                "Observer already terminated, not attached"
            );
            return;
        }

        // A reattach replaces the dead handle; the new watch id makes any
        // pending firing for the old one stale.
        session.observers.insert(connection_id.clone(), observer);
        let observer_count = session.observers.len();
        if !reattach {
            self.metrics.observer_attached();
            self.publish_gauges();
        }

        debug!(
            target: "rc.actor.registry",
            session_id = %session_id,
            connection_id = %connection_id,
            observer_count,
            reattach,
            "Observer attached"
        );
    }

    /// Shared by `detach_observer` and observer liveness firings.
    fn remove_observer(&mut self, session_id: &str, connection_id: &str) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return;
        };

        if session.observers.remove(connection_id).is_none() {
            return;
        }

        let now_empty = session.observers.is_empty();
        self.liveness
            .unwatch(&WatchKey::new(session_id, Role::Observer, connection_id));
        self.metrics.observers_detached(1);

        debug!(
            target: "rc.actor.registry",
            session_id = %session_id,
            connection_id = %connection_id,
            "Observer detached"
        );

        if now_empty {
            self.end_session(session_id, EndReason::ObserversLeft);
        } else {
            self.publish_gauges();
        }
    }

    fn attach_producer(&mut self, session_id: &str, producer: ConnectionHandle) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            debug!(
                target: "rc.actor.registry",
                session_id = %session_id,
                "attach_producer for unknown session ignored"
            );
            return;
        };

        let connection_id = producer.connection_id().to_string();
        let key = WatchKey::new(session_id, Role::Producer, &connection_id);

        if !self.liveness.watch(key, &producer) {
            warn!(
                target: "rc.actor.registry",
                session_id = %session_id,
                connection_id = %connection_id,
                "Producer already terminated at attach"
            );
            self.end_session(session_id, EndReason::ProducerDisconnected);
            return;
        }

        if let Some(replaced) = session.set_producer(producer) {
            // Same id means `watch` already replaced the old entry.
            if replaced.connection_id() != connection_id {
                self.liveness.unwatch(&WatchKey::new(
                    session_id,
                    Role::Producer,
                    replaced.connection_id(),
                ));
                info!(
                    target: "rc.actor.registry",
                    session_id = %session_id,
                    old_connection_id = %replaced.connection_id(),
                    connection_id = %connection_id,
                    "Producer replaced"
                );
            }
        }

        info!(
            target: "rc.actor.registry",
            session_id = %session_id,
            connection_id = %connection_id,
            "Producer attached, session active"
        );
    }

    fn enqueue_frame(&mut self, session_id: &str, frame: MediaFrame) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            trace!(
                target: "rc.relay",
                session_id = %session_id,
                "Frame for unknown session ignored"
            );
            return;
        };

        let sequence = match session.relay.admit(frame.kind) {
            RelayDecision::Forward { sequence } => sequence,
            RelayDecision::Drop => {
                self.metrics.record_frame_dropped();
                prom::record_frames_dropped("backlog", 1);
                trace!(
                    target: "rc.relay",
                    session_id = %session_id,
                    dropped_count = session.relay.dropped_count(),
                    "Delta frame dropped, backlog full"
                );
                return;
            }
        };

        let event = RelayEvent::Frame(RelayedFrame {
            session_id: session.session_id.clone(),
            sequence,
            kind: frame.kind,
            payload: frame.payload,
        });
        let report = fan_out(session.observers.values(), &event);

        self.metrics.record_frame_forwarded();
        prom::record_frame_forwarded(frame.kind.as_str());

        if report.dropped > 0 {
            self.metrics.record_deliveries_dropped(report.dropped as u64);
            prom::record_frames_dropped("observer_full", report.dropped as u64);
        }

        if report.closed > 0 {
            // Liveness watches clean these up.
            debug!(
                target: "rc.relay",
                session_id = %session_id,
                closed = report.closed,
                "Frame not delivered to closed observers"
            );
        }
    }

    /// Remove a session and tell remaining observers it ended.
    fn end_session(&mut self, session_id: &str, reason: EndReason) -> bool {
        let Some(mut session) = self.sessions.remove(session_id) else {
            return false;
        };

        self.liveness.unwatch_session(session_id);
        session.status = SessionStatus::Stopped;

        let ended = RelayEvent::SessionEnded {
            session_id: session.session_id.clone(),
            reason,
        };
        fan_out(session.observers.values(), &ended);

        self.metrics.session_removed();
        self.metrics.observers_detached(session.observers.len());
        prom::record_session_ended(reason.as_str());
        self.publish_gauges();

        info!(
            target: "rc.actor.registry",
            session_id = %session_id,
            device_id = %session.device_id,
            reason = reason.as_str(),
            frames_forwarded = session.relay.frames_forwarded(),
            dropped_count = session.relay.dropped_count(),
            total_sessions = self.sessions.len(),
            "Session ended"
        );

        true
    }

    fn connection_terminated(&mut self, key: WatchKey, watch_id: u64) {
        if !self.liveness.take_if_current(&key, watch_id) {
            trace!(
                target: "rc.actor.liveness",
                session_id = %key.session_id,
                connection_id = %key.connection_id,
                watch_id,
                "Stale liveness firing ignored"
            );
            return;
        }

        self.metrics.record_liveness_fired();
        prom::record_liveness_fired(key.role.as_str());

        info!(
            target: "rc.actor.liveness",
            session_id = %key.session_id,
            role = key.role.as_str(),
            connection_id = %key.connection_id,
            "Liveness watch fired"
        );

        match key.role {
            Role::Observer => self.remove_observer(&key.session_id, &key.connection_id),
            Role::Producer => {
                self.end_session(&key.session_id, EndReason::ProducerDisconnected);
            }
        }
    }

    fn list_sessions_for_device(&self, device_id: &str) -> Vec<SessionSnapshot> {
        let mut sessions: Vec<SessionSnapshot> = self
            .sessions
            .values()
            .filter(|s| s.device_id == device_id)
            .map(Session::snapshot)
            .collect();

        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions
    }

    fn get_status(&self) -> RegistryStatus {
        RegistryStatus {
            session_count: self.sessions.len(),
            observer_count: self.sessions.values().map(|s| s.observers.len()).sum(),
            producer_count: self
                .sessions
                .values()
                .filter(|s| s.producer.is_some())
                .count(),
            is_draining: !self.accepting_new,
            mailbox_depth: self.receiver.len(),
            mailbox_peak_depth: self.mailbox.peak_depth(),
            mailbox_level: self.mailbox.current_level(),
            messages_processed: self.metrics.messages_processed(),
        }
    }

    fn initiate_shutdown(&mut self, deadline: Duration) {
        info!(
            target: "rc.actor.registry",
            registry_id = %self.registry_id,
            session_count = self.sessions.len(),
            deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            "Initiating graceful shutdown"
        );

        self.accepting_new = false;
        self.end_all(EndReason::Shutdown);
        self.cancel_token.cancel();
    }

    /// Runs when the root token is cancelled, including via `cancel()`.
    fn graceful_shutdown(&mut self) {
        self.accepting_new = false;
        self.end_all(EndReason::Shutdown);

        info!(
            target: "rc.actor.registry",
            registry_id = %self.registry_id,
            watches_remaining = self.liveness.len(),
            "Graceful shutdown complete"
        );
    }

    fn end_all(&mut self, reason: EndReason) {
        let session_ids: Vec<String> = self.sessions.keys().cloned().collect();
        for session_id in session_ids {
            self.end_session(&session_id, reason);
        }
    }

    fn publish_gauges(&self) {
        prom::set_sessions_active(self.sessions.len());
        prom::set_observers_active(self.metrics.observer_count());
    }
}
