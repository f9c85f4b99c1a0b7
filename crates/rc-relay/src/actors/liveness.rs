//! Liveness monitor: turns connection termination into registry messages.
//!
//! Every attached handle gets a watch task keyed by
//! `(session_id, role, connection_id)`. The side table lives inside the
//! registry actor, so cleanup is a lookup-and-remove rather than a walk over
//! session/connection references.
//!
//! A watch task waits for either its own cancellation (unwatch, replace, or
//! registry shutdown) or the handle's termination. On termination it posts
//! `ConnectionTerminated` through a weak mailbox sender, so outstanding
//! watches never keep a stopped registry alive. The registry only acts on a
//! firing whose watch id still matches the table entry.

use super::connection::ConnectionHandle;
use super::messages::{RegistryMessage, Role};

use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Identifies one watched attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub session_id: String,
    pub role: Role,
    pub connection_id: String,
}

impl WatchKey {
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        role: Role,
        connection_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            role,
            connection_id: connection_id.into(),
        }
    }
}

#[derive(Debug)]
struct WatchEntry {
    watch_id: u64,
    cancel_token: CancellationToken,
}

/// Side table of active watches. Owned by the registry actor.
#[derive(Debug)]
pub(crate) struct LivenessMonitor {
    watches: HashMap<WatchKey, WatchEntry>,
    next_watch_id: u64,
    root_token: CancellationToken,
    mailbox: mpsc::WeakSender<RegistryMessage>,
}

impl LivenessMonitor {
    pub fn new(
        root_token: CancellationToken,
        mailbox: mpsc::WeakSender<RegistryMessage>,
    ) -> Self {
        Self {
            watches: HashMap::new(),
            next_watch_id: 0,
            root_token,
            mailbox,
        }
    }

    /// Start watching `handle` under `key`.
    ///
    /// Returns `false` without spawning anything if the handle is already
    /// terminated; the caller cleans up synchronously in that case.
    /// An existing watch under the same key is replaced.
    pub fn watch(&mut self, key: WatchKey, handle: &ConnectionHandle) -> bool {
        if handle.is_terminated() {
            debug!(
                target: "rc.actor.liveness",
                session_id = %key.session_id,
                role = key.role.as_str(),
                connection_id = %key.connection_id,
                "Handle already terminated at registration"
            );
            return false;
        }

        self.unwatch(&key);

        let watch_id = self.next_watch_id;
        self.next_watch_id += 1;
        let cancel_token = self.root_token.child_token();

        tokio::spawn(run_watch(
            key.clone(),
            watch_id,
            handle.clone(),
            cancel_token.clone(),
            self.mailbox.clone(),
        ));

        trace!(
            target: "rc.actor.liveness",
            session_id = %key.session_id,
            role = key.role.as_str(),
            connection_id = %key.connection_id,
            watch_id,
            "Watch registered"
        );

        self.watches.insert(
            key,
            WatchEntry {
                watch_id,
                cancel_token,
            },
        );
        true
    }

    /// Cancel the watch under `key`, if any.
    pub fn unwatch(&mut self, key: &WatchKey) {
        if let Some(entry) = self.watches.remove(key) {
            entry.cancel_token.cancel();
        }
    }

    /// Cancel every watch belonging to a session.
    pub fn unwatch_session(&mut self, session_id: &str) {
        self.watches.retain(|key, entry| {
            if key.session_id == session_id {
                entry.cancel_token.cancel();
                false
            } else {
                true
            }
        });
    }

    /// Consume a firing. Returns `true` only if `watch_id` is the live
    /// watch for `key`; the entry is removed so it cannot apply twice.
    pub fn take_if_current(&mut self, key: &WatchKey, watch_id: u64) -> bool {
        match self.watches.get(key) {
            Some(entry) if entry.watch_id == watch_id => {
                self.watches.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Number of active watches.
    pub fn len(&self) -> usize {
        self.watches.len()
    }
}

async fn run_watch(
    key: WatchKey,
    watch_id: u64,
    handle: ConnectionHandle,
    cancel_token: CancellationToken,
    mailbox: mpsc::WeakSender<RegistryMessage>,
) {
    tokio::select! {
        biased;

        () = cancel_token.cancelled() => {}
        () = handle.terminated() => {
            let Some(sender) = mailbox.upgrade() else {
                return;
            };
            debug!(
                target: "rc.actor.liveness",
                session_id = %key.session_id,
                role = key.role.as_str(),
                connection_id = %key.connection_id,
                watch_id,
                "Connection terminated"
            );
            // Registry gone means there is nothing left to clean up.
            let _ = sender
                .send(RegistryMessage::ConnectionTerminated { key, watch_id })
                .await;
        }
    }
}
