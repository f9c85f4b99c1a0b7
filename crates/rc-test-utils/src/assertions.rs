//! Polling assertions for state that changes asynchronously.
//!
//! Liveness firings reach the registry through its mailbox, so tests poll
//! instead of sleeping for a fixed time.

use rc_relay::actors::{SessionRegistryHandle, SessionSnapshot};
use rc_relay::errors::RelayError;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const POLL_ATTEMPTS: usize = 200;

/// Wait until `session_id` is no longer registered.
pub async fn wait_for_session_removed(registry: &SessionRegistryHandle, session_id: &str) {
    for _ in 0..POLL_ATTEMPTS {
        match registry.get_session(session_id).await {
            Err(RelayError::SessionNotFound(_)) => return,
            Ok(_) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(e) => panic!("registry error while waiting for {session_id}: {e}"),
        }
    }
    panic!("session {session_id} was not removed");
}

/// Wait until the session's observer list equals `expected` (sorted ids).
pub async fn wait_for_observers(
    registry: &SessionRegistryHandle,
    session_id: &str,
    expected: &[&str],
) -> SessionSnapshot {
    let mut last = None;
    for _ in 0..POLL_ATTEMPTS {
        let snapshot = registry
            .get_session(session_id)
            .await
            .unwrap_or_else(|e| panic!("session {session_id} missing: {e}"));
        if snapshot.observers == expected {
            return snapshot;
        }
        last = Some(snapshot.observers);
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("session {session_id} observers {last:?}, expected {expected:?}");
}
