//! Integration tests for session lifecycle operations.
//!
//! Exercises the public `SessionRegistryHandle` API the way REST and
//! transport collaborators call it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rc_relay::actors::{EndReason, SessionStatus};
use rc_relay::errors::RelayError;
use rc_test_utils::{test_registry, MockRcClient, TestSession};
use std::time::Duration;

#[tokio::test]
async fn test_duplicate_create_leaves_original_untouched() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let window = MockRcClient::new("window-1");
    let intruder = MockRcClient::new("window-2");

    let original = registry
        .create_session(&session.session_id, &session.device_id, window.handle())
        .await
        .unwrap();

    let result = registry
        .create_session(&session.session_id, "another-device", intruder.handle())
        .await;
    assert!(matches!(result, Err(RelayError::SessionExists)));
    assert_eq!(result.unwrap_err().status_code(), 409);

    let current = registry.get_session(&session.session_id).await.unwrap();
    assert_eq!(current, original);

    registry.cancel();
}

#[tokio::test]
async fn test_attach_and_detach_observer_visibility() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let first = MockRcClient::new("window-1");
    let second = MockRcClient::new("window-2");

    registry
        .create_session(&session.session_id, &session.device_id, first.handle())
        .await
        .unwrap();

    registry
        .attach_observer(&session.session_id, second.handle())
        .await
        .unwrap();
    let snapshot = registry.get_session(&session.session_id).await.unwrap();
    assert!(snapshot.has_observer("window-2"));

    registry
        .detach_observer(&session.session_id, &second.handle())
        .await
        .unwrap();
    let snapshot = registry.get_session(&session.session_id).await.unwrap();
    assert!(!snapshot.has_observer("window-2"));
    assert!(snapshot.has_observer("window-1"));

    registry.cancel();
}

#[tokio::test]
async fn test_attach_producer_activates_session() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let window = MockRcClient::new("window-1");
    let device = MockRcClient::new("device-stream");

    let created = registry
        .create_session(&session.session_id, &session.device_id, window.handle())
        .await
        .unwrap();
    assert_eq!(created.status, SessionStatus::Pending);
    assert!(created.started_at.is_none());

    registry
        .attach_producer(&session.session_id, device.handle())
        .await
        .unwrap();

    let active = registry.get_session(&session.session_id).await.unwrap();
    assert_eq!(active.status, SessionStatus::Active);
    assert_eq!(active.producer.as_deref(), Some("device-stream"));
    assert!(active.started_at.is_some());

    registry.cancel();
}

#[tokio::test]
async fn test_stop_session_removes_and_notifies() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let mut first = MockRcClient::new("window-1");
    let mut second = MockRcClient::new("window-2");

    registry
        .create_session(&session.session_id, &session.device_id, first.handle())
        .await
        .unwrap();
    registry
        .attach_observer(&session.session_id, second.handle())
        .await
        .unwrap();

    registry.stop_session(&session.session_id).await.unwrap();

    let result = registry.get_session(&session.session_id).await;
    assert!(matches!(result, Err(RelayError::SessionNotFound(_))));

    first.expect_ended(EndReason::Stopped).await;
    second.expect_ended(EndReason::Stopped).await;

    // Stopping again is a no-op.
    registry.stop_session(&session.session_id).await.unwrap();

    registry.cancel();
}

#[tokio::test]
async fn test_detaching_sole_observer_stops_session() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let window = MockRcClient::new("window-1");

    registry
        .create_session(&session.session_id, &session.device_id, window.handle())
        .await
        .unwrap();
    registry
        .detach_observer(&session.session_id, &window.handle())
        .await
        .unwrap();

    let result = registry.get_session(&session.session_id).await;
    assert!(matches!(result, Err(RelayError::SessionNotFound(_))));

    registry.cancel();
}

#[tokio::test]
async fn test_list_sessions_scoped_to_device() {
    let registry = test_registry(100);
    let windows: Vec<MockRcClient> = (0..5)
        .map(|i| MockRcClient::new(format!("window-{i}")))
        .collect();

    // Interleave devices so creation order does not match grouping.
    let plan = [
        ("rc-a1", "device-a"),
        ("rc-b1", "device-b"),
        ("rc-a2", "device-a"),
        ("rc-c1", "device-c"),
        ("rc-a3", "device-a"),
    ];
    for ((session_id, device_id), window) in plan.iter().zip(&windows) {
        registry
            .create_session(*session_id, *device_id, window.handle())
            .await
            .unwrap();
    }

    let sessions = registry.list_sessions_for_device("device-a").await.unwrap();
    let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["rc-a1", "rc-a2", "rc-a3"]);
    assert!(sessions.iter().all(|s| s.device_id == "device-a"));

    let none = registry
        .list_sessions_for_device("device-unknown")
        .await
        .unwrap();
    assert!(none.is_empty());

    registry.cancel();
}

#[tokio::test]
async fn test_shutdown_drains_registry() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let mut window = MockRcClient::new("window-1");

    registry
        .create_session(&session.session_id, &session.device_id, window.handle())
        .await
        .unwrap();

    registry.shutdown(Duration::from_secs(1)).await.unwrap();
    window.expect_ended(EndReason::Shutdown).await;

    let late = MockRcClient::new("window-late");
    let result = registry
        .create_session("rc-late", &session.device_id, late.handle())
        .await;
    assert!(matches!(result, Err(RelayError::Draining)));
    assert_eq!(result.unwrap_err().status_code(), 503);
}

#[tokio::test]
async fn test_snapshot_renders_rest_fields() {
    let registry = test_registry(100);
    let window = MockRcClient::new("window-1");

    registry
        .create_session("rc-json", "device-json", window.handle())
        .await
        .unwrap();

    let snapshot = registry.get_session("rc-json").await.unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["session_id"], "rc-json");
    assert_eq!(json["device_id"], "device-json");
    assert_eq!(json["status"], "pending");
    assert!(json.get("started_at").is_some());

    registry.cancel();
}
