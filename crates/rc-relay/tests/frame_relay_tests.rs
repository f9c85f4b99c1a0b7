//! Integration tests for frame relay and backpressure.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rc_relay::actors::FrameKind;
use rc_test_utils::{
    delta, keyframe, test_registry, test_registry_with_metrics, MockRcClient, TestSession,
};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_keyframe_reaches_every_observer() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let mut first = MockRcClient::new("window-1");
    let mut second = MockRcClient::new("window-2");
    let device = MockRcClient::new("device-stream");

    registry
        .create_session(&session.session_id, &session.device_id, first.handle())
        .await
        .unwrap();
    registry
        .attach_observer(&session.session_id, second.handle())
        .await
        .unwrap();
    registry
        .attach_producer(&session.session_id, device.handle())
        .await
        .unwrap();

    let frame = keyframe(7);
    let payload = frame.payload.clone();
    registry
        .enqueue_frame(&session.session_id, frame)
        .await
        .unwrap();

    for window in [&mut first, &mut second] {
        let received = window.next_frame().await;
        assert_eq!(received.kind, FrameKind::Keyframe);
        assert_eq!(received.payload, payload);
        assert_eq!(received.session_id, session.session_id);
    }

    registry.cancel();
}

#[tokio::test]
async fn test_delta_overflow_then_keyframe_recovery() {
    let registry = test_registry(100);
    let session = TestSession::random();
    let mut window = MockRcClient::with_buffer("window-1", 512);

    registry
        .create_session(&session.session_id, &session.device_id, window.handle())
        .await
        .unwrap();

    for i in 0..110 {
        registry
            .enqueue_frame(&session.session_id, delta(i))
            .await
            .unwrap();
    }

    let snapshot = registry.get_session(&session.session_id).await.unwrap();
    assert_eq!(snapshot.backlog_count, 100);
    assert_eq!(snapshot.dropped_count, 10);

    registry
        .enqueue_frame(&session.session_id, keyframe(0))
        .await
        .unwrap();

    let snapshot = registry.get_session(&session.session_id).await.unwrap();
    assert_eq!(snapshot.backlog_count, 0);
    assert_eq!(snapshot.dropped_count, 10);

    let frames = window.drain_frames();
    assert_eq!(frames.len(), 101);
    // The first 100 deltas are kept, in order, followed by the keyframe.
    for (expected, frame) in frames.iter().enumerate() {
        assert_eq!(frame.sequence, expected as u64);
    }
    let last = frames.last().unwrap();
    assert_eq!(last.kind, FrameKind::Keyframe);
    assert_eq!(&last.payload[..], b"key-0");

    registry.cancel();
}

#[tokio::test]
async fn test_dropped_count_never_decreases() {
    let registry = test_registry(3);
    let session = TestSession::random();
    let window = MockRcClient::new("window-1");

    registry
        .create_session(&session.session_id, &session.device_id, window.handle())
        .await
        .unwrap();

    let mut last_dropped = 0;
    for round in 0..4 {
        for i in 0..5 {
            registry
                .enqueue_frame(&session.session_id, delta(round * 10 + i))
                .await
                .unwrap();
        }
        registry
            .enqueue_frame(&session.session_id, keyframe(round))
            .await
            .unwrap();

        let snapshot = registry.get_session(&session.session_id).await.unwrap();
        assert!(snapshot.dropped_count >= last_dropped);
        last_dropped = snapshot.dropped_count;
    }
    assert_eq!(last_dropped, 8);

    registry.cancel();
}

#[tokio::test]
async fn test_stalled_observer_does_not_block_others() {
    let (registry, metrics) = test_registry_with_metrics(100);
    let session = TestSession::random();
    let mut healthy = MockRcClient::with_buffer("window-healthy", 64);
    // Never drained.
    let stalled = MockRcClient::with_buffer("window-stalled", 2);

    registry
        .create_session(&session.session_id, &session.device_id, healthy.handle())
        .await
        .unwrap();
    registry
        .attach_observer(&session.session_id, stalled.handle())
        .await
        .unwrap();

    let send_all = async {
        for i in 0..20 {
            registry
                .enqueue_frame(&session.session_id, delta(i))
                .await
                .unwrap();
        }
    };
    tokio::time::timeout(Duration::from_secs(2), send_all)
        .await
        .expect("producer must never block on a stalled observer");

    // Round-trip through the registry so every frame has been handled.
    let snapshot = registry.get_session(&session.session_id).await.unwrap();
    assert_eq!(snapshot.frames_forwarded, 20);
    // Observer-side buffer drops are not congestion drops.
    assert_eq!(snapshot.dropped_count, 0);

    assert_eq!(healthy.drain_frames().len(), 20);
    assert_eq!(metrics.deliveries_dropped.load(Ordering::Relaxed), 18);

    registry.cancel();
}

#[tokio::test]
async fn test_frames_for_unknown_session_are_ignored() {
    let registry = test_registry(100);

    registry
        .enqueue_frame("rc-missing", keyframe(1))
        .await
        .unwrap();

    let status = registry.get_status().await.unwrap();
    assert_eq!(status.session_count, 0);

    registry.cancel();
}
