//! # RC Test Utilities
//!
//! Shared test utilities for the RC relay.
//!
//! ## Modules
//!
//! - `mock_client` - In-process RC window / device connection with an
//!   inspectable event stream
//! - `fixtures` - Session ids, frames and pre-configured registries
//! - `assertions` - Polling helpers for asynchronous cleanup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let registry = test_registry(100);
//!     let session = TestSession::random();
//!     let mut window = MockRcClient::new("window-1");
//!
//!     registry
//!         .create_session(&session.session_id, &session.device_id, window.handle())
//!         .await
//!         .unwrap();
//!     registry.enqueue_frame(&session.session_id, keyframe(0)).await.unwrap();
//!
//!     let frame = window.next_frame().await;
//!     assert!(frame.kind == FrameKind::Keyframe);
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_client;

pub use assertions::*;
pub use fixtures::*;
pub use mock_client::*;
