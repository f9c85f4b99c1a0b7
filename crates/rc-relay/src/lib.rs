//! RC Relay Library
//!
//! Session relay core for remote-control ("RC") sessions: an administrative
//! RC window takes over a field device, and the device's live screen stream
//! is relayed back to every attached window.
//!
//! - Session lifecycle tracking for many concurrent sessions
//! - One-producer, many-observer frame fan-out that never blocks the producer
//! - Keyframe-aware congestion control (deltas dropped, keyframes never)
//! - Disconnect cleanup through liveness watches
//!
//! # Architecture
//!
//! ```text
//! transport / REST collaborators
//!          │  SessionRegistryHandle (mpsc + oneshot)
//!          ▼
//! SessionRegistry actor ──► ConnectionHandle::deliver (try_send) ──► observers
//!          ▲
//!          └── LivenessMonitor watch tasks (ConnectionTerminated)
//! ```
//!
//! Session state is in-memory only. A restart loses every session.
//!
//! # Modules
//!
//! - [`actors`] - Registry actor, relay policy, liveness monitor
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with status code mapping
//! - [`observability`] - Health endpoints and Prometheus metrics

pub mod actors;
pub mod config;
pub mod errors;
pub mod observability;
