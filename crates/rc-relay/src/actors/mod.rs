//! Actor model implementation for the RC relay.
//!
//! ```text
//! SessionRegistry (singleton, owns the session table)
//! ├── Session (one per RC session, plain data)
//! │   ├── FrameRelay (keyframe-aware backlog policy)
//! │   ├── observers: N ConnectionHandles
//! │   └── producer: 0..1 ConnectionHandle
//! └── LivenessMonitor (one watch task per attached handle)
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single writer**: only the registry task mutates sessions; callers talk
//!   to it through `SessionRegistryHandle`
//! - **Non-blocking fan-out**: observer delivery is `try_send` into bounded
//!   per-connection buffers
//! - **No ownership cycles**: sessions hold handle clones, watches hold a weak
//!   mailbox sender, cleanup is a side-table lookup
//! - **CancellationToken propagation**: watch tokens are children of the
//!   registry root token
//!
//! # Modules
//!
//! - [`registry`] - `SessionRegistry` actor and its handle
//! - [`session`] - Session record and snapshots
//! - [`relay`] - Frame relay policy and fan-out
//! - [`liveness`] - Connection termination watches
//! - [`connection`] - `ConnectionHandle` used by transports
//! - [`messages`] - Message and event types
//! - [`metrics`] - Mailbox monitoring and relay metrics

pub mod connection;
pub mod liveness;
pub mod messages;
pub mod metrics;
pub mod registry;
pub mod relay;
pub mod session;

pub use connection::{ConnectionHandle, DeliveryOutcome};
pub use liveness::WatchKey;
pub use messages::*;
pub use metrics::{ActorType, MailboxLevel, MailboxMonitor, RelayMetrics};
pub use registry::{RegistryConfig, SessionRegistryHandle};
pub use relay::{fan_out, FanOutReport, FrameRelay, RelayDecision};
pub use session::{SessionSnapshot, SessionStatus};
