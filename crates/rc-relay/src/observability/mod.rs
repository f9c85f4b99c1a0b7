//! Observability for the RC relay.
//!
//! All actor loops use `#[instrument(skip_all)]` with explicit safe fields.
//! Frame payloads are never logged.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `rc_sessions_active` | Gauge | none | Registered sessions |
//! | `rc_observers_active` | Gauge | none | Attached observers |
//! | `rc_frames_forwarded_total` | Counter | `frame_type` | Frames accepted by the relay policy |
//! | `rc_frames_dropped_total` | Counter | `reason` | Backlog drops and full observer buffers |
//! | `rc_session_ended_total` | Counter | `reason` | Session terminations |
//! | `rc_liveness_fired_total` | Counter | `role` | Applied disconnect notifications |
//! | `rc_registry_mailbox_depth` | Gauge | none | Registry backpressure |
//! | `rc_operation_duration_seconds` | Histogram | `operation` | Registry handling time |
//! | `rc_actor_panics_total` | Counter | `actor_type` | Registry crashes |
//! | `rc_errors_total` | Counter | `operation`, `error_type`, `status_code` | Caller errors |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::{
    init_metrics_recorder, record_actor_panic, record_error, record_frame_forwarded,
    record_frames_dropped, record_liveness_fired, record_operation_duration, record_session_ended,
    set_observers_active, set_registry_mailbox_depth, set_sessions_active,
};
