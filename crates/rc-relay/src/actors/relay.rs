//! Frame relay and backpressure policy.
//!
//! Each session carries a [`FrameRelay`] that decides, frame by frame,
//! whether to forward or drop:
//!
//! - Keyframes are always forwarded and reset `backlog_count` to 0.
//! - Deltas are forwarded while `backlog_count < capacity` (incrementing it)
//!   and dropped otherwise (incrementing `dropped_count`).
//!
//! Accepted frames receive consecutive sequence numbers, so a receiver sees
//! a gap-free sequence and drops never reorder the frames that are kept.
//! Forwarding itself is [`fan_out`]: one non-blocking delivery per observer.

use super::connection::{ConnectionHandle, DeliveryOutcome};
use super::messages::{FrameKind, RelayEvent};

/// Outcome of running the policy on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDecision {
    /// Forward the frame with this sequence number.
    Forward { sequence: u64 },
    /// Drop the frame (congestion).
    Drop,
}

/// Per-session congestion state.
#[derive(Debug, Clone)]
pub struct FrameRelay {
    capacity: usize,
    backlog_count: usize,
    dropped_count: u64,
    frames_forwarded: u64,
    next_sequence: u64,
}

impl FrameRelay {
    /// Create a relay that tolerates `capacity` deltas between keyframes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            backlog_count: 0,
            dropped_count: 0,
            frames_forwarded: 0,
            next_sequence: 0,
        }
    }

    /// Classify one frame and update the counters.
    pub fn admit(&mut self, kind: FrameKind) -> RelayDecision {
        match kind {
            FrameKind::Keyframe => {
                self.backlog_count = 0;
                self.forward()
            }
            FrameKind::Delta if self.backlog_count < self.capacity => {
                self.backlog_count += 1;
                self.forward()
            }
            FrameKind::Delta => {
                self.dropped_count += 1;
                RelayDecision::Drop
            }
        }
    }

    fn forward(&mut self) -> RelayDecision {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.frames_forwarded += 1;
        RelayDecision::Forward { sequence }
    }

    /// Delta frames forwarded since the last keyframe.
    #[must_use]
    pub fn backlog_count(&self) -> usize {
        self.backlog_count
    }

    /// Total delta frames dropped for congestion.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Total frames forwarded.
    #[must_use]
    pub fn frames_forwarded(&self) -> u64 {
        self.frames_forwarded
    }

    /// Configured backlog capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Delivery tally for one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Observers whose buffer accepted the event.
    pub delivered: usize,
    /// Observers whose buffer was full.
    pub dropped: usize,
    /// Observers whose connection was already gone.
    pub closed: usize,
}

/// Deliver `event` to every observer without waiting on any of them.
pub fn fan_out<'a>(
    observers: impl IntoIterator<Item = &'a ConnectionHandle>,
    event: &RelayEvent,
) -> FanOutReport {
    let mut report = FanOutReport::default();

    for observer in observers {
        match observer.deliver(event.clone()) {
            DeliveryOutcome::Delivered => report.delivered += 1,
            DeliveryOutcome::Dropped => report.dropped += 1,
            DeliveryOutcome::Closed => report.closed += 1,
        }
    }

    report
}
