//! Events emitted by the hedger.

use hedgeguard_core::{GuardEvent, ScopeError};
use std::time::Duration;
use tokio::time::Instant;

/// Events emitted during a hedged call.
#[derive(Debug, Clone)]
pub enum HedgeEvent {
    /// An attempt was submitted to the pool.
    AttemptStarted {
        /// Name of the hedger.
        name: String,
        /// Which attempt (0 is the first).
        attempt: usize,
        /// Time since the call started.
        delay: Duration,
        /// When this event occurred.
        timestamp: Instant,
    },

    /// An attempt returned an error.
    AttemptFailed {
        /// Name of the hedger.
        name: String,
        /// Which attempt failed.
        attempt: usize,
        /// When this event occurred.
        timestamp: Instant,
    },

    /// An attempt succeeded; the others are being cancelled.
    Succeeded {
        /// Name of the hedger.
        name: String,
        /// Which attempt won.
        attempt: usize,
        /// Time from the start of the call to the win.
        duration: Duration,
        /// How many attempts had been launched.
        attempts: usize,
        /// When this event occurred.
        timestamp: Instant,
    },

    /// Every attempt failed.
    AllFailed {
        /// Name of the hedger.
        name: String,
        /// How many attempts failed.
        attempts: usize,
        /// When this event occurred.
        timestamp: Instant,
    },

    /// The caller's scope ended the call.
    Cancelled {
        /// Name of the hedger.
        name: String,
        /// How many attempts had been launched.
        attempts: usize,
        /// Why the scope ended.
        reason: ScopeError,
        /// When this event occurred.
        timestamp: Instant,
    },
}

impl GuardEvent for HedgeEvent {
    fn kind(&self) -> &'static str {
        match self {
            HedgeEvent::AttemptStarted { .. } => "attempt_started",
            HedgeEvent::AttemptFailed { .. } => "attempt_failed",
            HedgeEvent::Succeeded { .. } => "succeeded",
            HedgeEvent::AllFailed { .. } => "all_failed",
            HedgeEvent::Cancelled { .. } => "cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            HedgeEvent::AttemptStarted { timestamp, .. } => *timestamp,
            HedgeEvent::AttemptFailed { timestamp, .. } => *timestamp,
            HedgeEvent::Succeeded { timestamp, .. } => *timestamp,
            HedgeEvent::AllFailed { timestamp, .. } => *timestamp,
            HedgeEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            HedgeEvent::AttemptStarted { name, .. } => name,
            HedgeEvent::AttemptFailed { name, .. } => name,
            HedgeEvent::Succeeded { name, .. } => name,
            HedgeEvent::AllFailed { name, .. } => name,
            HedgeEvent::Cancelled { name, .. } => name,
        }
    }
}
