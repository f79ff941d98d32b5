use crate::BreakerState;
use hedgeguard_core::GuardEvent;
use tokio::time::Instant;

/// Events emitted by a [`Breaker`](crate::Breaker).
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// The breaker moved to a new state.
    StateTransition {
        name: String,
        timestamp: Instant,
        from: BreakerState,
        to: BreakerState,
    },
    /// `allow` let a call through.
    CallPermitted {
        name: String,
        timestamp: Instant,
        state: BreakerState,
    },
    /// `allow` refused a call.
    CallRejected {
        name: String,
        timestamp: Instant,
        state: BreakerState,
    },
    /// `done` recorded the outcome of a permitted call.
    OutcomeRecorded {
        name: String,
        timestamp: Instant,
        success: bool,
    },
}

impl GuardEvent for BreakerEvent {
    fn kind(&self) -> &'static str {
        match self {
            BreakerEvent::StateTransition { .. } => "state_transition",
            BreakerEvent::CallPermitted { .. } => "call_permitted",
            BreakerEvent::CallRejected { .. } => "call_rejected",
            BreakerEvent::OutcomeRecorded { .. } => "outcome_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BreakerEvent::StateTransition { timestamp, .. }
            | BreakerEvent::CallPermitted { timestamp, .. }
            | BreakerEvent::CallRejected { timestamp, .. }
            | BreakerEvent::OutcomeRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            BreakerEvent::StateTransition { name, .. }
            | BreakerEvent::CallPermitted { name, .. }
            | BreakerEvent::CallRejected { name, .. }
            | BreakerEvent::OutcomeRecorded { name, .. } => name,
        }
    }
}
