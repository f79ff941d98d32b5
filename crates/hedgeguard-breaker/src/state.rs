use hedgeguard_core::deadline_after;
use std::fmt;
use tokio::time::Instant;

/// The three states of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BreakerState {
    /// Calls are rejected until the window ends.
    Open,
    /// A fraction of calls is let through to probe for recovery.
    HalfOpen,
    /// Normal operation, every call is allowed.
    Closed,
}

impl BreakerState {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
            BreakerState::Closed => "closed",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The state together with the end of its current window.
///
/// Swapped as a whole so readers never see a state paired with another
/// state's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) state: BreakerState,
    pub(crate) until: Instant,
}

impl Snapshot {
    pub(crate) fn new(state: BreakerState, now: Instant, resolution: std::time::Duration) -> Self {
        Self {
            state,
            until: deadline_after(now, resolution),
        }
    }

    pub(crate) fn covers(&self, now: Instant) -> bool {
        now <= self.until
    }
}
