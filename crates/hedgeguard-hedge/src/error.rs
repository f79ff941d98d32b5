//! Error types for hedged execution.

use hedgeguard_core::{MultiError, ScopeError};
use std::fmt;

/// Error returned by a hedged call.
#[derive(Debug, Clone, PartialEq)]
pub enum HedgeError<E> {
    /// The caller's scope ended before any attempt succeeded.
    ///
    /// Takes precedence over attempt errors collected so far.
    Cancelled(ScopeError),

    /// Every attempt failed. Holds one error per attempt, in arrival order.
    AllAttemptsFailed(MultiError<E>),
}

impl<E: fmt::Display> fmt::Display for HedgeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HedgeError::Cancelled(e) => write!(f, "{}", e),
            HedgeError::AllAttemptsFailed(errors) => write!(f, "{}", errors),
        }
    }
}

impl<E> std::error::Error for HedgeError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HedgeError::Cancelled(e) => Some(e),
            HedgeError::AllAttemptsFailed(errors) => Some(errors),
        }
    }
}

impl<E> HedgeError<E> {
    /// Returns `true` if the caller's scope ended the call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HedgeError::Cancelled(_))
    }

    /// Returns `true` if every attempt failed.
    pub fn is_all_attempts_failed(&self) -> bool {
        matches!(self, HedgeError::AllAttemptsFailed(_))
    }

    /// Why the scope ended, for a cancelled call.
    pub fn scope_error(&self) -> Option<ScopeError> {
        match self {
            HedgeError::Cancelled(e) => Some(*e),
            HedgeError::AllAttemptsFailed(_) => None,
        }
    }

    /// The attempt errors, for a call whose attempts all failed.
    pub fn attempt_errors(&self) -> Option<&[E]> {
        match self {
            HedgeError::AllAttemptsFailed(errors) => Some(errors.errors()),
            HedgeError::Cancelled(_) => None,
        }
    }
}
