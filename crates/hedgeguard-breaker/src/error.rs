use thiserror::Error;

/// Errors returned when running work through a breaker.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker refused the call; the operation was not run.
    #[error("circuit breaker is open")]
    Open,

    /// The operation ran and failed.
    #[error("inner error: {0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// Returns true if the breaker refused the call.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open)
    }

    /// Returns the operation's error, if the operation ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Inner(e) => Some(e),
            BreakerError::Open => None,
        }
    }
}

impl<E> From<E> for BreakerError<E> {
    fn from(err: E) -> Self {
        BreakerError::Inner(err)
    }
}

/// A configuration value the breaker cannot work with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BreakerConfigError {
    /// A ratio outside `[0, 1]` (NaN included).
    #[error("{field} must be between 0 and 1, got: {value}")]
    RatioOutOfRange {
        /// The offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}
