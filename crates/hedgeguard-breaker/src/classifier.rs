//! Deciding which service results count against the breaker.

use std::fmt;
use std::sync::Arc;

/// Decides whether a result is recorded as a failure.
pub trait FailureClassifier<Res, Err>: Send + Sync {
    /// Returns `true` if `result` should be recorded as a failure.
    fn is_failure(&self, result: &Result<Res, Err>) -> bool;
}

/// Counts every `Err` as a failure and every `Ok` as a success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<Res, Err> FailureClassifier<Res, Err> for DefaultClassifier {
    fn is_failure(&self, result: &Result<Res, Err>) -> bool {
        result.is_err()
    }
}

/// A classifier backed by a closure.
///
/// ```rust
/// use hedgeguard_breaker::classifier::{FailureClassifier, FnClassifier};
///
/// // Client errors are the caller's fault, not the dependency's.
/// let classifier = FnClassifier::new(|result: &Result<u16, ()>| match result {
///     Ok(status) => *status >= 500,
///     Err(()) => true,
/// });
///
/// assert!(!classifier.is_failure(&Ok(404)));
/// assert!(classifier.is_failure(&Ok(503)));
/// ```
#[derive(Clone)]
pub struct FnClassifier<F> {
    f: Arc<F>,
}

impl<F> FnClassifier<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F, Res, Err> FailureClassifier<Res, Err> for FnClassifier<F>
where
    F: Fn(&Result<Res, Err>) -> bool + Send + Sync,
{
    fn is_failure(&self, result: &Result<Res, Err>) -> bool {
        (self.f)(result)
    }
}

impl<F> fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClassifier").finish_non_exhaustive()
    }
}
