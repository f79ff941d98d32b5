//! Cancellation scopes.
//!
//! A [`CancelScope`] is the cancellation signal every hedged attempt runs
//! under. It answers two questions: "has this ended?" ([`CancelScope::err`],
//! [`CancelScope::is_cancelled`]) and "tell me when it ends"
//! ([`CancelScope::done`]).
//!
//! Scopes form a tree. Cancelling a scope cancels every scope derived from it
//! with [`CancelScope::child`], while cancelling a child leaves its parent
//! alone. A deadline set on a scope is inherited by all of its children.
//!
//! ```rust
//! use hedgeguard_core::{CancelScope, ScopeError};
//!
//! let caller = CancelScope::new();
//! let attempt = caller.child();
//!
//! attempt.cancel();
//! assert!(caller.err().is_none());
//!
//! caller.cancel();
//! assert_eq!(caller.err(), Some(ScopeError::Cancelled));
//! ```

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// Roughly 30 years, the same horizon tokio's timers treat as "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after`, clamped to a far-future instant instead of overflowing.
///
/// Lets callers pass `Duration::MAX` to mean "no deadline in practice".
pub fn deadline_after(now: Instant, after: Duration) -> Instant {
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Why a scope ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ScopeError {
    /// The scope, or one of its ancestors, was cancelled explicitly.
    #[error("scope cancelled")]
    Cancelled,
    /// The scope's deadline passed.
    #[error("scope deadline exceeded")]
    DeadlineExceeded,
}

impl ScopeError {
    /// Returns true for [`ScopeError::DeadlineExceeded`].
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ScopeError::DeadlineExceeded)
    }
}

/// A cancellation scope with an optional deadline.
///
/// Cloning is cheap and clones observe the same cancellation.
#[derive(Debug, Clone)]
pub struct CancelScope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelScope {
    /// A root scope that only ends when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A root scope that ends at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A root scope that ends `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(deadline_after(Instant::now(), timeout))
    }

    /// Wraps an existing token, e.g. one owned by a server's shutdown logic.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a child scope.
    ///
    /// The child ends when this scope ends, or earlier if cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a child scope whose deadline is the earlier of this scope's
    /// deadline and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = deadline_after(Instant::now(), timeout);
        let deadline = match self.deadline {
            Some(current) if current <= candidate => current,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancels this scope and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if one was set on this scope or an ancestor.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns true once the scope has ended for any reason.
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// `None` while the scope is live, otherwise the reason it ended.
    ///
    /// An expired deadline takes precedence over explicit cancellation.
    pub fn err(&self) -> Option<ScopeError> {
        if self.deadline_passed() {
            Some(ScopeError::DeadlineExceeded)
        } else if self.token.is_cancelled() {
            Some(ScopeError::Cancelled)
        } else {
            None
        }
    }

    /// Resolves when the scope ends, yielding the same value [`err`](Self::err) would.
    pub async fn done(&self) -> ScopeError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => self.err().unwrap_or(ScopeError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => ScopeError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ScopeError::Cancelled
            }
        }
    }

    /// Runs `fut` until it completes or the scope ends, whichever comes first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ScopeError>
    where
        F: std::future::Future,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}
