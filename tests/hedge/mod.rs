//! Tests for hedgeguard-hedge, organized into:
//!
//! - **integration**: winners, aggregated failures and cancellation
//! - **pacing**: the stagger between attempts
//! - **pool**: hedging on a shared, bounded pool
//! - **service**: the hedger as tower middleware


use hedgeguard_core::CancelScope;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Test error type for use in workers and services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError {
    pub message: String,
}

impl TestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TestError {}

/// Routes the crates' tracing output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_target(false)
        .try_init();
}

/// Collects the scope handed to every attempt, in launch order.
#[derive(Clone, Default)]
pub struct Scopes(Arc<Mutex<Vec<CancelScope>>>);

impl Scopes {
    /// Records `scope` and returns the attempt's index.
    pub fn record(&self, scope: CancelScope) -> usize {
        let mut scopes = self.0.lock().unwrap();
        scopes.push(scope);
        scopes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn cancelled(&self) -> Vec<bool> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(CancelScope::is_cancelled)
            .collect()
    }
}
