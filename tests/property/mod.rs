//! Property-based tests for the hedgeguard primitives.
//!
//! Run with: cargo test --test property_tests

pub mod breaker;

/// A current-thread runtime with a paused clock, so windows and staggers
/// elapse instantly and deterministically.
pub fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}
