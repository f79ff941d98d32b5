//! Concurrency and resilience primitives for async Rust.
//!
//! `hedgeguard` bundles three independent primitives on top of a small shared
//! core. Each lives in its own crate and is enabled here through a feature.
//!
//! # Primitives
//!
//! - **Breaker** (`breaker` feature): an adaptive circuit breaker that judges
//!   fixed time windows by their failure ratio and sheds load while Open or
//!   HalfOpen
//! - **Pool** (`pool` feature): a bounded pool of reusable worker tasks that
//!   retire after an idle lifetime
//! - **Hedge** (`hedge` feature): staggered duplicate attempts of the same
//!   work, first success wins, losers cancelled
//!
//! The [`core`] crate is always available. It holds the [`CancelScope`](core::CancelScope)
//! the hedger and its workers share, the [`MultiError`](core::MultiError)
//! aggregate, and the event listener plumbing every primitive reports through.
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! hedgeguard = { version = "0.1", features = ["breaker", "hedge"] }
//! ```
//!
//! Or everything, with observability:
//!
//! ```toml
//! [dependencies]
//! hedgeguard = { version = "0.1", features = ["full", "tracing", "metrics"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "breaker", feature = "hedge"))]
//! # {
//! use hedgeguard::breaker::Breaker;
//! use hedgeguard::core::CancelScope;
//! use hedgeguard::hedge::{worker_fn, Hedger};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let breaker = Breaker::builder().name("replica").build().unwrap();
//!
//! // Every hedged attempt asks the breaker first, so a failing backend is
//! // not hit `upto` times per call.
//! let hedger = Hedger::builder()
//!     .timeout(Duration::from_millis(20))
//!     .upto(3)
//!     .worker(worker_fn(move |_scope: CancelScope, key: String| {
//!         let breaker = breaker.clone();
//!         async move {
//!             breaker
//!                 .call(async move { Ok::<_, std::io::Error>(key.len()) })
//!                 .await
//!         }
//!     }))
//!     .build();
//!
//! let len = hedger.execute(&CancelScope::new(), "abc".to_string()).await;
//! # let _ = len;
//! # }
//! # }
//! ```
//!
//! See [`composition`] for layer ordering with Tower.

// Re-export core (always available)
pub use hedgeguard_core as core;

#[cfg(feature = "breaker")]
pub use hedgeguard_breaker as breaker;

#[cfg(feature = "pool")]
pub use hedgeguard_pool as pool;

#[cfg(feature = "hedge")]
pub use hedgeguard_hedge as hedge;

pub mod composition;
