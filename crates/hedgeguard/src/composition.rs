//! # Composition Guide
//!
//! How the primitives stack with each other and with Tower.
//!
//! ## Breaker inside the hedge
//!
//! ```text
//! ServiceBuilder
//!   ├─ HedgeLayer      one root scope per call, up to `upto` attempts
//!   ├─ BreakerLayer    every attempt asks the breaker
//!   └─ Service
//! ```
//!
//! Each attempt is a separate call to the breaker, so its failures are counted
//! per attempt and an Open breaker rejects hedges as quickly as the first try.
//! A rejected attempt is a failed attempt: the hedger starts the next one at
//! once, and when every attempt was rejected the call fails with
//! `AllAttemptsFailed` holding one `BreakerError::Open` per attempt.
//!
//! ## Breaker outside the hedge
//!
//! ```text
//! ServiceBuilder
//!   ├─ BreakerLayer    judges whole hedged calls
//!   ├─ HedgeLayer
//!   └─ Service
//! ```
//!
//! Here the breaker only sees the outcome of the race. Use it when hedges go
//! to interchangeable replicas and only a total failure says something about
//! the dependency.
//!
//! ## Sharing a pool
//!
//! A hedger created without a pool gets a private one. Passing the same
//! `WorkerPool` to several hedgers (`HedgerBuilder::pool`) caps the work they
//! can run together; a call whose next attempt cannot get a worker waits, and
//! that wait still ends when the caller's scope does.
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "breaker", feature = "hedge"))]
//! # {
//! use hedgeguard::breaker::{Breaker, BreakerLayer};
//! use hedgeguard::hedge::Hedger;
//! use hedgeguard::pool::WorkerPool;
//! use std::time::Duration;
//! use tower::ServiceBuilder;
//!
//! let shared = WorkerPool::new(32, Duration::from_secs(60));
//!
//! let service = ServiceBuilder::new()
//!     .layer(
//!         Hedger::builder()
//!             .name("search")
//!             .timeout(Duration::from_millis(15))
//!             .upto(2)
//!             .pool(shared.clone())
//!             .layer(),
//!     )
//!     .layer(BreakerLayer::new(Breaker::builder().name("search").build().unwrap()))
//!     .service(tower::service_fn(|q: String| async move {
//!         Ok::<_, std::io::Error>(q.len())
//!     }));
//! # let _ = service;
//! # }
//! ```
