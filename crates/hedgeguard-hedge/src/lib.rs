//! Hedged execution for tail latency.
//!
//! A hedged call starts one attempt and, whenever `timeout` passes without an
//! answer, starts another copy of the same work, up to `upto` attempts in
//! total. The first attempt to succeed wins and the rest are cancelled. Extra
//! work is traded for a shorter tail: one slow replica no longer decides the
//! latency of the call.
//!
//! - The stagger is pacing, not a deadline. A slow attempt keeps running and
//!   can still win after later attempts have started.
//! - A failed attempt starts the next one at once.
//! - The call fails with [`HedgeError::AllAttemptsFailed`] only when every
//!   attempt failed, and with [`HedgeError::Cancelled`] as soon as the
//!   caller's [`CancelScope`](hedgeguard_core::CancelScope) ends.
//!
//! Attempts run on a bounded [`WorkerPool`](hedgeguard_pool::WorkerPool), so
//! hedging cannot start more concurrent work than the pool allows.
//!
//! ## Usage
//!
//! ```rust
//! use hedgeguard_core::CancelScope;
//! use hedgeguard_hedge::{worker_fn, Hedger};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hedger = Hedger::builder()
//!     .name("replicas")
//!     .timeout(Duration::from_millis(25))
//!     .upto(3)
//!     .worker(worker_fn(|scope: CancelScope, key: String| async move {
//!         // Stop early when another attempt has already won.
//!         scope
//!             .run(async move { Ok::<_, std::io::Error>(key.to_uppercase()) })
//!             .await
//!             .unwrap_or_else(|cancelled| Err(std::io::Error::other(cancelled)))
//!     }))
//!     .build();
//!
//! let scope = CancelScope::with_timeout(Duration::from_secs(1));
//! let value = hedger.execute(&scope, "k1".to_string()).await?;
//! assert_eq!(value, "K1");
//! # Ok(())
//! # }
//! ```
//!
//! ## As Tower middleware
//!
//! ```rust
//! use hedgeguard_hedge::Hedger;
//! use std::time::Duration;
//! use tower::{Service, ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut service = ServiceBuilder::new()
//!     .layer(Hedger::builder().timeout(Duration::from_millis(10)).layer())
//!     .service(tower::service_fn(|id: u64| async move {
//!         Ok::<_, std::io::Error>(id + 1)
//!     }));
//!
//! let response = service.ready().await?.call(41).await?;
//! assert_eq!(response, 42);
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//! - `metrics`: enables metrics collection using the `metrics` crate
//! - `tracing`: enables logging and tracing using the `tracing` crate

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

mod config;
mod error;
mod events;
mod hedger;
mod layer;
mod worker;

pub use config::{HedgeConfig, HedgerBuilder, DEFAULT_POOL_LIFETIME, DEFAULT_POOL_WORKERS};
pub use error::HedgeError;
pub use events::HedgeEvent;
pub use hedger::Hedger;
pub use layer::{Hedge, HedgeLayer};
pub use worker::{worker_fn, HedgedWorker, ServiceWorker, WorkerFn};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

pub(crate) fn init_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            describe_counter!("hedge_attempts_total", "Attempts started by hedged calls");
            describe_counter!(
                "hedge_calls_total",
                "Hedged calls by outcome (success, failure, cancelled)"
            );
            describe_counter!(
                "hedge_wins_total",
                "Successful hedged calls by winning attempt"
            );
            describe_histogram!(
                "hedge_call_duration_seconds",
                "Time from the start of a hedged call to its winning result"
            );
        });
    }
}
