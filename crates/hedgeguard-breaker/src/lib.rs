//! An adaptive circuit breaker.
//!
//! The breaker counts successes and failures over fixed time windows and
//! re-evaluates its state whenever a window ends:
//!
//! - **Closed**: every call is allowed
//! - **Open**: every call is rejected until the window ends
//! - **HalfOpen**: a configurable fraction of calls is allowed to probe for
//!   recovery
//!
//! The state is kept in an atomically swapped snapshot and the counters are
//! atomics, so checking the breaker never blocks.
//!
//! ## Usage
//!
//! ### Allow / done
//!
//! ```rust
//! use hedgeguard_breaker::Breaker;
//! use std::time::Duration;
//!
//! let breaker = Breaker::builder()
//!     .name("billing")
//!     .resolution(Duration::from_secs(5))
//!     .fail_ratio(0.3)
//!     .build()
//!     .expect("valid config");
//!
//! if breaker.allow() {
//!     let succeeded = true; // perform the call
//!     breaker.done(succeeded);
//! } else {
//!     // fail fast
//! }
//! ```
//!
//! ### Wrapping work
//!
//! ```rust
//! use hedgeguard_breaker::{Breaker, BreakerError};
//!
//! # async fn example() {
//! let breaker = Breaker::builder().build().unwrap();
//!
//! match breaker.call(async { Ok::<_, std::io::Error>("pong") }).await {
//!     Ok(reply) => println!("got {reply}"),
//!     Err(BreakerError::Open) => println!("breaker is open"),
//!     Err(BreakerError::Inner(e)) => println!("call failed: {e}"),
//! }
//! # }
//! ```
//!
//! ### As Tower middleware
//!
//! ```rust
//! use hedgeguard_breaker::{Breaker, BreakerLayer};
//! use tower::{ServiceBuilder, service_fn};
//!
//! let layer = BreakerLayer::new(Breaker::builder().name("users").build().unwrap())
//!     .failure_classifier(|result: &Result<u16, std::io::Error>| match result {
//!         Ok(status) => *status >= 500,
//!         Err(_) => true,
//!     });
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(service_fn(|_: ()| async { Ok::<u16, std::io::Error>(200) }));
//! ```
//!
//! ## Feature Flags
//! - `metrics`: enables metrics collection using the `metrics` crate
//! - `tracing`: enables logging and tracing using the `tracing` crate
//! - `serde`: enables serde for `BreakerConfig` and `BreakerState`

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

pub use breaker::{Breaker, BreakerPermit};
pub use classifier::{DefaultClassifier, FnClassifier};
pub use config::{BreakerBuilder, BreakerConfig, DEFAULT_RESOLUTION};
pub use error::{BreakerConfigError, BreakerError};
pub use events::BreakerEvent;
pub use layer::{BreakerLayer, BreakerService};
pub use state::BreakerState;

mod breaker;
pub mod classifier;
mod config;
mod error;
mod events;
mod layer;
mod state;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

pub(crate) fn init_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "breaker_calls_total",
                "Calls permitted or rejected by the breaker"
            );
            describe_counter!(
                "breaker_outcomes_total",
                "Outcomes recorded by the breaker"
            );
            describe_counter!(
                "breaker_transitions_total",
                "Breaker state transitions"
            );
            describe_gauge!(
                "breaker_state",
                "Current breaker state (0 = closed, 1 = half-open, 2 = open)"
            );
        });
    }
}
