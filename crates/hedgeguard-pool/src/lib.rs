//! A bounded worker pool.
//!
//! [`WorkerPool`] runs submitted tasks on at most `max_workers` long-lived
//! worker tasks. A submission is handed to the longest-idle worker if one is
//! waiting, starts a new worker if the pool has room, and otherwise waits for
//! a worker to free up. Workers that stay idle for `lifetime` exit on their
//! own, so a quiet pool shrinks back to nothing.
//!
//! # Example
//!
//! ```rust
//! use hedgeguard_pool::WorkerPool;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let pool = WorkerPool::builder()
//!     .name("fetchers")
//!     .max_workers(8)
//!     .lifetime(Duration::from_secs(30))
//!     .build();
//!
//! for i in 0..100 {
//!     pool.submit(async move {
//!         let _ = i; // do some work
//!     })
//!     .await;
//! }
//! # }
//! ```
//!
//! # As Tower middleware
//!
//! ```rust
//! use hedgeguard_pool::{PoolLayer, WorkerPool};
//! use tower::{Service, ServiceBuilder, ServiceExt};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut service = ServiceBuilder::new()
//!     .layer(PoolLayer::new(WorkerPool::new(4, Duration::from_secs(10))))
//!     .service(tower::service_fn(|name: String| async move {
//!         Ok::<_, std::io::Error>(format!("Hello, {}!", name))
//!     }));
//!
//! let response = service.ready().await?.call("World".to_string()).await?;
//! assert_eq!(response, "Hello, World!");
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//! - `metrics`: enables metrics collection using the `metrics` crate
//! - `tracing`: enables logging and tracing using the `tracing` crate

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

mod events;
mod executor;
mod layer;
mod pool;
mod service;

pub use events::PoolEvent;
pub use executor::{CurrentRuntime, Executor, TokioExecutor};
pub use layer::PoolLayer;
pub use pool::{Task, WorkerPool, WorkerPoolBuilder, DEFAULT_LIFETIME, DEFAULT_MAX_WORKERS};
pub use service::{PoolError, PoolFuture, PoolService};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

pub(crate) fn init_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            describe_counter!("pool_workers_spawned_total", "Workers started by the pool");
            describe_counter!("pool_workers_retired_total", "Idle workers that exited");
            describe_counter!(
                "pool_tasks_handed_off_total",
                "Tasks given directly to an idle worker"
            );
            describe_counter!(
                "pool_submissions_blocked_total",
                "Submissions that had to wait for a free worker"
            );
            describe_counter!("pool_task_panics_total", "Tasks that panicked on a worker");
            describe_gauge!("pool_active_workers", "Workers currently alive");
        });
    }
}
