//! Configuration for the hedger.

use crate::events::HedgeEvent;
use crate::layer::HedgeLayer;
use crate::Hedger;
use hedgeguard_core::{EventListeners, FnListener};
use hedgeguard_pool::{Executor, TokioExecutor, WorkerPool};
use std::time::Duration;

/// Workers in the pool a hedger creates when none is supplied.
pub const DEFAULT_POOL_WORKERS: usize = 10;

/// Idle lifetime of the pool a hedger creates when none is supplied.
pub const DEFAULT_POOL_LIFETIME: Duration = Duration::from_secs(60);

/// Settings for a hedger.
///
/// Independent of request, response and error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HedgeConfig {
    /// Stagger between consecutive attempts. Zero means one nanosecond.
    pub timeout: Duration,
    /// Maximum number of attempts, including the first.
    pub upto: usize,
    /// Name for events, logs and metrics.
    pub name: String,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            upto: 2,
            name: String::from("<unnamed>"),
        }
    }
}

impl HedgeConfig {
    /// The stagger actually used between attempts.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            Duration::from_nanos(1)
        } else {
            self.timeout
        }
    }
}

/// Builder for a [`Hedger`] or a [`HedgeLayer`].
///
/// ```rust
/// use hedgeguard_hedge::{worker_fn, Hedger};
/// use hedgeguard_core::CancelScope;
/// use std::time::Duration;
///
/// let hedger = Hedger::builder()
///     .name("lookup")
///     .timeout(Duration::from_millis(20))
///     .upto(3)
///     .worker(worker_fn(|_scope: CancelScope, key: String| async move {
///         Ok::<_, std::io::Error>(key.len())
///     }))
///     .build();
/// ```
pub struct HedgerBuilder<W = (), E = TokioExecutor> {
    config: HedgeConfig,
    worker: Option<W>,
    pool: Option<WorkerPool<E>>,
    listeners: EventListeners<HedgeEvent>,
}

impl HedgerBuilder<(), TokioExecutor> {
    /// Creates a builder with default settings and no worker.
    pub fn new() -> Self {
        Self {
            config: HedgeConfig::default(),
            worker: None,
            pool: None,
            listeners: EventListeners::new(),
        }
    }
}

impl Default for HedgerBuilder<(), TokioExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W, E> HedgerBuilder<W, E> {
    /// Starts from an existing configuration.
    pub fn config(mut self, config: HedgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name for this hedger (used in events, logs and metrics).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the stagger between consecutive attempts.
    ///
    /// The next attempt starts when this much time passes without a result.
    /// It is pacing only, never a deadline for an attempt.
    ///
    /// Default: 1 second. Zero is treated as one nanosecond.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the maximum number of attempts, including the first.
    ///
    /// Default: 2
    pub fn upto(mut self, upto: usize) -> Self {
        self.config.upto = upto;
        self
    }

    /// Sets the worker that runs each attempt.
    pub fn worker<W2>(self, worker: W2) -> HedgerBuilder<W2, E> {
        HedgerBuilder {
            config: self.config,
            worker: Some(worker),
            pool: self.pool,
            listeners: self.listeners,
        }
    }

    /// Runs attempts on `pool` instead of a private pool of
    /// [`DEFAULT_POOL_WORKERS`] workers.
    ///
    /// Sharing one pool between hedgers bounds their combined concurrency.
    pub fn pool<E2: Executor>(self, pool: WorkerPool<E2>) -> HedgerBuilder<W, E2> {
        HedgerBuilder {
            config: self.config,
            worker: self.worker,
            pool: Some(pool),
            listeners: self.listeners,
        }
    }

    /// Registers a listener for every hedge event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&HedgeEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    /// Registers a callback invoked with the index of each attempt as it starts.
    pub fn on_attempt_started<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.listeners
            .add(FnListener::new(move |event: &HedgeEvent| {
                if let HedgeEvent::AttemptStarted { attempt, .. } = event {
                    f(*attempt);
                }
            }));
        self
    }

    /// Registers a callback invoked with the winning attempt and the call's duration.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.listeners
            .add(FnListener::new(move |event: &HedgeEvent| {
                if let HedgeEvent::Succeeded {
                    attempt, duration, ..
                } = event
                {
                    f(*attempt, *duration);
                }
            }));
        self
    }

    fn into_parts(self) -> (HedgeConfig, Option<W>, Option<WorkerPool<E>>, EventListeners<HedgeEvent>) {
        assert!(self.config.upto >= 1, "upto must be greater than 0");
        let mut config = self.config;
        config.timeout = config.effective_timeout();
        (config, self.worker, self.pool, self.listeners)
    }
}

impl<W> HedgerBuilder<W, TokioExecutor> {
    /// Builds the hedger.
    ///
    /// # Panics
    ///
    /// Panics if `upto` is zero or no worker was configured.
    pub fn build(self) -> Hedger<W, TokioExecutor> {
        crate::init_metrics();
        let (config, worker, pool, listeners) = self.into_parts();
        let worker = worker.expect("worker must be configured");
        let pool = pool.unwrap_or_else(default_pool);
        Hedger::from_parts(config, worker, pool, listeners)
    }

    /// Builds a Tower layer that hedges calls to the wrapped service.
    ///
    /// Any configured worker is ignored; the wrapped service does the work.
    ///
    /// # Panics
    ///
    /// Panics if `upto` is zero.
    pub fn layer(self) -> HedgeLayer<TokioExecutor> {
        crate::init_metrics();
        let (config, _, pool, listeners) = self.into_parts();
        HedgeLayer::from_parts(config, pool.unwrap_or_else(default_pool), listeners)
    }
}

impl<W, E: Executor> HedgerBuilder<W, E> {
    /// Builds the hedger on the configured pool.
    ///
    /// # Panics
    ///
    /// Panics if `upto` is zero, no worker was configured, or no pool was set.
    pub fn build_on_pool(self) -> Hedger<W, E> {
        crate::init_metrics();
        let (config, worker, pool, listeners) = self.into_parts();
        let worker = worker.expect("worker must be configured");
        let pool = pool.expect("pool must be configured");
        Hedger::from_parts(config, worker, pool, listeners)
    }
}

fn default_pool() -> WorkerPool<TokioExecutor> {
    WorkerPool::builder()
        .name("hedge")
        .max_workers(DEFAULT_POOL_WORKERS)
        .lifetime(DEFAULT_POOL_LIFETIME)
        .build()
}
