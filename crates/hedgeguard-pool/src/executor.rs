//! Executor trait for spawning worker tasks.

use std::future::Future;
use tokio::task::JoinHandle;

/// Something that can spawn the pool's worker tasks.
///
/// The pool spawns one long-lived task per worker through this trait, so
/// workers can be placed on a dedicated runtime instead of the caller's.
///
/// ```rust,no_run
/// use hedgeguard_pool::WorkerPool;
/// use std::time::Duration;
///
/// let runtime = tokio::runtime::Builder::new_multi_thread()
///     .worker_threads(2)
///     .enable_time()
///     .build()
///     .unwrap();
///
/// let pool = WorkerPool::builder()
///     .max_workers(8)
///     .lifetime(Duration::from_secs(30))
///     .executor(runtime.handle().clone())
///     .build();
/// ```
pub trait Executor: Clone + Send + Sync + 'static {
    /// Spawns `future` and returns its handle.
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static;
}

impl Executor for tokio::runtime::Handle {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::runtime::Handle::spawn(self, future)
    }
}

/// Spawns on whichever tokio runtime is current at spawn time.
///
/// Unlike a captured [`Handle`](tokio::runtime::Handle), this can be created
/// outside of a runtime; spawning still requires one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioExecutor;

impl Executor for TokioExecutor {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(future)
    }
}

/// Spawns on the runtime that was current when it was created.
#[derive(Debug, Clone)]
pub struct CurrentRuntime {
    handle: tokio::runtime::Handle,
}

impl CurrentRuntime {
    /// Captures the current runtime handle.
    ///
    /// # Panics
    ///
    /// Panics if called from outside a tokio runtime.
    pub fn new() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl Default for CurrentRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for CurrentRuntime {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}
