use crate::events::PoolEvent;
use crate::executor::{Executor, TokioExecutor};
use futures::future::BoxFuture;
use futures::FutureExt;
use hedgeguard_core::{EventListeners, FnListener};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// A unit of work run by the pool.
pub type Task = BoxFuture<'static, ()>;

/// Worker cap used by [`WorkerPool::builder`] when none is set.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Idle lifetime used by [`WorkerPool::builder`] when none is set.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(60);

struct PoolInner<E> {
    name: String,
    max_workers: usize,
    lifetime: Duration,
    permits: Arc<Semaphore>,
    // One hand-off slot per idle worker, longest waiting first.
    idle: Mutex<VecDeque<oneshot::Sender<Task>>>,
    capacity_freed: Notify,
    executor: E,
    event_listeners: EventListeners<PoolEvent>,
}

/// A bounded pool of reusable worker tasks.
///
/// Workers are started on demand, up to `max_workers`. A worker that finishes
/// a task waits for the next one for at most `lifetime` and then exits, so an
/// idle pool costs nothing. Clones share the same workers.
///
/// ```rust
/// use hedgeguard_pool::WorkerPool;
/// use std::time::Duration;
///
/// # async fn example() {
/// let pool = WorkerPool::new(4, Duration::from_secs(10));
/// let (tx, rx) = tokio::sync::oneshot::channel();
///
/// pool.submit(async move {
///     let _ = tx.send(21 * 2);
/// })
/// .await;
///
/// assert_eq!(rx.await.unwrap(), 42);
/// # }
/// ```
pub struct WorkerPool<E = TokioExecutor> {
    inner: Arc<PoolInner<E>>,
}

impl WorkerPool<TokioExecutor> {
    /// A pool of at most `max_workers` workers, each retired after `lifetime` idle.
    ///
    /// # Panics
    ///
    /// Panics if `max_workers` is zero.
    pub fn new(max_workers: usize, lifetime: Duration) -> Self {
        Self::builder()
            .max_workers(max_workers)
            .lifetime(lifetime)
            .build()
    }

    /// Returns a builder with default settings.
    pub fn builder() -> WorkerPoolBuilder<TokioExecutor> {
        crate::init_metrics();
        WorkerPoolBuilder::new()
    }
}

impl Default for WorkerPool<TokioExecutor> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS, DEFAULT_LIFETIME)
    }
}

impl<E> WorkerPool<E>
where
    E: Executor,
{
    /// Runs `task` on the pool.
    ///
    /// The task goes to the longest-idle worker if there is one, otherwise
    /// to a newly started worker if the pool has room. When every worker is
    /// busy and the pool is full, this waits until a worker frees up. That
    /// wait is the only point where submission blocks; the returned future
    /// resolves once the task has been accepted, not when it completes.
    pub async fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut task: Task = Box::pin(task);
        let mut blocked = false;

        loop {
            // Register interest before checking, so a worker freed between the
            // checks and the wait still wakes us.
            let freed = self.inner.capacity_freed.notified();
            tokio::pin!(freed);
            freed.as_mut().enable();

            task = match self.hand_off(task) {
                Ok(()) => return,
                Err(task) => task,
            };

            if let Ok(permit) = Arc::clone(&self.inner.permits).try_acquire_owned() {
                self.spawn_worker(permit, task);
                return;
            }

            if !blocked {
                blocked = true;
                self.on_blocked();
            }
            freed.await;
        }
    }

    /// Runs a synchronous closure on the pool. See [`submit`](Self::submit).
    pub async fn submit_fn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(async move { f() }).await
    }

    /// Gives `task` to an idle worker, or hands it back if none takes it.
    fn hand_off(&self, mut task: Task) -> Result<(), Task> {
        loop {
            let slot = self
                .inner
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();

            let Some(slot) = slot else {
                return Err(task);
            };

            // A worker whose idle lifetime ran out refuses the task; try the next.
            match slot.send(task) {
                Ok(()) => {
                    self.on_handed_off();
                    return Ok(());
                }
                Err(rejected) => task = rejected,
            }
        }
    }

    fn spawn_worker(&self, permit: OwnedSemaphorePermit, first: Task) {
        let inner = Arc::clone(&self.inner);

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %inner.name, active = self.active_workers(), "spawning worker");

        #[cfg(feature = "metrics")]
        {
            counter!("pool_workers_spawned_total", "pool" => inner.name.clone()).increment(1);
            gauge!("pool_active_workers", "pool" => inner.name.clone())
                .set(self.active_workers() as f64);
        }

        if !inner.event_listeners.is_empty() {
            inner.event_listeners.emit(&PoolEvent::WorkerSpawned {
                name: inner.name.clone(),
                timestamp: Instant::now(),
                active_workers: self.active_workers(),
            });
        }

        let _handle = self.inner.executor.spawn(worker_loop(inner, permit, first));
    }

    fn on_handed_off(&self) {
        #[cfg(feature = "tracing")]
        tracing::trace!(pool = %self.inner.name, "task handed to idle worker");

        #[cfg(feature = "metrics")]
        counter!("pool_tasks_handed_off_total", "pool" => self.inner.name.clone()).increment(1);

        if !self.inner.event_listeners.is_empty() {
            self.inner.event_listeners.emit(&PoolEvent::TaskHandedOff {
                name: self.inner.name.clone(),
                timestamp: Instant::now(),
            });
        }
    }

    fn on_blocked(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            pool = %self.inner.name,
            max_workers = self.inner.max_workers,
            "pool at capacity, waiting for a worker"
        );

        #[cfg(feature = "metrics")]
        counter!("pool_submissions_blocked_total", "pool" => self.inner.name.clone())
            .increment(1);

        if !self.inner.event_listeners.is_empty() {
            self.inner.event_listeners.emit(&PoolEvent::SubmissionBlocked {
                name: self.inner.name.clone(),
                timestamp: Instant::now(),
            });
        }
    }
}

impl<E> WorkerPool<E> {
    /// The pool's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Maximum number of concurrent workers.
    pub fn max_workers(&self) -> usize {
        self.inner.max_workers
    }

    /// How long a worker waits for work before exiting.
    pub fn lifetime(&self) -> Duration {
        self.inner.lifetime
    }

    /// Workers currently alive, busy or idle.
    pub fn active_workers(&self) -> usize {
        self.inner.max_workers - self.inner.permits.available_permits()
    }

    /// Workers currently waiting for a task.
    pub fn idle_workers(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|slot| !slot.is_closed())
            .count()
    }
}

impl<E> Clone for WorkerPool<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for WorkerPool<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.inner.name)
            .field("max_workers", &self.inner.max_workers)
            .field("lifetime", &self.inner.lifetime)
            .field("active_workers", &self.active_workers())
            .finish()
    }
}

impl<E> PoolInner<E> {
    fn park(&self, slot: oneshot::Sender<Task>) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        idle.retain(|waiting| !waiting.is_closed());
        idle.push_back(slot);
    }
}

async fn worker_loop<E>(pool: Arc<PoolInner<E>>, permit: OwnedSemaphorePermit, first: Task) {
    let mut task = first;

    loop {
        if AssertUnwindSafe(task).catch_unwind().await.is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(pool = %pool.name, "task panicked; worker continues");

            #[cfg(feature = "metrics")]
            counter!("pool_task_panics_total", "pool" => pool.name.clone()).increment(1);
        }

        let (slot, mut next) = oneshot::channel();
        pool.park(slot);
        pool.capacity_freed.notify_one();

        task = match tokio::time::timeout(pool.lifetime, &mut next).await {
            Ok(Ok(task)) => task,
            Ok(Err(_)) => break,
            Err(_elapsed) => {
                // Close the slot first: a task sent before the close is still ours.
                next.close();
                match next.try_recv() {
                    Ok(task) => task,
                    Err(_) => break,
                }
            }
        };
    }

    drop(permit);
    let active_workers = pool.max_workers - pool.permits.available_permits();

    #[cfg(feature = "tracing")]
    tracing::debug!(pool = %pool.name, active = active_workers, "idle worker retired");

    #[cfg(feature = "metrics")]
    {
        counter!("pool_workers_retired_total", "pool" => pool.name.clone()).increment(1);
        gauge!("pool_active_workers", "pool" => pool.name.clone()).set(active_workers as f64);
    }

    if !pool.event_listeners.is_empty() {
        pool.event_listeners.emit(&PoolEvent::WorkerRetired {
            name: pool.name.clone(),
            timestamp: Instant::now(),
            active_workers,
        });
    }

    pool.capacity_freed.notify_one();
}

/// Builder for a [`WorkerPool`].
pub struct WorkerPoolBuilder<E = TokioExecutor> {
    name: String,
    max_workers: usize,
    lifetime: Duration,
    executor: E,
    event_listeners: EventListeners<PoolEvent>,
}

impl WorkerPoolBuilder<TokioExecutor> {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            max_workers: DEFAULT_MAX_WORKERS,
            lifetime: DEFAULT_LIFETIME,
            executor: TokioExecutor,
            event_listeners: EventListeners::new(),
        }
    }
}

impl Default for WorkerPoolBuilder<TokioExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> WorkerPoolBuilder<E> {
    /// Sets the maximum number of concurrent workers.
    ///
    /// Default: 10
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets how long an idle worker waits for a task before exiting.
    ///
    /// Default: 60 seconds
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Give this pool a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Spawns workers through `executor` instead of the ambient tokio runtime.
    pub fn executor<E2: Executor>(self, executor: E2) -> WorkerPoolBuilder<E2> {
        WorkerPoolBuilder {
            name: self.name,
            max_workers: self.max_workers,
            lifetime: self.lifetime,
            executor,
            event_listeners: self.event_listeners,
        }
    }

    /// Registers a callback invoked with the active worker count when a worker starts.
    pub fn on_worker_spawned<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &PoolEvent| {
                if let PoolEvent::WorkerSpawned { active_workers, .. } = event {
                    f(*active_workers);
                }
            }));
        self
    }

    /// Registers a callback invoked with the active worker count when a worker exits.
    pub fn on_worker_retired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &PoolEvent| {
                if let PoolEvent::WorkerRetired { active_workers, .. } = event {
                    f(*active_workers);
                }
            }));
        self
    }

    /// Registers a callback invoked when a submission has to wait for capacity.
    pub fn on_submission_blocked<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &PoolEvent| {
                if matches!(event, PoolEvent::SubmissionBlocked { .. }) {
                    f();
                }
            }));
        self
    }

    /// Registers a listener for every pool event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&PoolEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Builds the pool. No worker is started until the first submission.
    ///
    /// # Panics
    ///
    /// Panics if `max_workers` is zero.
    pub fn build(self) -> WorkerPool<E> {
        assert!(self.max_workers > 0, "max_workers must be greater than zero");

        WorkerPool {
            inner: Arc::new(PoolInner {
                name: self.name,
                max_workers: self.max_workers,
                lifetime: self.lifetime,
                permits: Arc::new(Semaphore::new(self.max_workers)),
                idle: Mutex::new(VecDeque::with_capacity(self.max_workers)),
                capacity_freed: Notify::new(),
                executor: self.executor,
                event_listeners: self.event_listeners,
            }),
        }
    }
}
