//! Layer implementation for the pool middleware.

use crate::{PoolService, TokioExecutor, WorkerPool};
use tower_layer::Layer;

/// A Tower layer that runs requests on a shared [`WorkerPool`].
///
/// Services produced by one layer share its pool, so the pool's worker cap
/// bounds the concurrency of all of them together.
///
/// ```rust
/// use hedgeguard_pool::{PoolLayer, WorkerPool};
/// use std::time::Duration;
/// use tower::ServiceBuilder;
///
/// let layer = PoolLayer::new(WorkerPool::new(16, Duration::from_secs(30)));
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(tower::service_fn(|req: String| async move {
///         Ok::<_, std::io::Error>(req.len())
///     }));
/// ```
#[derive(Clone)]
pub struct PoolLayer<E = TokioExecutor> {
    pool: WorkerPool<E>,
}

impl<E> PoolLayer<E> {
    /// Creates a layer that runs requests on `pool`.
    pub fn new(pool: WorkerPool<E>) -> Self {
        Self { pool }
    }

    /// The shared pool.
    pub fn pool(&self) -> &WorkerPool<E> {
        &self.pool
    }
}

impl PoolLayer<TokioExecutor> {
    /// A layer over a pool with default settings.
    pub fn with_defaults() -> Self {
        Self::new(WorkerPool::default())
    }
}

impl<S, E> Layer<S> for PoolLayer<E> {
    type Service = PoolService<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        PoolService::new(service, self.pool.clone())
    }
}
