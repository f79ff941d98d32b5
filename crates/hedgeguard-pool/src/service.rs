//! Service implementation for the pool middleware.

use crate::{Executor, WorkerPool};
use futures::future::BoxFuture;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;
use tower_service::Service;

/// A service that runs every request on a [`WorkerPool`].
///
/// Each call clones the inner service and submits the clone, together with
/// the request, to the pool. The response comes back over a channel.
///
/// # Cancellation
///
/// Dropping the response future after the request was accepted by a worker
/// does not stop the worker; the request runs to completion and its response
/// is discarded.
#[derive(Clone)]
pub struct PoolService<S, E> {
    inner: S,
    pool: WorkerPool<E>,
}

impl<S, E> PoolService<S, E> {
    /// Creates a new pool service.
    pub fn new(service: S, pool: WorkerPool<E>) -> Self {
        Self {
            inner: service,
            pool,
        }
    }

    /// Returns a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns the pool requests run on.
    pub fn pool(&self) -> &WorkerPool<E> {
        &self.pool
    }

    /// Consumes the service and returns the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, E, Req> Service<Req> for PoolService<S, E>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    E: Executor,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = PoolError<S::Error>;
    type Future = PoolFuture<S::Response, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(PoolError::Service)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let clone = self.inner.clone();
        let mut service = std::mem::replace(&mut self.inner, clone);
        let (tx, rx) = oneshot::channel();
        let pool = self.pool.clone();

        let submit = Box::pin(async move {
            pool.submit(async move {
                let result = service.call(req).await;
                // The caller may have gone away; nothing to do then.
                let _ = tx.send(result.map_err(PoolError::Service));
            })
            .await;
        });

        PoolFuture {
            submit: Some(submit),
            rx,
        }
    }
}

/// Error type for [`PoolService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError<E> {
    /// The worker went away before answering.
    TaskCancelled,
    /// The inner service returned an error.
    Service(E),
}

impl<E: std::fmt::Display> std::fmt::Display for PoolError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskCancelled => write!(f, "pool task was cancelled before responding"),
            Self::Service(e) => write!(f, "service error: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for PoolError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }
}

pin_project! {
    /// Future returned by [`PoolService`].
    ///
    /// First waits for the pool to accept the request, then for the response.
    pub struct PoolFuture<T, E> {
        submit: Option<BoxFuture<'static, ()>>,
        #[pin]
        rx: oneshot::Receiver<Result<T, PoolError<E>>>,
    }
}

impl<T, E> Future for PoolFuture<T, E> {
    type Output = Result<T, PoolError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Some(submit) = this.submit.as_mut() {
            ready!(submit.as_mut().poll(cx));
            *this.submit = None;
        }
        match this.rx.poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::TaskCancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
