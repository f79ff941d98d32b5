//! The unit of work a hedger races.

use futures::future::BoxFuture;
use hedgeguard_core::CancelScope;
use std::fmt;
use std::future::Future;
use tower::{Service, ServiceExt};

/// Something that can run one attempt of a hedged call.
///
/// Every attempt gets its own [`CancelScope`]. The scope is cancelled when
/// another attempt wins or the caller gives up; well-behaved workers watch it
/// and stop early, but the hedger never waits for them to do so.
pub trait HedgedWorker<Req>: Send + Sync + 'static {
    /// Successful output of an attempt.
    type Response: Send + 'static;
    /// Failed output of an attempt.
    type Error: Send + 'static;

    /// Runs one attempt.
    fn execute(
        &self,
        scope: CancelScope,
        input: Req,
    ) -> BoxFuture<'static, Result<Self::Response, Self::Error>>;
}

/// Adapts a closure into a [`HedgedWorker`].
///
/// ```rust
/// use hedgeguard_hedge::worker_fn;
/// use hedgeguard_core::CancelScope;
///
/// let worker = worker_fn(|scope: CancelScope, id: u64| async move {
///     scope
///         .run(async move { Ok::<_, std::io::Error>(format!("user-{id}")) })
///         .await
///         .unwrap_or_else(|cancelled| Err(std::io::Error::other(cancelled)))
/// });
/// ```
pub fn worker_fn<F>(f: F) -> WorkerFn<F> {
    WorkerFn { f }
}

/// A [`HedgedWorker`] backed by a closure. See [`worker_fn`].
#[derive(Clone, Copy)]
pub struct WorkerFn<F> {
    f: F,
}

impl<F, Fut, Req, T, E> HedgedWorker<Req> for WorkerFn<F>
where
    F: Fn(CancelScope, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Response = T;
    type Error = E;

    fn execute(&self, scope: CancelScope, input: Req) -> BoxFuture<'static, Result<T, E>> {
        Box::pin((self.f)(scope, input))
    }
}

impl<F> fmt::Debug for WorkerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerFn").finish_non_exhaustive()
    }
}

/// Runs attempts through a Tower service.
///
/// Each attempt drives its own clone of the service to readiness and calls
/// it. A readiness error counts as a failed attempt.
#[derive(Clone, Debug)]
pub struct ServiceWorker<S> {
    service: S,
}

impl<S> ServiceWorker<S> {
    /// Wraps `service`.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Returns a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.service
    }
}

impl<S, Req> HedgedWorker<Req> for ServiceWorker<S>
where
    S: Service<Req> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;

    fn execute(
        &self,
        _scope: CancelScope,
        input: Req,
    ) -> BoxFuture<'static, Result<S::Response, S::Error>> {
        let service = self.service.clone();
        Box::pin(async move { service.oneshot(input).await })
    }
}
