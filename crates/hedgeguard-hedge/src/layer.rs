//! Tower integration for hedged calls.

use crate::config::HedgeConfig;
use crate::error::HedgeError;
use crate::events::HedgeEvent;
use crate::hedger::Hedger;
use crate::worker::ServiceWorker;
use futures::future::BoxFuture;
use hedgeguard_core::{CancelScope, EventListeners};
use hedgeguard_pool::{Executor, TokioExecutor, WorkerPool};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A Tower layer that hedges calls to the wrapped service.
///
/// Built with [`HedgerBuilder::layer`](crate::HedgerBuilder::layer). Every
/// service the layer produces shares the layer's pool.
///
/// ```rust
/// use hedgeguard_hedge::Hedger;
/// use std::time::Duration;
/// use tower::ServiceBuilder;
///
/// let layer = Hedger::builder()
///     .name("search")
///     .timeout(Duration::from_millis(30))
///     .upto(2)
///     .layer();
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(tower::service_fn(|query: String| async move {
///         Ok::<_, std::io::Error>(query.len())
///     }));
/// ```
#[derive(Clone)]
pub struct HedgeLayer<E = TokioExecutor> {
    config: HedgeConfig,
    pool: WorkerPool<E>,
    listeners: EventListeners<HedgeEvent>,
}

impl<E> HedgeLayer<E> {
    pub(crate) fn from_parts(
        config: HedgeConfig,
        pool: WorkerPool<E>,
        listeners: EventListeners<HedgeEvent>,
    ) -> Self {
        Self {
            config,
            pool,
            listeners,
        }
    }

    /// The configuration every produced service uses.
    pub fn config(&self) -> &HedgeConfig {
        &self.config
    }
}

impl<S, E> Layer<S> for HedgeLayer<E> {
    type Service = Hedge<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        Hedge {
            hedger: Hedger::from_parts(
                self.config.clone(),
                ServiceWorker::new(service),
                self.pool.clone(),
                self.listeners.clone(),
            ),
        }
    }
}

/// A service that hedges each request over its inner service.
///
/// Every call runs under its own root [`CancelScope`], so dropping the response
/// future cancels that call's attempts. Requests must be `Clone` because each
/// attempt sends its own copy.
pub struct Hedge<S, E = TokioExecutor> {
    hedger: Hedger<ServiceWorker<S>, E>,
}

impl<S, E> Hedge<S, E> {
    /// The hedger driving this service.
    pub fn hedger(&self) -> &Hedger<ServiceWorker<S>, E> {
        &self.hedger
    }
}

impl<S, E> Clone for Hedge<S, E> {
    fn clone(&self) -> Self {
        Self {
            hedger: self.hedger.clone(),
        }
    }
}

impl<S, E, Req> Service<Req> for Hedge<S, E>
where
    S: Service<Req> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    E: Executor,
    Req: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = HedgeError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    // Each attempt drives its own clone of the inner service to readiness.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let hedger = self.hedger.clone();
        Box::pin(async move {
            let scope = CancelScope::new();
            hedger.execute(&scope, req).await
        })
    }
}
