use crate::classifier::{DefaultClassifier, FailureClassifier, FnClassifier};
use crate::{Breaker, BreakerError};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// A Tower layer that guards a service with a [`Breaker`].
///
/// Every service produced by one layer shares the layer's breaker, so all of
/// them open and close together.
///
/// ```rust
/// use hedgeguard_breaker::{Breaker, BreakerLayer};
/// use tower::{ServiceBuilder, service_fn};
///
/// let breaker = Breaker::builder().name("search").build().unwrap();
/// let service = ServiceBuilder::new()
///     .layer(BreakerLayer::new(breaker))
///     .service(service_fn(|q: String| async move { Ok::<_, std::io::Error>(q) }));
/// ```
#[derive(Debug, Clone)]
pub struct BreakerLayer<C = DefaultClassifier> {
    breaker: Breaker,
    classifier: C,
}

impl BreakerLayer<DefaultClassifier> {
    /// Guards services with `breaker`, counting every `Err` as a failure.
    pub fn new(breaker: Breaker) -> Self {
        Self {
            breaker,
            classifier: DefaultClassifier,
        }
    }
}

impl<C> BreakerLayer<C> {
    /// Replaces the failure classification.
    pub fn failure_classifier<F, Res, Err>(self, f: F) -> BreakerLayer<FnClassifier<F>>
    where
        F: Fn(&Result<Res, Err>) -> bool + Send + Sync + 'static,
    {
        BreakerLayer {
            breaker: self.breaker,
            classifier: FnClassifier::new(f),
        }
    }

    /// The shared breaker.
    pub fn breaker(&self) -> &Breaker {
        &self.breaker
    }
}

impl<S, C: Clone> Layer<S> for BreakerLayer<C> {
    type Service = BreakerService<S, C>;

    fn layer(&self, service: S) -> Self::Service {
        BreakerService {
            inner: service,
            breaker: self.breaker.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

/// A service guarded by a [`Breaker`].
#[derive(Debug, Clone)]
pub struct BreakerService<S, C = DefaultClassifier> {
    inner: S,
    breaker: Breaker,
    classifier: C,
}

impl<S, C> BreakerService<S, C> {
    /// The breaker guarding this service.
    pub fn breaker(&self) -> &Breaker {
        &self.breaker
    }

    /// Unwraps the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, C, Req> Service<Req> for BreakerService<S, C>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
    C: FailureClassifier<S::Response, S::Error> + Clone + 'static,
{
    type Response = S::Response;
    type Error = BreakerError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let permit = self.breaker.permit();
        let classifier = self.classifier.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let permit = permit.ok_or(BreakerError::Open)?;
            let result = inner.call(req).await;
            permit.record(!classifier.is_failure(&result));
            result.map_err(BreakerError::Inner)
        })
    }
}
