use crate::config::{HedgeConfig, HedgerBuilder};
use crate::error::HedgeError;
use crate::events::HedgeEvent;
use crate::worker::HedgedWorker;
use futures::future::BoxFuture;
use hedgeguard_core::{CancelScope, EventListeners, MultiError, ScopeError};
use hedgeguard_pool::{Executor, TokioExecutor, WorkerPool};
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

struct Inner<W, E> {
    worker: Arc<W>,
    pool: WorkerPool<E>,
    config: HedgeConfig,
    listeners: EventListeners<HedgeEvent>,
}

/// Runs a worker as a hedged call.
///
/// The first attempt starts at once. Whenever `timeout` passes without a
/// result, or an attempt fails, another attempt starts, up to `upto` in
/// total. The first success wins and every other attempt is cancelled.
/// The call fails only when every attempt has failed or the caller's scope
/// ends. Attempts run on a [`WorkerPool`]; clones share the worker and pool.
///
/// ```rust
/// use hedgeguard_core::CancelScope;
/// use hedgeguard_hedge::{worker_fn, Hedger};
/// use std::time::Duration;
///
/// # async fn example() {
/// let hedger = Hedger::builder()
///     .timeout(Duration::from_millis(50))
///     .upto(3)
///     .worker(worker_fn(|_scope: CancelScope, id: u32| async move {
///         Ok::<_, std::io::Error>(id * 2)
///     }))
///     .build();
///
/// let value = hedger.execute(&CancelScope::new(), 21).await.unwrap();
/// assert_eq!(value, 42);
/// # }
/// ```
pub struct Hedger<W, E = TokioExecutor> {
    inner: Arc<Inner<W, E>>,
}

impl Hedger<(), TokioExecutor> {
    /// Returns a builder with default settings.
    pub fn builder() -> HedgerBuilder {
        HedgerBuilder::new()
    }
}

impl<W, E> Hedger<W, E> {
    pub(crate) fn from_parts(
        config: HedgeConfig,
        worker: W,
        pool: WorkerPool<E>,
        listeners: EventListeners<HedgeEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                worker: Arc::new(worker),
                pool,
                config,
                listeners,
            }),
        }
    }

    /// The hedger's configuration, with a zero timeout already normalized.
    pub fn config(&self) -> &HedgeConfig {
        &self.inner.config
    }

    /// The pool attempts run on.
    pub fn pool(&self) -> &WorkerPool<E> {
        &self.inner.pool
    }

    /// The wrapped worker.
    pub fn worker(&self) -> &W {
        &self.inner.worker
    }
}

impl<W, E> Hedger<W, E>
where
    E: Executor,
{
    /// Runs `input` as a hedged call under `scope`.
    ///
    /// Ending `scope` stops the call with [`HedgeError::Cancelled`], even if
    /// some attempts have already failed. Dropping the returned future
    /// cancels every attempt still running.
    pub async fn execute<Req>(
        &self,
        scope: &CancelScope,
        input: Req,
    ) -> Result<W::Response, HedgeError<W::Error>>
    where
        W: HedgedWorker<Req>,
        Req: Clone + Send + 'static,
    {
        let inner = &*self.inner;
        let upto = inner.config.upto;
        let started = Instant::now();

        let (result_tx, mut result_rx) = mpsc::channel::<(usize, W::Response)>(upto);
        let (error_tx, mut error_rx) = mpsc::channel::<(usize, W::Error)>(upto);
        // Dropped once every attempt is out, so the channels close when the
        // last attempt goes away without reporting.
        let mut senders = Some((result_tx, error_tx));
        let mut results_open = true;
        let mut errors_open = true;

        let mut attempts = AttemptSet::with_capacity(upto);
        let mut errors = MultiError::with_capacity(upto);

        while errors.len() < upto {
            if let Some(reason) = scope.err() {
                return Err(self.cancelled(reason, attempts.len()));
            }

            let reporters = senders
                .as_ref()
                .map(|(results, errors)| (results.clone(), errors.clone()));
            if let Some((result_tx, error_tx)) = reporters {
                let index = attempts.len();
                let attempt_scope = attempts.start(scope);
                let task = attempt(
                    Arc::clone(&inner.worker),
                    attempt_scope,
                    input.clone(),
                    index,
                    result_tx,
                    error_tx,
                );

                // Submission may wait for a free worker; the caller can still leave.
                if let Err(reason) = scope.run(inner.pool.submit(task)).await {
                    return Err(self.cancelled(reason, attempts.len()));
                }
                self.attempt_started(index, started.elapsed());

                if attempts.len() == upto {
                    senders = None;
                }
            }

            if !results_open && !errors_open {
                break;
            }

            // A result that is already waiting beats everything else.
            if let Ok((index, response)) = result_rx.try_recv() {
                return Ok(self.succeeded(&mut attempts, index, started.elapsed(), response));
            }

            let stagger = tokio::time::sleep(inner.config.timeout);
            tokio::pin!(stagger);
            let more_to_send = senders.is_some();

            tokio::select! {
                biased;

                received = result_rx.recv(), if results_open => match received {
                    Some((index, response)) => {
                        return Ok(self.succeeded(&mut attempts, index, started.elapsed(), response));
                    }
                    None => results_open = false,
                },

                reason = scope.done() => {
                    return Err(self.cancelled(reason, attempts.len()));
                }

                received = error_rx.recv(), if errors_open => match received {
                    Some((index, error)) => {
                        if let Some(reason) = scope.err() {
                            return Err(self.cancelled(reason, attempts.len()));
                        }
                        self.attempt_failed(index);
                        errors.push(error);
                    }
                    None => errors_open = false,
                },

                _ = &mut stagger, if more_to_send => {}
            }
        }

        Err(self.all_failed(errors))
    }

    fn attempt_started(&self, attempt: usize, delay: Duration) {
        let config = &self.inner.config;

        #[cfg(feature = "tracing")]
        tracing::debug!(hedge = %config.name, attempt, ?delay, "hedged attempt started");

        #[cfg(feature = "metrics")]
        counter!("hedge_attempts_total", "hedge" => config.name.clone()).increment(1);

        self.inner.listeners.emit(&HedgeEvent::AttemptStarted {
            name: config.name.clone(),
            attempt,
            delay,
            timestamp: Instant::now(),
        });
    }

    fn attempt_failed(&self, attempt: usize) {
        let config = &self.inner.config;

        #[cfg(feature = "tracing")]
        tracing::debug!(hedge = %config.name, attempt, "hedged attempt failed");

        self.inner.listeners.emit(&HedgeEvent::AttemptFailed {
            name: config.name.clone(),
            attempt,
            timestamp: Instant::now(),
        });
    }

    fn succeeded<T>(
        &self,
        attempts: &mut AttemptSet,
        attempt: usize,
        duration: Duration,
        response: T,
    ) -> T {
        attempts.winner = Some(attempt);
        let config = &self.inner.config;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            hedge = %config.name,
            attempt,
            attempts = attempts.len(),
            ?duration,
            "hedged call succeeded"
        );

        #[cfg(feature = "metrics")]
        {
            counter!("hedge_calls_total", "hedge" => config.name.clone(), "outcome" => "success")
                .increment(1);
            counter!("hedge_wins_total", "hedge" => config.name.clone(), "attempt" => attempt.to_string())
                .increment(1);
            histogram!("hedge_call_duration_seconds", "hedge" => config.name.clone())
                .record(duration.as_secs_f64());
        }

        self.inner.listeners.emit(&HedgeEvent::Succeeded {
            name: config.name.clone(),
            attempt,
            duration,
            attempts: attempts.len(),
            timestamp: Instant::now(),
        });
        response
    }

    fn cancelled<T>(&self, reason: ScopeError, attempts: usize) -> HedgeError<T> {
        let config = &self.inner.config;

        #[cfg(feature = "tracing")]
        tracing::debug!(hedge = %config.name, attempts, %reason, "hedged call cancelled");

        #[cfg(feature = "metrics")]
        counter!("hedge_calls_total", "hedge" => config.name.clone(), "outcome" => "cancelled")
            .increment(1);

        self.inner.listeners.emit(&HedgeEvent::Cancelled {
            name: config.name.clone(),
            attempts,
            reason,
            timestamp: Instant::now(),
        });
        HedgeError::Cancelled(reason)
    }

    fn all_failed<T>(&self, errors: MultiError<T>) -> HedgeError<T> {
        let config = &self.inner.config;

        #[cfg(feature = "tracing")]
        tracing::warn!(hedge = %config.name, attempts = errors.len(), "all hedged attempts failed");

        #[cfg(feature = "metrics")]
        counter!("hedge_calls_total", "hedge" => config.name.clone(), "outcome" => "failure")
            .increment(1);

        self.inner.listeners.emit(&HedgeEvent::AllFailed {
            name: config.name.clone(),
            attempts: errors.len(),
            timestamp: Instant::now(),
        });
        HedgeError::AllAttemptsFailed(errors)
    }
}

/// Body of one attempt: race the worker against the attempt's scope and
/// report the outcome, unless the scope ended first.
async fn attempt<W, Req>(
    worker: Arc<W>,
    scope: CancelScope,
    input: Req,
    index: usize,
    results: mpsc::Sender<(usize, W::Response)>,
    errors: mpsc::Sender<(usize, W::Error)>,
) where
    W: HedgedWorker<Req>,
{
    let work = worker.execute(scope.clone(), input);
    tokio::select! {
        biased;
        _ = scope.done() => {}
        outcome = work => match outcome {
            // Capacity is `upto` and each attempt sends once, so neither send can fail
            // for lack of room; a closed channel means the call already returned.
            Ok(response) => {
                let _ = results.try_send((index, response));
            }
            Err(error) => {
                let _ = errors.try_send((index, error));
            }
        },
    }
}

/// Scopes of the attempts launched for one call.
///
/// Dropping the set cancels every attempt except the winner, whichever way
/// the call ends.
struct AttemptSet {
    scopes: Vec<CancelScope>,
    winner: Option<usize>,
}

impl AttemptSet {
    fn with_capacity(upto: usize) -> Self {
        Self {
            scopes: Vec::with_capacity(upto),
            winner: None,
        }
    }

    fn start(&mut self, parent: &CancelScope) -> CancelScope {
        let scope = parent.child();
        self.scopes.push(scope.clone());
        scope
    }

    fn len(&self) -> usize {
        self.scopes.len()
    }
}

impl Drop for AttemptSet {
    fn drop(&mut self) {
        for (index, scope) in self.scopes.iter().enumerate() {
            if self.winner != Some(index) {
                scope.cancel();
            }
        }
    }
}

impl<W, E> Clone for Hedger<W, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W, E> fmt::Debug for Hedger<W, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hedger")
            .field("name", &self.inner.config.name)
            .field("timeout", &self.inner.config.timeout)
            .field("upto", &self.inner.config.upto)
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}

/// Hedgers nest: one hedger can be the worker of another.
impl<W, E, Req> HedgedWorker<Req> for Hedger<W, E>
where
    W: HedgedWorker<Req>,
    E: Executor,
    Req: Clone + Send + 'static,
{
    type Response = W::Response;
    type Error = HedgeError<W::Error>;

    fn execute(
        &self,
        scope: CancelScope,
        input: Req,
    ) -> BoxFuture<'static, Result<Self::Response, Self::Error>> {
        let hedger = self.clone();
        Box::pin(async move { Hedger::execute(&hedger, &scope, input).await })
    }
}
