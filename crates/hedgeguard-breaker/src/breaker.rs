use crate::config::{BreakerBuilder, BreakerConfig};
use crate::error::{BreakerConfigError, BreakerError};
use crate::events::BreakerEvent;
use crate::state::{BreakerState, Snapshot};
use arc_swap::ArcSwap;
use hedgeguard_core::EventListeners;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

struct Shared {
    config: BreakerConfig,
    snapshot: ArcSwap<Snapshot>,
    successes: AtomicU32,
    fails: AtomicU32,
    event_listeners: EventListeners<BreakerEvent>,
}

/// An adaptive circuit breaker.
///
/// Outcomes are counted per time window. When a window ends, the next call to
/// [`allow`](Self::allow) looks at the failure ratio of the window that just
/// ended and picks the next state:
///
/// - an Open breaker always goes HalfOpen and lets that call through,
/// - a window without observations closes the breaker,
/// - a HalfOpen breaker closes when its failure ratio is below
///   `half_open_fail_ratio` and opens otherwise,
/// - a Closed breaker stays Closed when its failure ratio is below
///   `fail_ratio` and trips otherwise (to HalfOpen when `flexible`).
///
/// The state lives in a single atomically swapped snapshot and the counters
/// are plain atomics, so `allow` and `done` never take a lock. Clones share
/// the same breaker.
///
/// ```rust
/// use hedgeguard_breaker::{Breaker, BreakerState};
///
/// let breaker = Breaker::builder().name("inventory").build().unwrap();
/// assert_eq!(breaker.state(), BreakerState::Closed);
///
/// if breaker.allow() {
///     let ok = true; // run the operation
///     breaker.done(ok);
/// }
/// ```
#[derive(Clone)]
pub struct Breaker {
    shared: Arc<Shared>,
}

impl Breaker {
    /// Returns a builder with default settings.
    pub fn builder() -> BreakerBuilder {
        crate::init_metrics();
        BreakerBuilder::new()
    }

    /// Builds a breaker from a configuration, validating it first.
    pub fn new(config: BreakerConfig) -> Result<Self, BreakerConfigError> {
        crate::init_metrics();
        BreakerBuilder::from_config(config).build()
    }

    pub(crate) fn from_parts(
        config: BreakerConfig,
        event_listeners: EventListeners<BreakerEvent>,
    ) -> Self {
        let snapshot = Snapshot::new(BreakerState::Closed, Instant::now(), config.resolution);

        #[cfg(feature = "metrics")]
        gauge!("breaker_state", "breaker" => config.name.clone()).set(state_gauge(snapshot.state));

        Self {
            shared: Arc::new(Shared {
                config,
                snapshot: ArcSwap::from_pointee(snapshot),
                successes: AtomicU32::new(0),
                fails: AtomicU32::new(0),
                event_listeners,
            }),
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &BreakerConfig {
        &self.shared.config
    }

    /// The breaker's name.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// The current state.
    ///
    /// A window that has already ended is only re-evaluated by the next
    /// [`allow`](Self::allow), so this may still report the previous state.
    pub fn state(&self) -> BreakerState {
        self.shared.snapshot.load().state
    }

    /// Outcomes recorded in the current window, as `(successes, fails)`.
    pub fn counts(&self) -> (u32, u32) {
        (
            self.shared.successes.load(Ordering::Acquire),
            self.shared.fails.load(Ordering::Acquire),
        )
    }

    /// Reports whether the next call may proceed.
    ///
    /// Every `true` must be followed by exactly one [`done`](Self::done).
    pub fn allow(&self) -> bool {
        loop {
            let now = Instant::now();
            let current = self.shared.snapshot.load_full();

            if current.covers(now) {
                let allowed = match current.state {
                    BreakerState::Closed => true,
                    BreakerState::Open => false,
                    BreakerState::HalfOpen => {
                        rand::random::<f64>() < self.shared.config.half_open_allow_ratio
                    }
                };
                self.record_decision(current.state, allowed);
                return allowed;
            }

            if let Some((state, allowed)) = self.roll_window(&current, now) {
                self.record_decision(state, allowed);
                return allowed;
            }
            // Another caller committed the transition first; decide against its window.
        }
    }

    /// Records the outcome of a call that [`allow`](Self::allow) permitted.
    pub fn done(&self, success: bool) {
        if success {
            self.shared.successes.fetch_add(1, Ordering::AcqRel);
        } else {
            self.shared.fails.fetch_add(1, Ordering::AcqRel);
        }

        #[cfg(feature = "metrics")]
        counter!(
            "breaker_outcomes_total",
            "breaker" => self.shared.config.name.clone(),
            "outcome" => if success { "success" } else { "failure" }
        )
        .increment(1);

        if !self.shared.event_listeners.is_empty() {
            self.shared
                .event_listeners
                .emit(&BreakerEvent::OutcomeRecorded {
                    name: self.shared.config.name.clone(),
                    timestamp: Instant::now(),
                    success,
                });
        }
    }

    /// Asks for permission and returns a guard that records the outcome.
    ///
    /// A guard dropped without an explicit outcome counts as a failure, so an
    /// abandoned call still pairs its `allow` with a `done`.
    pub fn permit(&self) -> Option<BreakerPermit> {
        if self.allow() {
            Some(BreakerPermit {
                breaker: self.clone(),
                recorded: false,
            })
        } else {
            None
        }
    }

    /// Runs `f` if the breaker allows it and records whether it succeeded.
    pub fn call_sync<T, E, F>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let permit = self.permit().ok_or(BreakerError::Open)?;
        let result = f();
        permit.record(result.is_ok());
        result.map_err(BreakerError::Inner)
    }

    /// Awaits `fut` if the breaker allows it and records whether it succeeded.
    ///
    /// `fut` is not polled at all when the breaker refuses the call.
    pub async fn call<T, E, F>(&self, fut: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let permit = self.permit().ok_or(BreakerError::Open)?;
        let result = fut.await;
        permit.record(result.is_ok());
        result.map_err(BreakerError::Inner)
    }

    /// Evaluates the window that just ended and tries to commit the next one.
    ///
    /// Returns `None` when a concurrent caller swapped the snapshot first.
    fn roll_window(&self, current: &Arc<Snapshot>, now: Instant) -> Option<(BreakerState, bool)> {
        let config = &self.shared.config;

        let (next, allowed) = if current.state == BreakerState::Open {
            (BreakerState::HalfOpen, true)
        } else {
            let successes = self.shared.successes.load(Ordering::Acquire);
            let fails = self.shared.fails.load(Ordering::Acquire);
            let total = u64::from(successes) + u64::from(fails);

            if total == 0 {
                (BreakerState::Closed, true)
            } else {
                let fail_rate = f64::from(fails) / total as f64;
                let healthy = match current.state {
                    BreakerState::HalfOpen => fail_rate < config.half_open_fail_ratio,
                    _ => fail_rate < config.fail_ratio,
                };
                let next = if healthy {
                    BreakerState::Closed
                } else if current.state == BreakerState::Closed && config.flexible {
                    BreakerState::HalfOpen
                } else {
                    BreakerState::Open
                };
                (next, healthy)
            }
        };

        let fresh = Arc::new(Snapshot::new(next, now, config.resolution));
        let previous = self.shared.snapshot.compare_and_swap(current, fresh);
        if !Arc::ptr_eq(&*previous, current) {
            return None;
        }

        self.shared.successes.store(0, Ordering::Release);
        self.shared.fails.store(0, Ordering::Release);

        if current.state != next {
            self.on_transition(current.state, next);
        }
        Some((next, allowed))
    }

    fn on_transition(&self, from: BreakerState, to: BreakerState) {
        let config = &self.shared.config;

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %config.name, %from, %to, "breaker state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "breaker_transitions_total",
                "breaker" => config.name.clone(),
                "from" => from.as_str(),
                "to" => to.as_str()
            )
            .increment(1);
            gauge!("breaker_state", "breaker" => config.name.clone()).set(state_gauge(to));
        }

        self.shared
            .event_listeners
            .emit(&BreakerEvent::StateTransition {
                name: config.name.clone(),
                timestamp: Instant::now(),
                from,
                to,
            });
    }

    fn record_decision(&self, state: BreakerState, allowed: bool) {
        #[cfg(feature = "tracing")]
        {
            if !allowed {
                tracing::trace!(breaker = %self.shared.config.name, %state, "breaker rejected call");
            }
        }

        #[cfg(feature = "metrics")]
        counter!(
            "breaker_calls_total",
            "breaker" => self.shared.config.name.clone(),
            "outcome" => if allowed { "permitted" } else { "rejected" }
        )
        .increment(1);

        if self.shared.event_listeners.is_empty() {
            return;
        }
        let name = self.shared.config.name.clone();
        let timestamp = Instant::now();
        let event = if allowed {
            BreakerEvent::CallPermitted {
                name,
                timestamp,
                state,
            }
        } else {
            BreakerEvent::CallRejected {
                name,
                timestamp,
                state,
            }
        };
        self.shared.event_listeners.emit(&event);
    }
}

#[cfg(feature = "metrics")]
fn state_gauge(state: BreakerState) -> f64 {
    match state {
        BreakerState::Closed => 0.0,
        BreakerState::HalfOpen => 1.0,
        BreakerState::Open => 2.0,
    }
}

impl fmt::Debug for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (successes, fails) = self.counts();
        f.debug_struct("Breaker")
            .field("name", &self.shared.config.name)
            .field("state", &self.state())
            .field("successes", &successes)
            .field("fails", &fails)
            .finish()
    }
}

/// Permission for one call, returned by [`Breaker::permit`].
///
/// Dropping it without recording an outcome records a failure.
#[must_use = "dropping a permit records a failure"]
pub struct BreakerPermit {
    breaker: Breaker,
    recorded: bool,
}

impl BreakerPermit {
    /// Records a success.
    pub fn success(self) {
        self.record(true);
    }

    /// Records a failure.
    pub fn failure(self) {
        self.record(false);
    }

    /// Records the given outcome.
    pub fn record(mut self, success: bool) {
        self.recorded = true;
        self.breaker.done(success);
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if !self.recorded {
            self.breaker.done(false);
        }
    }
}

impl fmt::Debug for BreakerPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerPermit")
            .field("breaker", &self.breaker.name())
            .finish()
    }
}
