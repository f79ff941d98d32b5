use crate::error::BreakerConfigError;
use crate::events::BreakerEvent;
use crate::{Breaker, BreakerState};
use hedgeguard_core::{EventListeners, FnListener};
use std::time::Duration;

/// Window length used when the configured resolution is zero.
pub const DEFAULT_RESOLUTION: Duration = Duration::from_secs(1);

/// Configuration for a [`Breaker`].
///
/// The defaults are a one second window, 50% thresholds, and a strict
/// (non-flexible) Closed to Open transition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BreakerConfig {
    /// How long one observation window lasts. Zero means one second.
    pub resolution: Duration,
    /// Failure ratio at which a Closed breaker trips.
    pub fail_ratio: f64,
    /// Failure ratio below which a HalfOpen breaker closes again.
    pub half_open_fail_ratio: f64,
    /// Fraction of calls let through while HalfOpen.
    pub half_open_allow_ratio: f64,
    /// Trip Closed to HalfOpen instead of Open.
    pub flexible: bool,
    /// Name used in events, logs and metrics.
    pub name: String,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            fail_ratio: 0.5,
            half_open_fail_ratio: 0.5,
            half_open_allow_ratio: 0.5,
            flexible: false,
            name: String::from("<unnamed>"),
        }
    }
}

impl BreakerConfig {
    /// Checks every ratio is within `[0, 1]`.
    pub fn validate(&self) -> Result<(), BreakerConfigError> {
        check_ratio("fail_ratio", self.fail_ratio)?;
        check_ratio("half_open_fail_ratio", self.half_open_fail_ratio)?;
        check_ratio("half_open_allow_ratio", self.half_open_allow_ratio)?;
        Ok(())
    }

    /// The window length the breaker actually uses.
    pub fn effective_resolution(&self) -> Duration {
        if self.resolution.is_zero() {
            DEFAULT_RESOLUTION
        } else {
            self.resolution
        }
    }

    pub(crate) fn normalized(mut self) -> Result<Self, BreakerConfigError> {
        self.validate()?;
        self.resolution = self.effective_resolution();
        Ok(self)
    }
}

fn check_ratio(field: &'static str, value: f64) -> Result<(), BreakerConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BreakerConfigError::RatioOutOfRange { field, value })
    }
}

/// Builder for a [`Breaker`].
pub struct BreakerBuilder {
    config: BreakerConfig,
    event_listeners: EventListeners<BreakerEvent>,
}

impl BreakerBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self {
            config: BreakerConfig::default(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: BreakerConfig) -> Self {
        Self {
            config,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the window length.
    ///
    /// Default: 1 second. Zero is treated as the default.
    pub fn resolution(mut self, resolution: Duration) -> Self {
        self.config.resolution = resolution;
        self
    }

    /// Sets the failure ratio at which a Closed breaker trips.
    ///
    /// Default: 0.5
    pub fn fail_ratio(mut self, ratio: f64) -> Self {
        self.config.fail_ratio = ratio;
        self
    }

    /// Sets the failure ratio below which a HalfOpen breaker closes.
    ///
    /// Default: 0.5
    pub fn half_open_fail_ratio(mut self, ratio: f64) -> Self {
        self.config.half_open_fail_ratio = ratio;
        self
    }

    /// Sets the fraction of calls allowed while HalfOpen.
    ///
    /// Default: 0.5
    pub fn half_open_allow_ratio(mut self, ratio: f64) -> Self {
        self.config.half_open_allow_ratio = ratio;
        self
    }

    /// When set, a tripping Closed breaker goes HalfOpen instead of Open.
    ///
    /// Default: false
    pub fn flexible(mut self, flexible: bool) -> Self {
        self.config.flexible = flexible;
        self
    }

    /// Give this breaker a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.config.name = name.into();
        self
    }

    /// Registers a callback invoked with `(from, to)` on every state change.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(BreakerState, BreakerState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &BreakerEvent| {
                if let BreakerEvent::StateTransition { from, to, .. } = event {
                    f(*from, *to);
                }
            }));
        self
    }

    /// Registers a callback invoked with the current state when a call is permitted.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(BreakerState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &BreakerEvent| {
                if let BreakerEvent::CallPermitted { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a call is rejected.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(BreakerState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &BreakerEvent| {
                if let BreakerEvent::CallRejected { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback invoked with the outcome passed to `done`.
    pub fn on_outcome<F>(mut self, f: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &BreakerEvent| {
                if let BreakerEvent::OutcomeRecorded { success, .. } = event {
                    f(*success);
                }
            }));
        self
    }

    /// Registers a listener for every breaker event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&BreakerEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Validates the configuration and builds the breaker, starting Closed.
    pub fn build(self) -> Result<Breaker, BreakerConfigError> {
        let config = self.config.normalized()?;
        Ok(Breaker::from_parts(config, self.event_listeners))
    }
}

impl Default for BreakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
