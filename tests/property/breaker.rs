//! Property tests for the breaker's window roll-over.
//!
//! Invariants tested:
//! - The failure ratio is computed from exactly the outcomes of the window
//! - Closed and HalfOpen windows follow the transition table
//! - An empty window always closes the breaker and allows the call

use super::paused_runtime;
use hedgeguard_breaker::{Breaker, BreakerState};
use proptest::prelude::*;
use std::time::Duration;

const WINDOW: Duration = Duration::from_millis(10);

fn record(breaker: &Breaker, successes: u32, fails: u32) {
    for _ in 0..successes {
        assert!(breaker.allow());
        breaker.done(true);
    }
    for _ in 0..fails {
        assert!(breaker.allow());
        breaker.done(false);
    }
}

fn expected_after_closed(successes: u32, fails: u32, fail_ratio: f64, flexible: bool) -> (BreakerState, bool) {
    let total = successes + fails;
    if total == 0 {
        return (BreakerState::Closed, true);
    }
    let rate = f64::from(fails) / f64::from(total);
    if rate < fail_ratio {
        (BreakerState::Closed, true)
    } else if flexible {
        (BreakerState::HalfOpen, false)
    } else {
        (BreakerState::Open, false)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: a Closed window is judged by `fail_ratio`
    #[test]
    fn closed_window_follows_the_table(
        successes in 0u32..40,
        fails in 0u32..40,
        fail_ratio in 0.0f64..=1.0,
        flexible in any::<bool>(),
    ) {
        paused_runtime().block_on(async {
            let breaker = Breaker::builder()
                .resolution(WINDOW)
                .fail_ratio(fail_ratio)
                .flexible(flexible)
                .build()
                .unwrap();

            record(&breaker, successes, fails);
            prop_assert_eq!(breaker.counts(), (successes, fails));

            tokio::time::advance(WINDOW * 2).await;
            let allowed = breaker.allow();

            let (state, expected_allowed) = expected_after_closed(successes, fails, fail_ratio, flexible);
            prop_assert_eq!(breaker.state(), state);
            prop_assert_eq!(allowed, expected_allowed);
            Ok(())
        })?;
    }

    /// Property: a HalfOpen window is judged by `half_open_fail_ratio`
    #[test]
    fn half_open_window_follows_the_table(
        successes in 0u32..40,
        fails in 0u32..40,
        half_open_fail_ratio in 0.0f64..=1.0,
    ) {
        paused_runtime().block_on(async {
            let breaker = Breaker::builder()
                .resolution(WINDOW)
                .fail_ratio(0.5)
                .half_open_fail_ratio(half_open_fail_ratio)
                .half_open_allow_ratio(1.0)
                .flexible(true)
                .build()
                .unwrap();

            // Demote to HalfOpen.
            record(&breaker, 0, 1);
            tokio::time::advance(WINDOW * 2).await;
            prop_assert!(!breaker.allow());
            prop_assert_eq!(breaker.state(), BreakerState::HalfOpen);

            record(&breaker, successes, fails);
            tokio::time::advance(WINDOW * 2).await;
            let allowed = breaker.allow();

            let total = successes + fails;
            let healthy = total == 0 || f64::from(fails) / f64::from(total) < half_open_fail_ratio;
            let expected = if healthy { BreakerState::Closed } else { BreakerState::Open };
            prop_assert_eq!(breaker.state(), expected);
            prop_assert_eq!(allowed, healthy);
            Ok(())
        })?;
    }

    /// Property: the first call after Open is always a probe, whatever the allow ratio
    #[test]
    fn first_probe_after_open_is_allowed(half_open_allow_ratio in 0.0f64..=1.0) {
        paused_runtime().block_on(async {
            let breaker = Breaker::builder()
                .resolution(WINDOW)
                .half_open_allow_ratio(half_open_allow_ratio)
                .build()
                .unwrap();

            record(&breaker, 0, 3);
            tokio::time::advance(WINDOW * 2).await;
            prop_assert!(!breaker.allow());
            prop_assert_eq!(breaker.state(), BreakerState::Open);

            tokio::time::advance(WINDOW * 2).await;
            prop_assert!(breaker.allow());
            prop_assert_eq!(breaker.state(), BreakerState::HalfOpen);
            breaker.done(true);
            Ok(())
        })?;
    }
}
