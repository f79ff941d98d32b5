//! Window roll-over behavior.

use super::{breaker, next_window, record, WINDOW};
use hedgeguard_breaker::{Breaker, BreakerError, BreakerState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn healthy_window_stays_closed() {
    let breaker = breaker(false);
    record(&breaker, 3, 1);

    next_window().await;
    assert!(breaker.allow());
    breaker.done(true);
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn failing_window_opens_then_recovers() {
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&transitions);
    let breaker = Breaker::builder()
        .resolution(WINDOW)
        .fail_ratio(0.5)
        .half_open_allow_ratio(1.0)
        .on_state_transition(move |from, to| seen.lock().unwrap().push((from, to)))
        .build()
        .unwrap();

    record(&breaker, 1, 3);
    next_window().await;

    // The call that closes the window is judged by the new state.
    assert!(!breaker.allow());
    assert_eq!(breaker.state(), BreakerState::Open);
    assert!(!breaker.allow());

    next_window().await;
    assert!(breaker.allow(), "first probe after Open must be allowed");
    assert_eq!(breaker.state(), BreakerState::HalfOpen);
    breaker.done(true);

    next_window().await;
    assert!(breaker.allow());
    breaker.done(true);
    assert_eq!(breaker.state(), BreakerState::Closed);

    assert_eq!(
        *transitions.lock().unwrap(),
        [
            (BreakerState::Closed, BreakerState::Open),
            (BreakerState::Open, BreakerState::HalfOpen),
            (BreakerState::HalfOpen, BreakerState::Closed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failing_probe_reopens() {
    let breaker = breaker(false);
    record(&breaker, 0, 2);
    next_window().await;
    assert!(!breaker.allow());

    next_window().await;
    assert!(breaker.allow());
    breaker.done(false);

    next_window().await;
    assert!(!breaker.allow());
    assert_eq!(breaker.state(), BreakerState::Open);
}

#[tokio::test(start_paused = true)]
async fn first_probe_ignores_allow_ratio() {
    let breaker = Breaker::builder()
        .resolution(WINDOW)
        .half_open_allow_ratio(0.0)
        .build()
        .unwrap();
    record(&breaker, 0, 1);
    next_window().await;
    assert!(!breaker.allow());

    next_window().await;
    assert!(breaker.allow());
    breaker.done(true);
    assert_eq!(breaker.state(), BreakerState::HalfOpen);

    // Within the HalfOpen window the ratio applies again.
    for _ in 0..20 {
        assert!(!breaker.allow());
    }
}

#[tokio::test(start_paused = true)]
async fn flexible_demotion_has_no_free_probe() {
    let breaker = Breaker::builder()
        .resolution(WINDOW)
        .half_open_allow_ratio(0.0)
        .flexible(true)
        .build()
        .unwrap();
    record(&breaker, 0, 3);

    next_window().await;
    assert!(!breaker.allow(), "demotion from Closed grants no probe");
    assert_eq!(breaker.state(), BreakerState::HalfOpen);
    assert!(!breaker.allow());

    // Nothing was observed in the HalfOpen window, so it closes.
    next_window().await;
    assert!(breaker.allow());
    breaker.done(true);
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn flexible_healthy_half_open_closes() {
    let breaker = breaker(true);
    record(&breaker, 0, 2);
    next_window().await;
    assert!(!breaker.allow());
    assert_eq!(breaker.state(), BreakerState::HalfOpen);

    record(&breaker, 4, 1);
    next_window().await;
    assert!(breaker.allow());
    breaker.done(true);
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn empty_short_window_closes() {
    let breaker = Breaker::builder()
        .resolution(Duration::from_millis(10))
        .build()
        .unwrap();

    tokio::time::advance(Duration::from_millis(11)).await;
    assert!(breaker.allow());
    breaker.done(true);
    assert_eq!(breaker.state(), BreakerState::Closed);
    assert_eq!(breaker.counts(), (1, 0));
}

#[tokio::test(start_paused = true)]
async fn counters_reset_each_window() {
    let breaker = breaker(false);
    record(&breaker, 2, 1);
    assert_eq!(breaker.counts(), (2, 1));

    next_window().await;
    assert!(breaker.allow());
    assert_eq!(breaker.counts(), (0, 0));
    breaker.done(false);
    assert_eq!(breaker.counts(), (0, 1));
}

#[tokio::test(start_paused = true)]
async fn call_records_the_real_outcome() {
    let breaker = breaker(false);

    let ok: Result<u8, BreakerError<&str>> = breaker.call(async { Ok(1) }).await;
    assert_eq!(ok.unwrap(), 1);
    let err = breaker.call(async { Err::<u8, _>("nope") }).await.unwrap_err();
    assert_eq!(err.into_inner(), Some("nope"));
    let sync = breaker.call_sync(|| Err::<(), _>("again"));
    assert!(!sync.unwrap_err().is_open());

    assert_eq!(breaker.counts(), (1, 2));

    next_window().await;
    let rejected = breaker.call_sync(|| Ok::<_, ()>(()));
    assert!(rejected.unwrap_err().is_open());
}

#[tokio::test(start_paused = true)]
async fn dropped_permit_counts_as_failure() {
    let breaker = breaker(false);
    {
        let _permit = breaker.permit().unwrap();
    }
    let permit = breaker.permit().unwrap();
    permit.record(true);
    assert_eq!(breaker.counts(), (1, 1));
}
