//! A breaker guarding each hedged attempt.

use hedgeguard_breaker::{Breaker, BreakerError, BreakerLayer, BreakerState};
use hedgeguard_core::CancelScope;
use hedgeguard_hedge::{worker_fn, Hedger};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[tokio::test(start_paused = true)]
async fn open_breaker_fails_every_attempt_fast() {
    let breaker = Breaker::builder()
        .resolution(Duration::from_millis(100))
        .build()
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let service = ServiceBuilder::new()
        .layer(
            Hedger::builder()
                .timeout(Duration::from_millis(20))
                .upto(3)
                .layer(),
        )
        .layer(BreakerLayer::new(breaker.clone()))
        .service(service_fn(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("backend down") }
        }));

    // Three real failures trip the breaker at the next window.
    let err = service.clone().oneshot(()).await.unwrap_err();
    assert_eq!(err.attempt_errors().map(<[_]>::len), Some(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    tokio::time::advance(Duration::from_millis(101)).await;
    let err = service.oneshot(()).await.unwrap_err();
    let errors = err.attempt_errors().unwrap();
    assert!(errors.iter().all(BreakerError::is_open));
    assert_eq!(errors.len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(breaker.state(), BreakerState::Open);
}

#[tokio::test(start_paused = true)]
async fn closure_worker_can_consult_the_breaker() {
    let breaker = Breaker::builder().build().unwrap();
    let guard = breaker.clone();
    let hedger = Hedger::builder()
        .timeout(Duration::from_millis(10))
        .upto(2)
        .worker(worker_fn(move |_: CancelScope, key: &'static str| {
            let breaker = guard.clone();
            async move {
                breaker
                    .call(async move { Ok::<_, std::io::Error>(key.len()) })
                    .await
            }
        }))
        .build();

    let len = hedger.execute(&CancelScope::new(), "abcd").await.unwrap();
    assert_eq!(len, 4);
    assert_eq!(breaker.counts(), (1, 0));
}
