//! The breaker as tower middleware.

use super::{next_window, WINDOW};
use hedgeguard_breaker::{Breaker, BreakerLayer, BreakerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::{service_fn, Layer, Service, ServiceExt};

#[tokio::test(start_paused = true)]
async fn open_breaker_short_circuits_the_service() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let breaker = Breaker::builder().resolution(WINDOW).build().unwrap();
    let layer = BreakerLayer::new(breaker.clone());

    let mut service = layer.layer(service_fn(move |_: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>("unavailable") }
    }));

    for _ in 0..4 {
        let err = service.ready().await.unwrap().call(()).await.unwrap_err();
        assert!(!err.is_open());
    }
    next_window().await;

    for _ in 0..4 {
        let err = service.ready().await.unwrap().call(()).await.unwrap_err();
        assert!(err.is_open());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(breaker.state(), BreakerState::Open);
}

#[tokio::test(start_paused = true)]
async fn classifier_decides_what_counts() {
    let breaker = Breaker::builder().resolution(WINDOW).build().unwrap();
    let layer = BreakerLayer::new(breaker.clone())
        .failure_classifier(|result: &Result<u16, ()>| !matches!(result, Ok(200..=499)));

    let service = layer.layer(service_fn(|code: u16| async move { Ok::<_, ()>(code) }));
    for code in [200, 404, 503, 500, 201] {
        let _ = service.clone().oneshot(code).await;
    }
    assert_eq!(breaker.counts(), (3, 2));
}
