//! A breaker judging whole hedged calls.

use hedgeguard_breaker::{Breaker, BreakerLayer};
use hedgeguard_hedge::Hedger;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[tokio::test(start_paused = true)]
async fn one_outcome_per_hedged_call() {
    let breaker = Breaker::builder().build().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let service = ServiceBuilder::new()
        .layer(BreakerLayer::new(breaker.clone()))
        .layer(
            Hedger::builder()
                .timeout(Duration::from_millis(5))
                .upto(2)
                .layer(),
        )
        .service(service_fn(move |_: ()| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                // Every call's first attempt fails, its hedge succeeds.
                if attempt % 2 == 0 {
                    Err("flaky")
                } else {
                    Ok(attempt)
                }
            }
        }));

    for _ in 0..3 {
        service.clone().oneshot(()).await.unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(breaker.counts(), (3, 0));
}
