//! The pool as tower middleware.

use hedgeguard_pool::{PoolError, PoolLayer, WorkerPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn layered_calls_share_the_worker_cap() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (r, p) = (Arc::clone(&running), Arc::clone(&peak));

    let service = ServiceBuilder::new()
        .layer(PoolLayer::new(WorkerPool::new(2, Duration::from_secs(1))))
        .service(service_fn(move |n: u32| {
            let running = Arc::clone(&r);
            let peak = Arc::clone(&p);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(n * 2)
            }
        }));

    let calls = (0..12).map(|n| service.clone().oneshot(n));
    let responses = futures::future::join_all(calls).await;

    let mut values: Vec<u32> = responses.into_iter().map(Result::unwrap).collect();
    values.sort_unstable();
    assert_eq!(values, (0..12).map(|n| n * 2).collect::<Vec<_>>());
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn service_errors_are_wrapped() {
    let service = ServiceBuilder::new()
        .layer(PoolLayer::with_defaults())
        .service(service_fn(|_: ()| async { Err::<(), _>("refused") }));

    match service.oneshot(()).await {
        Err(PoolError::Service(e)) => assert_eq!(e, "refused"),
        other => panic!("unexpected result: {other:?}"),
    }
}
