//! Pool stress tests

use hedgeguard_pool::WorkerPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::ConcurrencyTracker;

/// Test: 200k short tasks reuse a handful of workers
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_many_short_tasks() {
    let pool = WorkerPool::builder()
        .name("stress")
        .max_workers(8)
        .lifetime(Duration::from_secs(5))
        .build();

    let done = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    for _ in 0..200_000 {
        let done = Arc::clone(&done);
        pool.submit(async move {
            done.fetch_add(1, Ordering::Relaxed);
        })
        .await;
    }

    while done.load(Ordering::Relaxed) < 200_000 {
        sleep(Duration::from_millis(1)).await;
    }

    let elapsed = start.elapsed();
    println!("200k tasks completed in {:?}", elapsed);
    println!(
        "Throughput: {:.0} tasks/sec",
        200_000.0 / elapsed.as_secs_f64()
    );
    assert!(pool.active_workers() <= 8);
}

/// Test: Concurrency never exceeds max_workers under contention
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_cap_holds_under_contention() {
    let pool = WorkerPool::new(16, Duration::from_secs(1));
    let tracker = ConcurrencyTracker::new();
    let completed = Arc::new(AtomicUsize::new(0));

    let mut submitters = Vec::new();
    for _ in 0..32 {
        let pool = pool.clone();
        let tracker = Arc::clone(&tracker);
        let completed = Arc::clone(&completed);
        submitters.push(tokio::spawn(async move {
            for _ in 0..200 {
                let tracker = Arc::clone(&tracker);
                let completed = Arc::clone(&completed);
                pool.submit(async move {
                    tracker.enter();
                    sleep(Duration::from_micros(200)).await;
                    tracker.exit();
                    completed.fetch_add(1, Ordering::Relaxed);
                })
                .await;
            }
        }));
    }

    for submitter in submitters {
        submitter.await.unwrap();
    }
    while completed.load(Ordering::Relaxed) < 32 * 200 {
        sleep(Duration::from_millis(1)).await;
    }

    println!("Peak concurrency: {}", tracker.peak());
    assert!(tracker.peak() <= 16);
    assert_eq!(tracker.current(), 0);
}

/// Test: Every worker retires once the load stops
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_workers_retire_after_burst() {
    let pool = WorkerPool::new(64, Duration::from_millis(50));

    for _ in 0..10 {
        for _ in 0..64 {
            pool.submit(sleep(Duration::from_millis(5))).await;
        }
        sleep(Duration::from_millis(10)).await;
    }

    sleep(Duration::from_millis(300)).await;
    println!("Workers left after idle period: {}", pool.active_workers());
    assert_eq!(pool.active_workers(), 0);
}
