//! Pool metrics regression tests

use super::helpers::*;
use hedgeguard_pool::WorkerPool;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn pool_metrics_exist() {
    init_recorder();

    let pool = WorkerPool::builder()
        .name("test_pool")
        .max_workers(1)
        .lifetime(Duration::from_millis(20))
        .build();

    let (release, hold) = tokio::sync::oneshot::channel::<()>();
    pool.submit(async move {
        let _ = hold.await;
    })
    .await;

    let blocked = pool.clone();
    let waiter = tokio::spawn(async move { blocked.submit(async {}).await });
    tokio::time::sleep(Duration::from_millis(5)).await;
    release.send(()).unwrap();
    waiter.await.unwrap();

    pool.submit(async { panic!("metrics test panic") }).await;
    // Let the worker go idle and retire.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_counter_exists("pool_workers_spawned_total");
    assert_metric_has_label("pool_workers_spawned_total", "pool", "test_pool");
    assert_counter_exists("pool_tasks_handed_off_total");
    assert_counter_exists("pool_submissions_blocked_total");
    assert_counter_exists("pool_task_panics_total");
    assert_counter_exists("pool_workers_retired_total");
    assert_gauge_exists("pool_active_workers");
}
