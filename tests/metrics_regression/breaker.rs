//! Breaker metrics regression tests

use super::helpers::*;
use hedgeguard_breaker::Breaker;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn breaker_metrics_exist() {
    init_recorder();

    let breaker = Breaker::builder()
        .name("test_breaker")
        .resolution(Duration::from_millis(20))
        .build()
        .unwrap();

    for ok in [true, false, false, false] {
        if breaker.allow() {
            breaker.done(ok);
        }
    }
    tokio::time::sleep(Duration::from_millis(30)).await;
    // Rolls the window: mostly failures, so this trips the breaker.
    assert!(!breaker.allow());

    assert_counter_exists("breaker_calls_total");
    assert_metric_has_label("breaker_calls_total", "breaker", "test_breaker");
    assert_metric_has_label("breaker_calls_total", "outcome", "permitted");
    assert_metric_has_label("breaker_calls_total", "outcome", "rejected");

    assert_counter_exists("breaker_outcomes_total");
    assert_metric_has_label("breaker_outcomes_total", "outcome", "success");
    assert_metric_has_label("breaker_outcomes_total", "outcome", "failure");

    assert_counter_exists("breaker_transitions_total");
    assert_metric_has_label("breaker_transitions_total", "from", "closed");
    assert_metric_has_label("breaker_transitions_total", "to", "open");

    assert_gauge_exists("breaker_state");
    assert_metric_has_label("breaker_state", "breaker", "test_breaker");
}
