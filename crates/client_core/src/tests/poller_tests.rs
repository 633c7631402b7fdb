use super::*;
use crate::{
    reconciler::ReconcilerConfig,
    test_support::{reconciler_with, stats, test_config, ScriptedBackend, StatsStep},
};
use shared::domain::DishId;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_on_interval_until_stopped() {
    let backend = ScriptedBackend::new();
    backend.push_stats(StatsStep::Reply(Ok(stats(&[("Torresmo", 2)]))));
    let reconciler = reconciler_with(&backend, test_config());

    let poller = spawn_poller(reconciler.clone());
    sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.stats_calls(), 1);
    assert_eq!(
        reconciler
            .item(DishId(2))
            .await
            .expect("torresmo")
            .confirmed_count(),
        2
    );

    sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.stats_calls(), 2);

    poller.shutdown().await;
    assert!(!reconciler.is_active());
    sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.stats_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_poll_is_never_overlapped() {
    let backend = ScriptedBackend::new();
    backend.push_stats(StatsStep::Hang);
    let reconciler = reconciler_with(
        &backend,
        ReconcilerConfig {
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(25),
            ..ReconcilerConfig::default()
        },
    );

    let poller = spawn_poller(reconciler);
    sleep(Duration::from_secs(20)).await;
    assert_eq!(backend.stats_calls(), 1);

    // The hung poll times out at 25s; the skipped tick fires right after it
    // and the next aligned tick at 30s.
    sleep(Duration::from_secs(11)).await;
    assert_eq!(backend.stats_calls(), 3);
    assert_eq!(backend.max_stats_in_flight(), 1);
    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_raised_to_minimum() {
    let backend = ScriptedBackend::new();
    let reconciler = reconciler_with(
        &backend,
        ReconcilerConfig {
            poll_interval: Duration::ZERO,
            ..test_config()
        },
    );

    let poller = spawn_poller(reconciler.clone());
    sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.stats_calls(), 1);
    assert!(!poller.is_finished());

    sleep(MIN_POLL_INTERVAL).await;
    assert_eq!(backend.stats_calls(), 2);
    assert!(!poller.is_finished());
    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn poller_exits_once_reconciler_shuts_down() {
    let backend = ScriptedBackend::new();
    let reconciler = reconciler_with(&backend, test_config());

    let poller = spawn_poller(reconciler.clone());
    sleep(Duration::from_millis(1)).await;
    reconciler.shutdown().await;
    sleep(Duration::from_secs(10)).await;
    assert!(poller.is_finished());
    assert_eq!(backend.stats_calls(), 1);
}
