use std::sync::atomic::Ordering;

use shardbed::HarnessConfig;
use shardbed::Strategy;
use shardbed::WorkloadOptions;

use crate::commons::batch;
use crate::commons::sim_harness;

/// Forced one-by-one/sync on a 10-op batch: exactly 10 single writes, no
/// bulk calls, no decoys.
#[tokio::test]
async fn test_forced_sync_scenario_counts() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let report = harness
        .run_workload(
            &batch("docs", 10),
            &WorkloadOptions {
                forced_strategy: Some(Strategy::Sync),
                decoys: false,
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let sim = provisioner.last().unwrap();
    assert_eq!(report.single_writes, 10);
    assert_eq!(sim.counters().writes.load(Ordering::SeqCst), 10);
    assert_eq!(sim.counters().bulk_calls.load(Ordering::SeqCst), 0);
    assert_eq!(sim.counters().deletes.load(Ordering::SeqCst), 0);
    assert_eq!(report.decoys_injected, 0);

    let handle = harness.cluster().unwrap();
    assert_eq!(handle.count(&["docs".to_string()]).await.unwrap(), 10);
}

/// A 5000-op batch always goes bulk, and the chunks cover the whole batch.
#[tokio::test]
async fn test_large_batch_is_always_bulk() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let report = harness
        .run_workload(
            &batch("docs", 5000),
            &WorkloadOptions {
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(report.strategy, Strategy::Bulk);
    assert!(report.bulk_requests >= 5, "5000 docs in {} request(s)", report.bulk_requests);

    // chunks summed to the batch plus decoys; decoys are gone again
    let sim = provisioner.last().unwrap();
    assert!(sim.counters().bulk_calls.load(Ordering::SeqCst) >= 5);
    let handle = harness.cluster().unwrap();
    assert_eq!(handle.count(&["docs".to_string()]).await.unwrap(), 5000);
}

/// The post-refresh count equals the non-decoy op count, whatever the
/// strategy.
#[tokio::test]
async fn test_count_is_strategy_independent() {
    crate::enable_logger();
    for strategy in [Strategy::Sync, Strategy::Async, Strategy::Bulk] {
        let (harness, _provisioner) = sim_harness(HarnessConfig::default());
        harness.acquire_cluster().await.unwrap();
        harness.setup().await.unwrap();

        harness
            .run_workload(
                &batch("docs", 50),
                &WorkloadOptions {
                    forced_strategy: Some(strategy),
                    force_refresh: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let handle = harness.cluster().unwrap();
        assert_eq!(
            handle.count(&["docs".to_string()]).await.unwrap(),
            50,
            "count mismatch for {strategy}"
        );
    }
}

/// Multi-index batches land in every target index.
#[tokio::test]
async fn test_multi_index_batch() {
    crate::enable_logger();
    let (harness, _provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let mut ops = batch("alpha", 20);
    ops.extend(batch("beta", 30).ops().to_vec());

    harness
        .run_workload(
            &ops,
            &WorkloadOptions {
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let handle = harness.cluster().unwrap();
    assert_eq!(handle.count(&["alpha".to_string()]).await.unwrap(), 20);
    assert_eq!(handle.count(&["beta".to_string()]).await.unwrap(), 30);
    assert_eq!(handle.count(&[]).await.unwrap(), 50);
}
