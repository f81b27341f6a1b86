use std::sync::atomic::Ordering;

use shardbed::Error;
use shardbed::HarnessConfig;
use shardbed::Strategy;
use shardbed::WorkloadError;
use shardbed::WorkloadOptions;

use crate::commons::batch;
use crate::commons::sim_harness;

/// Transient admission rejections are recovered by a single synchronous
/// retry and never reach the caller.
#[tokio::test]
async fn test_transient_rejections_are_recovered_silently() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().reject_next_writes(3);

    let report = harness
        .run_workload(
            &batch("docs", 20),
            &WorkloadOptions {
                forced_strategy: Some(Strategy::Async),
                decoys: false,
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(report.retried_rejections, 3);
    assert_eq!(sim.counters().rejections_served.load(Ordering::SeqCst), 3);

    // every rejected op was re-applied
    let handle = harness.cluster().unwrap();
    assert_eq!(handle.count(&["docs".to_string()]).await.unwrap(), 20);
}

/// Semantic failures are genuine: surfaced with the offending operation.
#[tokio::test]
async fn test_semantic_failures_surface_with_the_op() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().fail_writes_with_id("id_3");

    let err = harness
        .run_workload(
            &batch("docs", 10),
            &WorkloadOptions {
                forced_strategy: Some(Strategy::Sync),
                decoys: false,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        Error::Workload(WorkloadError::WriteFailures { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].op.id, "id_3");
        }
        other => panic!("expected WriteFailures, got {other:?}"),
    }
}

/// A bulk response with item failures is a hard batch failure.
#[tokio::test]
async fn test_bulk_item_failures_are_hard() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().fail_writes_with_id("id_7");

    let err = harness
        .run_workload(
            &batch("docs", 100),
            &WorkloadOptions {
                forced_strategy: Some(Strategy::Bulk),
                decoys: false,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Workload(WorkloadError::BulkFailure { .. })));
}
