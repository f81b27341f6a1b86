use shardbed::HarnessConfig;
use shardbed::WorkloadOptions;

use crate::commons::batch;
use crate::commons::sim_harness;
use crate::commons::DECOY_PREFIX;

/// Decoy documents exercise the deletion path during the workload but are
/// never observable once the call returns.
#[tokio::test]
async fn test_decoys_are_never_observable_after_return() {
    crate::enable_logger();
    let mut injected_total = 0;

    // the injection coin flip depends on the seed; sweep enough seeds to
    // exercise both sides
    for seed in 0..32 {
        let config = HarnessConfig {
            seed,
            ..Default::default()
        };
        let (harness, provisioner) = sim_harness(config);
        harness.acquire_cluster().await.unwrap();
        harness.setup().await.unwrap();

        let report = harness
            .run_workload(
                &batch("docs", 6),
                &WorkloadOptions {
                    force_refresh: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        injected_total += report.decoys_injected;

        let sim = provisioner.last().unwrap();
        assert_eq!(
            sim.visible_docs_with_prefix(DECOY_PREFIX),
            0,
            "decoys visible after run (seed {seed})"
        );

        let handle = harness.cluster().unwrap();
        assert_eq!(
            handle.count(&["docs".to_string()]).await.unwrap(),
            6,
            "non-decoy count off (seed {seed})"
        );
    }

    assert!(injected_total > 0, "no seed out of 32 ever injected decoys");
}

/// Decoy volume scales with the batch: at most twice the batch size.
#[tokio::test]
async fn test_decoy_count_is_bounded_by_batch_size() {
    crate::enable_logger();
    for seed in 0..16 {
        let config = HarnessConfig {
            seed,
            ..Default::default()
        };
        let (harness, _provisioner) = sim_harness(config);
        harness.acquire_cluster().await.unwrap();
        harness.setup().await.unwrap();

        let report = harness
            .run_workload(&batch("docs", 10), &WorkloadOptions::default())
            .await
            .unwrap();
        assert!(
            report.decoys_injected <= 20,
            "{} decoys for a 10-op batch (seed {seed})",
            report.decoys_injected
        );
    }
}
