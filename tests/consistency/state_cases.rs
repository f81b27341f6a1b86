use shardbed::sim::Divergence;
use shardbed::ConsistencyError;
use shardbed::Error;
use shardbed::WorkloadOptions;

use crate::commons::batch;
use crate::commons::fixed_nodes_config;
use crate::commons::sim_harness;

/// A freshly wiped and rebuilt quiet cluster reports no mismatch.
#[tokio::test]
async fn test_quiet_cluster_is_consistent() {
    crate::enable_logger();
    let (harness, _provisioner) = sim_harness(fixed_nodes_config(3));
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    harness.check_consistency().await.unwrap();

    // still consistent after a workload has settled
    harness
        .run_workload(
            &batch("docs", 30),
            &WorkloadOptions {
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    harness.check_consistency().await.unwrap();
}

/// A node serving tampered content at the master's version is flagged,
/// with both states dumped for diagnosis.
#[tokio::test]
async fn test_same_version_divergence_is_flagged() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(fixed_nodes_config(3));
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().diverge_node("node_1", Divergence::TamperedContent);

    let err = harness.check_consistency().await.unwrap_err();
    match err {
        Error::Consistency(ConsistencyError::Divergence {
            node,
            master_state,
            local_state,
            ..
        }) => {
            assert_eq!(node, "node_1");
            assert!(!master_state.is_empty());
            assert!(!local_state.is_empty());
        }
        other => panic!("expected Divergence, got {other:?}"),
    }
}

/// A node lagging at an older state version is an expected transient, not
/// a bug.
#[tokio::test]
async fn test_stale_version_is_skipped() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(fixed_nodes_config(3));
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().diverge_node("node_2", Divergence::StaleVersion);

    harness.check_consistency().await.unwrap();
}

/// Teardown runs the consistency check before wiping.
#[tokio::test]
async fn test_teardown_surfaces_divergence() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(fixed_nodes_config(3));
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().diverge_node("node_1", Divergence::TamperedContent);

    let err = harness.teardown().await.unwrap_err();
    assert!(matches!(err, Error::Consistency(ConsistencyError::Divergence { .. })));
}
