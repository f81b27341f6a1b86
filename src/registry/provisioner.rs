use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::cluster::ClusterHandle;
use crate::cluster::Scope;
use crate::cluster::Settings;
use crate::config::HarnessConfig;
use crate::ProvisioningError;
use crate::RandomSource;

/// What to build: node counts and cluster-level settings, all derived from
/// the harness seed so a rebuild with the same seed yields the same
/// cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub suite: String,
    pub scope: Scope,
    pub seed: u64,
    pub data_nodes: usize,
    pub dedicated_master_nodes: usize,
    pub client_nodes: usize,
    pub settings: Settings,
}

impl ClusterSpec {
    /// Draw a spec from the deterministic random stream for `seed`.
    pub fn randomized(
        config: &HarnessConfig,
        suite: &str,
        scope: Scope,
        seed: u64,
    ) -> Self {
        let mut rng = RandomSource::from_seed(seed);

        let data_nodes = rng.between(config.min_data_nodes, config.max_data_nodes);
        let dedicated_master_nodes = if config.supports_dedicated_masters && rng.frequently() {
            3
        } else {
            0
        };

        let mut settings = Settings::new();
        if rng.bool() {
            settings.insert(
                "cluster.routing.allocation.node_concurrent_recoveries".to_string(),
                rng.between(2, 8).to_string(),
            );
        }
        if rng.rarely() {
            settings.insert(
                "cluster.info.update.interval_ms".to_string(),
                rng.between(500, 5000).to_string(),
            );
        }

        Self {
            suite: suite.to_string(),
            scope,
            seed,
            data_nodes,
            dedicated_master_nodes,
            client_nodes: config.num_client_nodes,
            settings,
        }
    }

    pub fn total_nodes(&self) -> usize {
        self.data_nodes + self.dedicated_master_nodes + self.client_nodes
    }
}

/// Builds real clusters. The only component allowed to create a
/// [`ClusterHandle`]; the registry owns every handle a provisioner returns.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ClusterProvisioner: Send + Sync {
    async fn provision(
        &self,
        spec: &ClusterSpec,
    ) -> std::result::Result<ClusterHandle, ProvisioningError>;
}
