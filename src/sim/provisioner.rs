use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::SimCluster;
use crate::cluster::ClusterHandle;
use crate::registry::ClusterProvisioner;
use crate::registry::ClusterSpec;
use crate::ProvisioningError;

/// Provisions [`SimCluster`]s. Keeps every built cluster reachable so tests
/// can script faults and inspect counters after acquisition.
#[derive(Default)]
pub struct SimProvisioner {
    provisions: AtomicUsize,
    fail_next: AtomicBool,
    built: Mutex<Vec<Arc<SimCluster>>>,
}

impl SimProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clusters built so far.
    pub fn provisions(&self) -> usize {
        self.provisions.load(Ordering::SeqCst)
    }

    /// The most recently built cluster.
    pub fn last(&self) -> Option<Arc<SimCluster>> {
        self.built.lock().last().cloned()
    }

    /// Every cluster built so far, in build order.
    pub fn built(&self) -> Vec<Arc<SimCluster>> {
        self.built.lock().clone()
    }

    /// The next provision call fails. Exercises fatal provisioning paths.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClusterProvisioner for SimProvisioner {
    async fn provision(
        &self,
        spec: &ClusterSpec,
    ) -> std::result::Result<ClusterHandle, ProvisioningError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProvisioningError::Failed(
                "scripted provisioning failure".to_string(),
            ));
        }
        if spec.total_nodes() == 0 {
            return Err(ProvisioningError::InvalidSpec("zero nodes requested".to_string()));
        }

        let cluster = Arc::new(SimCluster::with_nodes(spec.total_nodes()));
        debug!(
            "sim: provisioned {} node(s) for suite {} (seed {})",
            spec.total_nodes(),
            spec.suite,
            spec.seed
        );
        self.built.lock().push(cluster.clone());
        self.provisions.fetch_add(1, Ordering::SeqCst);

        Ok(ClusterHandle::new(
            spec.suite.clone(),
            spec.scope,
            spec.seed,
            cluster.node_metas().to_vec(),
            spec.settings.clone(),
            cluster,
        ))
    }
}
