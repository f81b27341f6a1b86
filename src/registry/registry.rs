use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ClusterProvisioner;
use super::ClusterSpec;
use crate::cluster::ClusterHandle;
use crate::cluster::Scope;
use crate::config::HarnessConfig;
use crate::Result;
use crate::TeardownError;

/// Maps a test-suite identity to its cached [`ClusterHandle`] and enforces
/// the scope policy.
///
/// Invariant: at most one live handle per suite key. Builds for the same
/// key are single-flight; a concurrent acquire waits for the in-progress
/// build instead of racing it.
pub struct ClusterRegistry {
    config: HarnessConfig,
    provisioner: Arc<dyn ClusterProvisioner>,
    clusters: DashMap<String, Arc<ClusterHandle>>,
    build_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ClusterRegistry {
    pub fn new(
        config: HarnessConfig,
        provisioner: Arc<dyn ClusterProvisioner>,
    ) -> Self {
        Self {
            config,
            provisioner,
            clusters: DashMap::new(),
            build_locks: DashMap::new(),
        }
    }

    /// Return the cluster for `suite`, building one when the scope policy
    /// requires it.
    ///
    /// SUITE: reuse the cached handle while it is still alive. TEST: close
    /// whatever was cached and build fresh.
    pub async fn acquire(
        &self,
        suite: &str,
        scope: Scope,
        seed: u64,
    ) -> Result<Arc<ClusterHandle>> {
        let lock = self
            .build_locks
            .entry(suite.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _single_flight = lock.lock().await;

        match scope {
            Scope::Suite => {
                if let Some(existing) = self.clusters.get(suite).map(|e| e.value().clone()) {
                    if existing.is_alive().await {
                        debug!("reusing suite-scoped cluster {} for {suite}", existing.id());
                        return Ok(existing);
                    }
                    warn!("cached cluster {} for {suite} is dead, rebuilding", existing.id());
                    if let Err(e) = existing.close().await {
                        warn!("closing dead cluster failed: {e}");
                    }
                    self.clusters.remove(suite);
                }
            }
            Scope::Test => {
                if let Some((_, previous)) = self.clusters.remove(suite) {
                    debug!("test scope: closing previous cluster {}", previous.id());
                    if let Err(e) = previous.close().await {
                        warn!("closing previous test-scoped cluster failed: {e}");
                    }
                }
            }
        }

        let spec = ClusterSpec::randomized(&self.config, suite, scope, seed);
        let handle = Arc::new(self.provisioner.provision(&spec).await?);
        info!(
            "built {:?}-scoped cluster {} for {suite} ({} node(s), seed {seed})",
            scope,
            handle.id(),
            handle.nodes().len()
        );
        self.clusters.insert(suite.to_string(), handle.clone());
        Ok(handle)
    }

    /// Close and evict the cluster for `suite`. A no-op when none is
    /// cached.
    pub async fn release(
        &self,
        suite: &str,
    ) -> std::result::Result<(), TeardownError> {
        let mut teardown = TeardownError::default();
        if let Some((_, handle)) = self.clusters.remove(suite) {
            if let Err(e) = handle.close().await {
                teardown.push(format!("close cluster for suite {suite}"), e);
            }
        }
        teardown.into_result()
    }

    /// Close every cached cluster concurrently. Every handle is attempted;
    /// failures are collected and surfaced once at the end.
    pub async fn release_all(&self) -> std::result::Result<(), TeardownError> {
        let mut tasks = FuturesUnordered::new();
        let suites: Vec<String> = self.clusters.iter().map(|e| e.key().clone()).collect();
        for suite in suites {
            if let Some((key, handle)) = self.clusters.remove(&suite) {
                tasks.push(async move { (key, handle.close().await) });
            }
        }

        let mut teardown = TeardownError::default();
        while let Some((suite, result)) = tasks.next().await {
            if let Err(e) = result {
                teardown.push(format!("close cluster for suite {suite}"), e);
            }
        }
        teardown.into_result()
    }

    /// Currently cached handle for `suite`, if any. Does not build.
    pub fn cached(
        &self,
        suite: &str,
    ) -> Option<Arc<ClusterHandle>> {
        self.clusters.get(suite).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
