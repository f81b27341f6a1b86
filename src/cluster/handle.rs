use std::sync::Arc;

use nanoid::nanoid;
use tracing::debug;
use tracing::warn;

use super::BackendResult;
use super::BulkItemFailure;
use super::ClusterBackend;
use super::HealthReport;
use super::NodeMeta;
use super::PendingTask;
use super::Scope;
use super::Settings;
use super::ShardFailure;
use super::StateSnapshot;
use super::TemplateSpec;
use super::WriteOp;
use super::WriteOutcome;

/// Thin façade over one provisioned cluster.
///
/// Holds the cluster's identity (scope, seed), its ordered node list and
/// the settings it was built with, and delegates every operation to the
/// [`ClusterBackend`]. Created and destroyed exclusively by the registry;
/// every other component shares it read-only.
#[derive(Clone)]
pub struct ClusterHandle {
    id: String,
    suite: String,
    scope: Scope,
    seed: u64,
    nodes: Vec<NodeMeta>,
    settings: Settings,
    backend: Arc<dyn ClusterBackend>,
}

impl ClusterHandle {
    pub fn new(
        suite: impl Into<String>,
        scope: Scope,
        seed: u64,
        nodes: Vec<NodeMeta>,
        settings: Settings,
        backend: Arc<dyn ClusterBackend>,
    ) -> Self {
        Self {
            id: nanoid!(10),
            suite: suite.into(),
            scope,
            seed,
            nodes,
            settings,
            backend,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn nodes(&self) -> &[NodeMeta] {
        &self.nodes
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Cheap liveness probe used by the registry before reusing a cached
    /// suite-scoped handle.
    pub async fn is_alive(&self) -> bool {
        self.backend.health(&[]).await.is_ok()
    }

    // -
    // Administrative delegation

    pub async fn create_index(
        &self,
        index: &str,
        settings: &Settings,
    ) -> BackendResult<()> {
        self.backend.create_index(index, settings).await
    }

    pub async fn delete_index(
        &self,
        index: &str,
    ) -> BackendResult<()> {
        self.backend.delete_index(index).await
    }

    pub async fn update_settings(
        &self,
        index: &str,
        settings: &Settings,
    ) -> BackendResult<()> {
        self.backend.update_settings(index, settings).await
    }

    pub async fn put_template(
        &self,
        template: &TemplateSpec,
    ) -> BackendResult<()> {
        self.backend.put_template(template).await
    }

    pub async fn delete_template(
        &self,
        name: &str,
    ) -> BackendResult<()> {
        self.backend.delete_template(name).await
    }

    pub async fn list_indices(&self) -> BackendResult<Vec<String>> {
        self.backend.list_indices().await
    }

    pub async fn list_templates(&self) -> BackendResult<Vec<String>> {
        self.backend.list_templates().await
    }

    // -
    // Data path delegation

    pub async fn write(
        &self,
        op: &WriteOp,
    ) -> BackendResult<WriteOutcome> {
        self.backend.write(op).await
    }

    pub async fn bulk_write(
        &self,
        ops: &[WriteOp],
    ) -> BackendResult<Vec<std::result::Result<WriteOutcome, BulkItemFailure>>> {
        self.backend.bulk_write(ops).await
    }

    pub async fn delete(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        routing: Option<&str>,
    ) -> BackendResult<WriteOutcome> {
        self.backend.delete(index, doc_type, id, routing).await
    }

    pub async fn refresh(
        &self,
        indices: &[String],
    ) -> BackendResult<Vec<ShardFailure>> {
        self.backend.refresh(indices).await
    }

    pub async fn flush(
        &self,
        indices: &[String],
        durable: bool,
    ) -> BackendResult<Vec<ShardFailure>> {
        self.backend.flush(indices, durable).await
    }

    pub async fn force_merge(
        &self,
        indices: &[String],
        max_segments: u32,
    ) -> BackendResult<Vec<ShardFailure>> {
        self.backend.force_merge(indices, max_segments).await
    }

    pub async fn count(
        &self,
        indices: &[String],
    ) -> BackendResult<u64> {
        self.backend.count(indices).await
    }

    // -
    // Observation delegation

    pub async fn health(
        &self,
        indices: &[String],
    ) -> BackendResult<HealthReport> {
        self.backend.health(indices).await
    }

    pub async fn state(
        &self,
        via_node: Option<&str>,
        local: bool,
    ) -> BackendResult<StateSnapshot> {
        self.backend.state(via_node, local).await
    }

    pub async fn pending_tasks(&self) -> BackendResult<Vec<PendingTask>> {
        self.backend.pending_tasks().await
    }

    // -
    // Lifecycle

    /// Delete every index and every non-excluded template, leaving the
    /// cluster empty but running.
    pub async fn wipe(
        &self,
        exclude_templates: &[String],
    ) -> BackendResult<()> {
        for index in self.backend.list_indices().await? {
            match self.backend.delete_index(&index).await {
                Ok(()) => debug!("wiped index {index}"),
                // another wipe may have raced us
                Err(crate::BackendError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        for template in self.backend.list_templates().await? {
            if exclude_templates.contains(&template) {
                continue;
            }
            match self.backend.delete_template(&template).await {
                Ok(()) => debug!("wiped template {template}"),
                Err(crate::BackendError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub async fn close(&self) -> BackendResult<()> {
        debug!("closing cluster {} (suite {})", self.id, self.suite);
        let result = self.backend.close().await;
        if let Err(ref e) = result {
            warn!("cluster {} close reported: {e}", self.id);
        }
        result
    }
}

impl std::fmt::Debug for ClusterHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ClusterHandle")
            .field("id", &self.id)
            .field("suite", &self.suite)
            .field("scope", &self.scope)
            .field("seed", &self.seed)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
