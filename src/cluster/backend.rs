use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::BulkItemFailure;
use super::HealthReport;
use super::PendingTask;
use super::Settings;
use super::ShardFailure;
use super::StateSnapshot;
use super::TemplateSpec;
use super::WriteOp;
use super::WriteOutcome;
use crate::BackendError;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// The narrow contract the harness consumes from the store.
///
/// Everything behind this trait (engine, transport, allocation) is an
/// external collaborator; the harness only observes it. Administrative
/// operations report acknowledgment by returning `Ok(())` and signal a
/// nack through [`BackendError::NotAcknowledged`].
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    async fn create_index(
        &self,
        index: &str,
        settings: &Settings,
    ) -> BackendResult<()>;

    async fn delete_index(
        &self,
        index: &str,
    ) -> BackendResult<()>;

    async fn update_settings(
        &self,
        index: &str,
        settings: &Settings,
    ) -> BackendResult<()>;

    async fn put_template(
        &self,
        template: &TemplateSpec,
    ) -> BackendResult<()>;

    async fn delete_template(
        &self,
        name: &str,
    ) -> BackendResult<()>;

    async fn list_indices(&self) -> BackendResult<Vec<String>>;

    async fn list_templates(&self) -> BackendResult<Vec<String>>;

    /// Apply one write to the store's write path. Success means durably
    /// applied, not necessarily visible to search.
    async fn write(
        &self,
        op: &WriteOp,
    ) -> BackendResult<WriteOutcome>;

    /// Submit many writes as one request; per-item results in input order.
    async fn bulk_write(
        &self,
        ops: &[WriteOp],
    ) -> BackendResult<Vec<std::result::Result<WriteOutcome, BulkItemFailure>>>;

    async fn delete<'a>(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        routing: Option<&'a str>,
    ) -> BackendResult<WriteOutcome>;

    /// Make pending writes visible to search; returns per-shard failures.
    async fn refresh(
        &self,
        indices: &[String],
    ) -> BackendResult<Vec<ShardFailure>>;

    async fn flush(
        &self,
        indices: &[String],
        durable: bool,
    ) -> BackendResult<Vec<ShardFailure>>;

    async fn force_merge(
        &self,
        indices: &[String],
        max_segments: u32,
    ) -> BackendResult<Vec<ShardFailure>>;

    /// Instantaneous aggregated health for the given indices (all when
    /// empty). The harness-side gate does the waiting.
    async fn health(
        &self,
        indices: &[String],
    ) -> BackendResult<HealthReport>;

    /// Full cluster state. `via_node = None` asks the default node;
    /// `local = true` returns the node's locally-held state instead of the
    /// master's view.
    async fn state<'a>(
        &self,
        via_node: Option<&'a str>,
        local: bool,
    ) -> BackendResult<StateSnapshot>;

    async fn pending_tasks(&self) -> BackendResult<Vec<PendingTask>>;

    /// Count of search-visible documents across the given indices (all when
    /// empty).
    async fn count(
        &self,
        indices: &[String],
    ) -> BackendResult<u64>;

    /// Shut the cluster down and release its resources.
    async fn close(&self) -> BackendResult<()>;
}
