use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::Divergence;
use super::FaultPlan;
use crate::cluster::BackendResult;
use crate::cluster::BulkItemFailure;
use crate::cluster::ClusterBackend;
use crate::cluster::HealthReport;
use crate::cluster::HealthStatus;
use crate::cluster::IndexMeta;
use crate::cluster::NodeMeta;
use crate::cluster::PendingTask;
use crate::cluster::Settings;
use crate::cluster::ShardFailure;
use crate::cluster::ShardRouting;
use crate::cluster::ShardState;
use crate::cluster::StateSnapshot;
use crate::cluster::TemplateSpec;
use crate::cluster::WriteOp;
use crate::cluster::WriteOutcome;
use crate::BackendError;

/// Call counters exposed for assertions.
#[derive(Debug, Default)]
pub struct SimCounters {
    pub writes: AtomicUsize,
    pub bulk_calls: AtomicUsize,
    pub deletes: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub flushes: AtomicUsize,
    pub force_merges: AtomicUsize,
    pub rejections_served: AtomicUsize,
}

#[derive(Debug, Clone)]
struct SimDoc {
    #[allow(dead_code)]
    payload: Vec<u8>,
    #[allow(dead_code)]
    routing: Option<String>,
}

#[derive(Debug)]
struct SimIndex {
    meta: IndexMeta,
    /// Durably applied documents.
    docs: HashMap<String, SimDoc>,
    /// Subset of `docs` visible to search; refresh promotes the rest.
    visible: HashSet<String>,
}

/// An in-memory stand-in for a real store cluster.
///
/// Implements the full [`ClusterBackend`] contract over process-local maps,
/// with a [`FaultPlan`] for scripted misbehavior. Lets the harness's own
/// test suite (and downstream users) drive every code path without a live
/// engine.
pub struct SimCluster {
    nodes: Vec<NodeMeta>,
    indices: DashMap<String, SimIndex>,
    templates: DashMap<String, TemplateSpec>,
    cluster_settings: Mutex<Settings>,
    faults: FaultPlan,
    counters: SimCounters,
    version: AtomicU64,
    closed: AtomicBool,
}

impl SimCluster {
    pub fn with_nodes(count: usize) -> Self {
        let nodes = (0..count)
            .map(|i| NodeMeta {
                id: format!("node_{i}"),
                name: format!("n{i}"),
                address: format!("127.0.0.1:{}", 9300 + i),
                data: true,
                // first node doubles as master unless dedicated masters are
                // modeled by the caller
                master_eligible: i == 0,
            })
            .collect();
        Self::with_node_metas(nodes)
    }

    pub fn with_node_metas(nodes: Vec<NodeMeta>) -> Self {
        Self {
            nodes,
            indices: DashMap::new(),
            templates: DashMap::new(),
            cluster_settings: Mutex::new(Settings::new()),
            faults: FaultPlan::default(),
            counters: SimCounters::default(),
            version: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    pub fn counters(&self) -> &SimCounters {
        &self.counters
    }

    pub fn node_metas(&self) -> &[NodeMeta] {
        &self.nodes
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Simulate a test leaving persistent cluster settings behind.
    pub fn set_cluster_settings(
        &self,
        settings: Settings,
    ) {
        *self.cluster_settings.lock() = settings;
        self.bump_version();
    }

    /// Search-visible hits for ids with the given prefix, across all
    /// indices.
    pub fn visible_docs_with_prefix(
        &self,
        prefix: &str,
    ) -> usize {
        self.indices
            .iter()
            .map(|e| e.value().visible.iter().filter(|id| id.starts_with(prefix)).count())
            .sum()
    }

    fn bump_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_open(&self) -> BackendResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("cluster is closed".to_string()));
        }
        Ok(())
    }

    /// Settings for a new index: matching templates in ascending order,
    /// then explicit settings on top.
    fn effective_settings(
        &self,
        index: &str,
        explicit: &Settings,
    ) -> Settings {
        let mut templates: Vec<TemplateSpec> = self
            .templates
            .iter()
            .filter(|e| e.value().matches(index))
            .map(|e| e.value().clone())
            .collect();
        templates.sort_by_key(|t| t.order);

        let mut settings = Settings::new();
        for template in templates {
            settings.extend(template.settings);
        }
        settings.extend(explicit.clone());
        settings
    }

    fn ensure_index(
        &self,
        index: &str,
        explicit: &Settings,
    ) {
        if self.indices.contains_key(index) {
            return;
        }
        let settings = self.effective_settings(index, explicit);
        let shards = settings
            .get("index.number_of_shards")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let replicas = settings
            .get("index.number_of_replicas")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        debug!("sim: auto-creating index {index} ({shards} shard(s), {replicas} replica(s))");
        self.indices.insert(
            index.to_string(),
            SimIndex {
                meta: IndexMeta {
                    name: index.to_string(),
                    shards,
                    replicas,
                    settings,
                },
                docs: HashMap::new(),
                visible: HashSet::new(),
            },
        );
        self.bump_version();
    }

    fn apply_write(
        &self,
        op: &WriteOp,
    ) -> BackendResult<WriteOutcome> {
        if self.faults.write_should_fail(&op.id) {
            return Err(BackendError::Semantic(format!(
                "scripted failure for doc [{}]",
                op.id
            )));
        }
        self.ensure_index(&op.index, &Settings::new());
        let mut index = self
            .indices
            .get_mut(&op.index)
            .unwrap_or_else(|| unreachable!("index was just ensured"));
        let previous = index.docs.insert(
            op.id.clone(),
            SimDoc {
                payload: op.payload.clone(),
                routing: op.routing.clone(),
            },
        );
        Ok(if previous.is_some() {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }

    fn base_snapshot(&self) -> StateSnapshot {
        let version = self.version.load(Ordering::SeqCst);
        let nodes: HashMap<String, NodeMeta> =
            self.nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();
        let indices: HashMap<String, IndexMeta> = self
            .indices
            .iter()
            .map(|e| (e.key().clone(), e.value().meta.clone()))
            .collect();

        // shards spread round-robin over data nodes, all started
        let routing = indices
            .values()
            .map(|meta| {
                let copies = (0..meta.shards)
                    .map(|shard| ShardRouting {
                        shard,
                        node: self.nodes[shard as usize % self.nodes.len().max(1)].id.clone(),
                        primary: true,
                        state: ShardState::Started,
                    })
                    .collect();
                (meta.name.clone(), copies)
            })
            .collect();

        let master_id = self.nodes.iter().find(|n| n.master_eligible).map(|n| n.id.clone());

        StateSnapshot {
            version,
            state_id: format!("state-{version}"),
            master_id,
            local_node_id: None,
            nodes,
            indices,
            routing,
            settings: self.cluster_settings.lock().clone(),
        }
    }
}

#[async_trait]
impl ClusterBackend for SimCluster {
    async fn create_index(
        &self,
        index: &str,
        settings: &Settings,
    ) -> BackendResult<()> {
        self.ensure_open()?;
        if self.indices.contains_key(index) {
            return Err(BackendError::NotAcknowledged(format!(
                "index [{index}] already exists"
            )));
        }
        self.ensure_index(index, settings);
        Ok(())
    }

    async fn delete_index(
        &self,
        index: &str,
    ) -> BackendResult<()> {
        self.ensure_open()?;
        if self.indices.remove(index).is_none() {
            return Err(BackendError::NotFound {
                index: index.to_string(),
                id: String::new(),
            });
        }
        self.bump_version();
        Ok(())
    }

    async fn update_settings(
        &self,
        index: &str,
        settings: &Settings,
    ) -> BackendResult<()> {
        self.ensure_open()?;
        let mut entry = self.indices.get_mut(index).ok_or_else(|| BackendError::NotFound {
            index: index.to_string(),
            id: String::new(),
        })?;
        entry.meta.settings.extend(settings.clone());
        drop(entry);
        self.bump_version();
        Ok(())
    }

    async fn put_template(
        &self,
        template: &TemplateSpec,
    ) -> BackendResult<()> {
        self.ensure_open()?;
        self.templates.insert(template.name.clone(), template.clone());
        self.bump_version();
        Ok(())
    }

    async fn delete_template(
        &self,
        name: &str,
    ) -> BackendResult<()> {
        self.ensure_open()?;
        if self.templates.remove(name).is_none() {
            return Err(BackendError::NotFound {
                index: name.to_string(),
                id: String::new(),
            });
        }
        self.bump_version();
        Ok(())
    }

    async fn list_indices(&self) -> BackendResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.indices.iter().map(|e| e.key().clone()).collect())
    }

    async fn list_templates(&self) -> BackendResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.templates.iter().map(|e| e.key().clone()).collect())
    }

    async fn write(
        &self,
        op: &WriteOp,
    ) -> BackendResult<WriteOutcome> {
        self.ensure_open()?;
        if let Some(delay) = self.faults.write_delay() {
            tokio::time::sleep(delay).await;
        }
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        if self.faults.take_rejection() {
            self.counters.rejections_served.fetch_add(1, Ordering::SeqCst);
            return Err(BackendError::Rejected("write queue capacity reached".to_string()));
        }
        self.apply_write(op)
    }

    async fn bulk_write(
        &self,
        ops: &[WriteOp],
    ) -> BackendResult<Vec<std::result::Result<WriteOutcome, BulkItemFailure>>> {
        self.ensure_open()?;
        self.counters.bulk_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ops
            .iter()
            .map(|op| {
                self.apply_write(op).map_err(|e| BulkItemFailure {
                    op: op.clone(),
                    reason: e.to_string(),
                })
            })
            .collect())
    }

    async fn delete<'a>(
        &self,
        index: &str,
        _doc_type: &str,
        id: &str,
        _routing: Option<&'a str>,
    ) -> BackendResult<WriteOutcome> {
        self.ensure_open()?;
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        let Some(mut entry) = self.indices.get_mut(index) else {
            return Ok(WriteOutcome::NotFound);
        };
        if entry.docs.remove(id).is_none() {
            return Ok(WriteOutcome::NotFound);
        }
        entry.visible.remove(id);
        Ok(WriteOutcome::Deleted)
    }

    async fn refresh(
        &self,
        indices: &[String],
    ) -> BackendResult<Vec<ShardFailure>> {
        self.ensure_open()?;
        self.counters.refreshes.fetch_add(1, Ordering::SeqCst);
        for mut entry in self.indices.iter_mut() {
            if indices.is_empty() || indices.contains(entry.key()) {
                let index = entry.value_mut();
                index.visible = index.docs.keys().cloned().collect();
            }
        }
        Ok(vec![])
    }

    async fn flush(
        &self,
        _indices: &[String],
        _durable: bool,
    ) -> BackendResult<Vec<ShardFailure>> {
        self.ensure_open()?;
        self.counters.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }

    async fn force_merge(
        &self,
        _indices: &[String],
        _max_segments: u32,
    ) -> BackendResult<Vec<ShardFailure>> {
        self.ensure_open()?;
        self.counters.force_merges.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }

    async fn health(
        &self,
        _indices: &[String],
    ) -> BackendResult<HealthReport> {
        self.ensure_open()?;
        if let Some(scripted) = self.faults.next_scripted_health() {
            return Ok(scripted);
        }
        // derived answer: a quiet sim cluster is green with every
        // reachable node responding
        Ok(HealthReport {
            status: HealthStatus::Green,
            relocating_shards: 0,
            initializing_shards: 0,
            node_count: self.nodes.len().saturating_sub(self.faults.unreachable_nodes()),
        })
    }

    async fn state<'a>(
        &self,
        via_node: Option<&'a str>,
        local: bool,
    ) -> BackendResult<StateSnapshot> {
        self.ensure_open()?;
        let mut snapshot = self.base_snapshot();
        let node_id = via_node
            .map(str::to_string)
            .or_else(|| self.nodes.first().map(|n| n.id.clone()));
        snapshot.local_node_id = node_id.clone();

        if local {
            if let Some(node) = node_id {
                match self.faults.divergence_for(&node) {
                    Some(Divergence::TamperedContent) => {
                        if let Some(meta) = snapshot.indices.values_mut().next() {
                            meta.settings.insert("sim.tampered".to_string(), "true".to_string());
                        } else {
                            snapshot
                                .settings
                                .insert("sim.tampered".to_string(), "true".to_string());
                        }
                    }
                    Some(Divergence::StaleVersion) => {
                        snapshot.version = snapshot.version.saturating_sub(1);
                        snapshot.state_id = format!("state-{}", snapshot.version);
                    }
                    None => {}
                }
            }
        }
        Ok(snapshot)
    }

    async fn pending_tasks(&self) -> BackendResult<Vec<PendingTask>> {
        self.ensure_open()?;
        Ok(self.faults.scripted_pending_tasks())
    }

    async fn count(
        &self,
        indices: &[String],
    ) -> BackendResult<u64> {
        self.ensure_open()?;
        Ok(self
            .indices
            .iter()
            .filter(|e| indices.is_empty() || indices.contains(e.key()))
            .map(|e| e.value().visible.len() as u64)
            .sum())
    }

    async fn close(&self) -> BackendResult<()> {
        if self.faults.close_should_fail() {
            return Err(BackendError::Unavailable("scripted close failure".to_string()));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
