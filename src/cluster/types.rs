use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Flat `key = value` settings map, index- or cluster-level.
///
/// Kept ordered so rendered settings (templates, specs) are stable across
/// runs with the same seed.
pub type Settings = BTreeMap<String, String>;

/// Lifetime policy for a provisioned cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A cluster shared across all tests in a single suite
    #[default]
    Suite,
    /// A test exclusive cluster, rebuilt before every test
    Test,
}

/// One write operation (index/type/id/payload/routing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOp {
    pub index: String,
    pub doc_type: String,
    pub id: String,
    pub payload: Vec<u8>,
    pub routing: Option<String>,
}

impl WriteOp {
    pub fn new(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: id.into(),
            payload: payload.into(),
            routing: None,
        }
    }

    pub fn routing(
        mut self,
        routing: impl Into<String>,
    ) -> Self {
        self.routing = Some(routing.into());
        self
    }
}

/// Result of a single write or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Deleted,
    /// Deletion target did not exist.
    NotFound,
}

/// Per-item failure inside a bulk response.
#[derive(Debug, Clone)]
pub struct BulkItemFailure {
    pub op: WriteOp,
    pub reason: String,
}

/// One shard that failed a refresh/flush/force-merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFailure {
    pub index: String,
    pub shard: u32,
    pub node: Option<String>,
    pub reason: String,
}

/// Ordered cluster status. `severity()` maps best→worst onto 0→2, so
/// "at least as good as requested" is a numeric `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
}

impl HealthStatus {
    pub fn severity(&self) -> u8 {
        match self {
            HealthStatus::Green => 0,
            HealthStatus::Yellow => 1,
            HealthStatus::Red => 2,
        }
    }

    /// True when `self` is at least as good as `requested`.
    pub fn at_least(
        &self,
        requested: HealthStatus,
    ) -> bool {
        self.severity() <= requested.severity()
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let color = match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        };
        write!(f, "{color}")
    }
}

/// Aggregated health answer for one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub relocating_shards: u32,
    pub initializing_shards: u32,
    pub node_count: usize,
}

/// Node metadata as carried in the cluster state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub id: String,
    pub name: String,
    pub address: String,
    pub data: bool,
    pub master_eligible: bool,
}

/// Index metadata as carried in the cluster state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub name: String,
    pub shards: u32,
    pub replicas: u32,
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardState {
    Started,
    Initializing,
    Relocating,
    Unassigned,
}

/// One shard copy's placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRouting {
    pub shard: u32,
    pub node: String,
    pub primary: bool,
    pub state: ShardState,
}

/// Full cluster state as observed by one node.
///
/// `local_node_id` is the only node-identity field: it legitimately differs
/// between nodes and is stripped before any cross-node comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u64,
    /// Unique id of this published state, shared by every node that applied
    /// it.
    pub state_id: String,
    pub master_id: Option<String>,
    pub local_node_id: Option<String>,
    pub nodes: HashMap<String, NodeMeta>,
    pub indices: HashMap<String, IndexMeta>,
    pub routing: HashMap<String, Vec<ShardRouting>>,
    /// Persistent + transient cluster-level settings.
    pub settings: Settings,
}

/// One entry of the master's pending task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTask {
    pub insert_order: u64,
    pub priority: String,
    pub source: String,
    pub time_in_queue_ms: u64,
}

/// An index template: settings applied to every new index whose name
/// matches one of the patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub name: String,
    pub patterns: Vec<String>,
    pub order: i32,
    pub settings: Settings,
}

impl TemplateSpec {
    /// Simple wildcard match: `*` matches everything, a trailing `*`
    /// matches a prefix, otherwise exact.
    pub fn matches(
        &self,
        index: &str,
    ) -> bool {
        self.patterns.iter().any(|p| {
            if p == "*" {
                true
            } else if let Some(prefix) = p.strip_suffix('*') {
                index.starts_with(prefix)
            } else {
                p == index
            }
        })
    }
}
