use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;
use tracing::error;

use crate::cluster::ClusterHandle;
use crate::cluster::IndexMeta;
use crate::cluster::NodeMeta;
use crate::cluster::Settings;
use crate::cluster::ShardRouting;
use crate::cluster::StateSnapshot;
use crate::ConsistencyError;

/// Canonical form of a [`StateSnapshot`]: node-identity fields stripped,
/// maps sorted, routing tables order-normalized.
///
/// Raw serializations of the same state can differ byte-for-byte because
/// map iteration order is not guaranteed; the canonical form makes
/// byte-level comparison meaningful.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct CanonicalState {
    version: u64,
    state_id: String,
    master_id: Option<String>,
    nodes: BTreeMap<String, NodeMeta>,
    indices: BTreeMap<String, IndexMeta>,
    routing: BTreeMap<String, Vec<ShardRouting>>,
    settings: Settings,
}

impl CanonicalState {
    pub(crate) fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        let mut routing: BTreeMap<String, Vec<ShardRouting>> = snapshot
            .routing
            .iter()
            .map(|(index, copies)| (index.clone(), copies.clone()))
            .collect();
        for copies in routing.values_mut() {
            copies.sort_by(|a, b| {
                (a.shard, &a.node, a.primary).cmp(&(b.shard, &b.node, b.primary))
            });
        }

        Self {
            version: snapshot.version,
            state_id: snapshot.state_id.clone(),
            master_id: snapshot.master_id.clone(),
            nodes: snapshot.nodes.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            indices: snapshot.indices.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            routing,
            settings: snapshot.settings.clone(),
        }
    }

    pub(crate) fn to_bytes(&self) -> std::result::Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

/// Verifies that every node which has the master's state version also has
/// the master's state.
pub struct ConsistencyChecker;

impl ConsistencyChecker {
    pub async fn check(handle: &ClusterHandle) -> std::result::Result<(), ConsistencyError> {
        if handle.nodes().is_empty() {
            return Ok(());
        }

        let master = handle.state(None, false).await.map_err(|cause| {
            ConsistencyError::StateFetch {
                node: "<master>".to_string(),
                cause,
            }
        })?;
        let master_id = master.master_id.clone().ok_or(ConsistencyError::NoElectedMaster)?;
        let master_bytes = CanonicalState::from_snapshot(&master).to_bytes()?;

        for node in handle.nodes() {
            let local = handle.state(Some(&node.id), true).await.map_err(|cause| {
                ConsistencyError::StateFetch {
                    node: node.id.clone(),
                    cause,
                }
            })?;

            // only comparable when the node has applied the same state
            // version under the same master; anything else is an expected
            // transient
            if local.version != master.version
                || local.master_id.as_deref() != Some(master_id.as_str())
            {
                debug!(
                    "skipping node {}: state version {} / master {:?} (authoritative: {} / {})",
                    node.id, local.version, local.master_id, master.version, master_id
                );
                continue;
            }

            if let Err(reason) = Self::compare(&master, &master_bytes, &local)? {
                error!(
                    "cluster state from master:\n{master:#?}\nlocal cluster state ({}):\n{local:#?}",
                    node.id
                );
                return Err(ConsistencyError::Divergence {
                    node: node.id.clone(),
                    reason,
                    master_state: format!("{master:#?}"),
                    local_state: format!("{local:#?}"),
                });
            }
        }

        Ok(())
    }

    fn compare(
        master: &StateSnapshot,
        master_bytes: &[u8],
        local: &StateSnapshot,
    ) -> std::result::Result<std::result::Result<(), String>, ConsistencyError> {
        if local.state_id != master.state_id {
            return Ok(Err(format!(
                "state id does not match ({} != {})",
                local.state_id, master.state_id
            )));
        }

        let local_bytes = CanonicalState::from_snapshot(local).to_bytes()?;
        // sizes are comparable even when raw serializations are not
        if local_bytes.len() != master_bytes.len() {
            return Ok(Err(format!(
                "state size does not match ({} != {} bytes)",
                local_bytes.len(),
                master_bytes.len()
            )));
        }
        if local_bytes != master_bytes {
            return Ok(Err("canonical state serialization does not match".to_string()));
        }
        Ok(Ok(()))
    }
}
