use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::cluster::WriteOp;

/// An ordered sequence of write operations, built by the caller.
///
/// The orchestrator treats a batch as input only: decoys are appended to a
/// private copy, never to the caller's operations.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        op: WriteOp,
    ) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Unique target indices, sorted for deterministic sampling.
    pub fn indices(&self) -> Vec<String> {
        self.ops
            .iter()
            .map(|op| op.index.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Unique (index, doc types) pairs, sorted for deterministic sampling.
    pub(crate) fn indices_and_types(&self) -> Vec<(String, Vec<String>)> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for op in &self.ops {
            map.entry(op.index.clone()).or_default().insert(op.doc_type.clone());
        }
        map.into_iter().map(|(index, types)| (index, types.into_iter().collect())).collect()
    }
}

impl From<Vec<WriteOp>> for WriteBatch {
    fn from(ops: Vec<WriteOp>) -> Self {
        Self { ops }
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl Extend<WriteOp> for WriteBatch {
    fn extend<I: IntoIterator<Item = WriteOp>>(
        &mut self,
        iter: I,
    ) {
        self.ops.extend(iter);
    }
}
