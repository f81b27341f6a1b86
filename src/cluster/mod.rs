//! Cluster façade and the narrow backend contract.
//!
//! - [`ClusterBackend`] - the operations the harness consumes from the store
//! - [`ClusterHandle`] - one provisioned cluster, shared read-only
//! - shared data model (write ops, health reports, state snapshots)

mod backend;
mod handle;
mod types;

pub use backend::*;
pub use handle::*;
pub use types::*;

#[cfg(test)]
mod types_test;
