//! Simulated cluster backend.
//!
//! An in-memory [`ClusterBackend`](crate::cluster::ClusterBackend) with
//! scripted fault injection, plus a matching provisioner. The harness's own
//! integration tests run against it; downstream crates can use it to test
//! their harness wiring without a live store.

#[allow(clippy::module_inception)]
mod cluster;
mod fault;
mod provisioner;

pub use cluster::*;
pub use fault::*;
pub use provisioner::*;
