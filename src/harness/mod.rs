//! The harness context object.
//!
//! Owned by the test runner and held by value or reference in each test
//! (composition, not inheritance); no process-wide statics, no implicit
//! current cluster.

#[allow(clippy::module_inception)]
mod harness;

pub use harness::*;
