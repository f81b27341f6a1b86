//! # Cluster Lifecycle Tests
//!
//! Scope policies (suite reuse vs per-test rebuild), wipe-between-tests and
//! best-effort teardown.

mod scope_cases;
