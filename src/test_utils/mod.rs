//! the test_utils folder here will share utils or test components between
//! unit tests and integration tests
mod common;

pub use common::*;
