//! Health gating: poll a cluster until a requested condition holds or a
//! deadline passes.

mod gate;
mod target;

pub use gate::*;
pub use target::*;
