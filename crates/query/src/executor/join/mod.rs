//! Join algorithms.

mod exists;
mod hash;

pub use exists::ExistsJoin;
pub use hash::HashJoin;
