//! Domain values of the vector index.

pub mod branches;
pub mod seq;

pub use branches::{BranchMeta, BranchesInfo};
pub use seq::{BranchSeq, HighestBeforeSeq, LowestAfterSeq};
