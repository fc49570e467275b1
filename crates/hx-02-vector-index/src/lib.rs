//! # Vector Index (hx-02)
//!
//! Branch-aware vector clocks over the event DAG and the forkless-cause
//! relation derived from them.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`VectorEngine`] | per-event highest-before / lowest-after vectors, fork branches |
//! | [`VectorIndex`] | engine plus memoised `forkless_cause` |
//! | [`HighestBeforeSeq`], [`LowestAfterSeq`] | little-endian byte vectors |
//! | [`BranchesInfo`] | branch table, persisted with the vectors |
//!
//! ## Storage Layout
//!
//! All tables live under the table handed to [`VectorIndex::reset`]:
//!
//! | Prefix | Key | Value |
//! |--------|-----|-------|
//! | `S` | event id | highest-before bytes |
//! | `s` | event id | lowest-after bytes |
//! | `b` | event id | branch, BE u32 |
//! | `B` | `c` | bincode [`BranchesInfo`] |

pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod index;

pub use config::VectorIndexConfig;
pub use domain::{BranchMeta, BranchSeq, BranchesInfo, HighestBeforeSeq, LowestAfterSeq};
pub use engine::VectorEngine;
pub use errors::{VectorError, VectorResult};
pub use index::VectorIndex;
