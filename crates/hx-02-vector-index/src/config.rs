//! Vector index configuration.

use serde::Deserialize;

/// Cache sizes of the vector index, in entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    /// Memoised `forkless_cause` results.
    pub forkless_cause_pairs: usize,
    pub highest_before_cache: usize,
    pub lowest_after_cache: usize,
    pub event_branch_cache: usize,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            forkless_cause_pairs: 20_000,
            highest_before_cache: 16_384,
            lowest_after_cache: 16_384,
            event_branch_cache: 16_384,
        }
    }
}

impl VectorIndexConfig {
    /// Small caches for tests.
    pub fn lite() -> Self {
        Self {
            forkless_cause_pairs: 500,
            highest_before_cache: 256,
            lowest_after_cache: 256,
            event_branch_cache: 256,
        }
    }
}
