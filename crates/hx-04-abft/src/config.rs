//! Orderer configuration.

use serde::Deserialize;

use hx_02_vector_index::VectorIndexConfig;

/// Store cache sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Frames whose root lists are kept in memory.
    pub roots_cache_frames: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            roots_cache_frames: 100,
        }
    }
}

impl StoreConfig {
    pub fn lite() -> Self {
        Self {
            roots_cache_frames: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AbftConfig {
    /// Accept events whose stamped frame differs from the computed one.
    pub suppress_frame_check: bool,
    pub store: StoreConfig,
    pub vector_index: VectorIndexConfig,
}

impl AbftConfig {
    /// Small caches for tests.
    pub fn lite() -> Self {
        Self {
            suppress_frame_check: false,
            store: StoreConfig::lite(),
            vector_index: VectorIndexConfig::lite(),
        }
    }
}
