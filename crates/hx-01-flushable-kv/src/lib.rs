//! # Flushable Key-Value Layer (hx-01)
//!
//! Storage foundation of the consensus engine.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`KeyValueStore`] | ordered KV port (memory and RocksDB adapters) |
//! | [`Flushable`] | write-back cache committed through one batch |
//! | [`SyncedStore`] | read-write locked wrapper; iterators hold the read lock |
//! | [`SyncedPool`] | multi-database flush with dirty/clean markers |
//! | [`Table`] | prefixed view over a shared backend |
//! | [`DbProducer`] | named database factory |
//!
//! ## Crash Consistency
//!
//! ```text
//! flush(id):  put 0xDE‖id everywhere → flush wrappers → put 0x00‖id everywhere
//! startup:    any 0xDE marker        → DirtyState
//!             markers disagree       → DbsNotSynced
//! ```
//!
//! ## Crate Structure
//!
//! - `ports/` - the store and producer traits
//! - `adapters/` - in-memory and RocksDB backends
//! - `flushable/`, `synced/`, `table/` - wrappers

pub mod adapters;
pub mod errors;
pub mod flushable;
pub mod ports;
pub mod synced;
pub mod table;

pub use adapters::{MemoryProducer, MemoryStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbProducer, RocksDbStore};
pub use errors::{KvError, KvResult};
pub use flushable::Flushable;
pub use ports::outbound::{
    validate_db_name, Batch, BatchOperation, DbProducer, KeyValueStore, KeyValueStoreExt, KvIter,
    KvPair, IDEAL_BATCH_SIZE,
};
pub use synced::{PoolConfig, SyncedPool, SyncedStore, CLEAN_PREFIX, DIRTY_PREFIX};
pub use table::{inc_prefix, no_prefix, prefixed, Table};
