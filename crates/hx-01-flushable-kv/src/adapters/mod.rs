//! Storage adapters.

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

pub use memory::{MemoryProducer, MemoryStore};
#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbProducer, RocksDbStore};
