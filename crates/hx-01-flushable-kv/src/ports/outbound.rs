//! # Outbound Ports (Driven Ports)
//!
//! Storage backends this crate builds upon, and the producer interface the
//! engine uses to obtain named databases.
//!
//! Production: `RocksDbStore` / `RocksDbProducer` (feature `rocksdb`)
//! Testing: `MemoryStore` / `MemoryProducer`

use std::sync::Arc;

use crate::errors::{KvError, KvResult};

/// A stored key-value pair.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered iterator over stored pairs.
pub type KvIter<'a> = Box<dyn Iterator<Item = KvResult<KvPair>> + 'a>;

/// Batches larger than this should be written and reset.
pub const IDEAL_BATCH_SIZE: usize = 100 * 1024;

/// Abstract interface for ordered key-value database operations.
///
/// All methods take `&self`; implementations synchronise internally so a
/// store can be shared behind an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    /// Check if a key exists.
    fn has(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Put a single key-value pair.
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &[u8]) -> KvResult<()>;

    /// Execute an atomic batch write: either all operations are applied or
    /// none.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()>;

    /// Iterate in key order over keys that start with `prefix` and are
    /// greater than or equal to `prefix ‖ start`.
    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>>;

    /// Compact the key range `[start, limit)`; `None` means up to the end.
    fn compact(&self, _start: &[u8], _limit: Option<&[u8]>) -> KvResult<()> {
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        (**self).get(key)
    }
    fn has(&self, key: &[u8]) -> KvResult<bool> {
        (**self).has(key)
    }
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        (**self).put(key, value)
    }
    fn delete(&self, key: &[u8]) -> KvResult<()> {
        (**self).delete(key)
    }
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()> {
        (**self).atomic_batch_write(operations)
    }
    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>> {
        (**self).iter(prefix, start)
    }
    fn compact(&self, start: &[u8], limit: Option<&[u8]>) -> KvResult<()> {
        (**self).compact(start, limit)
    }
}

/// Convenience operations available on every store.
pub trait KeyValueStoreExt: KeyValueStore {
    /// Start an empty batch targeting this store.
    fn new_batch(&self) -> Batch<'_, Self> {
        Batch::new(self)
    }

    /// Collect every pair under `prefix`.
    fn prefix_scan(&self, prefix: &[u8]) -> KvResult<Vec<KvPair>> {
        self.iter(prefix, &[])?.collect()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStoreExt for T {}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            BatchOperation::Put { key, .. } | BatchOperation::Delete { key } => key,
        }
    }
}

/// Write-only buffer of operations applied atomically on [`Batch::write`].
pub struct Batch<'a, S: KeyValueStore + ?Sized> {
    target: &'a S,
    operations: Vec<BatchOperation>,
    size: usize,
}

impl<'a, S: KeyValueStore + ?Sized> Batch<'a, S> {
    pub fn new(target: &'a S) -> Self {
        Self {
            target,
            operations: Vec::new(),
            size: 0,
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.size += key.len() + value.len();
        self.operations.push(BatchOperation::put(key, value));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.size += key.len();
        self.operations.push(BatchOperation::delete(key));
    }

    /// Amount of data queued for writing.
    pub fn value_size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply the queued operations. The batch stays populated; call
    /// [`Batch::reset`] to reuse it.
    pub fn write(&self) -> KvResult<()> {
        if self.operations.is_empty() {
            return Ok(());
        }
        self.target.atomic_batch_write(self.operations.clone())
    }

    pub fn reset(&mut self) {
        self.operations.clear();
        self.size = 0;
    }

    /// Apply the queued operations to another store.
    pub fn replay(&self, other: &dyn KeyValueStore) -> KvResult<()> {
        other.atomic_batch_write(self.operations.clone())
    }
}

/// Producer of named databases.
pub trait DbProducer: Send + Sync {
    /// Open (creating if needed) the database called `name`.
    fn open_db(&self, name: &str) -> KvResult<Arc<dyn KeyValueStore>>;

    /// Remove the database called `name` and all of its data.
    fn drop_db(&self, name: &str) -> KvResult<()>;

    /// Names of the databases this producer knows about, sorted.
    fn names(&self) -> Vec<String>;
}

/// Longest accepted database name.
pub const MAX_DB_NAME_LEN: usize = 64;

/// Checks that `name` is 1 to 64 bytes of `[a-z0-9_-]`.
pub fn validate_db_name(name: &str) -> KvResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_DB_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidDatabaseName {
            name: name.to_string(),
        })
    }
}
