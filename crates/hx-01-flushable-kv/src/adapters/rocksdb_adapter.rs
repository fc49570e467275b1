//! # RocksDB Adapter
//!
//! Production implementation of [`KeyValueStore`] and [`DbProducer`].
//! Each database name maps to its own RocksDB directory under a base path,
//! so dropping an epoch database removes its directory.
//!
//! Enabled with the `rocksdb` feature.

use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{KvError, KvResult};
use crate::ports::outbound::{
    validate_db_name, BatchOperation, DbProducer, KeyValueStore, KvIter, KvPair,
};

/// RocksDB tuning shared by every database a producer opens.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 32MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// fsync after each write
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing() -> Self {
        Self {
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }

    fn options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(self.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);
        opts
    }
}

fn io_err(op: &str, err: rocksdb::Error) -> KvError {
    KvError::io(format!("RocksDB {op} failed: {err}"))
}

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    sync_writes: bool,
}

impl RocksDbStore {
    pub fn open(path: impl AsRef<Path>, config: &RocksDbConfig) -> KvResult<Self> {
        let db = DB::open(&config.options(), path).map_err(|e| io_err("open", e))?;
        Ok(Self {
            db,
            sync_writes: config.sync_writes,
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.db.get(key).map_err(|e| io_err("get", e))
    }

    fn has(&self, key: &[u8]) -> KvResult<bool> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| io_err("has", e))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.db
            .put_opt(key, value, &self.write_options())
            .map_err(|e| io_err("put", e))
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.db
            .delete_opt(key, &self.write_options())
            .map_err(|e| io_err("delete", e))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| io_err("batch write", e))
    }

    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>> {
        let from = [prefix, start].concat();
        let prefix = prefix.to_vec();
        let iter = self
            .db
            .iterator(IteratorMode::From(&from, Direction::Forward))
            .map(|item| {
                item.map(|(k, v)| -> KvPair { (k.to_vec(), v.to_vec()) })
                    .map_err(|e| io_err("iterate", e))
            })
            .take_while(move |item| match item {
                Ok((k, _)) => k.starts_with(&prefix),
                Err(_) => true,
            });
        Ok(Box::new(iter))
    }

    fn compact(&self, start: &[u8], limit: Option<&[u8]>) -> KvResult<()> {
        self.db.compact_range(Some(start), limit);
        Ok(())
    }
}

/// Opens one RocksDB directory per database name under `base_dir`.
pub struct RocksDbProducer {
    base_dir: PathBuf,
    config: RocksDbConfig,
    open: Mutex<BTreeMap<String, Arc<RocksDbStore>>>,
}

impl RocksDbProducer {
    pub fn new(base_dir: impl Into<PathBuf>, config: RocksDbConfig) -> Self {
        Self {
            base_dir: base_dir.into(),
            config,
            open: Mutex::new(BTreeMap::new()),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

impl DbProducer for RocksDbProducer {
    fn open_db(&self, name: &str) -> KvResult<Arc<dyn KeyValueStore>> {
        validate_db_name(name)?;
        let mut open = self.open.lock();
        if let Some(store) = open.get(name) {
            return Ok(store.clone());
        }
        let store = Arc::new(RocksDbStore::open(self.path(name), &self.config)?);
        open.insert(name.to_string(), store.clone());
        tracing::debug!(db = name, "opened rocksdb database");
        Ok(store)
    }

    fn drop_db(&self, name: &str) -> KvResult<()> {
        validate_db_name(name)?;
        // the handle must be closed before the directory can be destroyed
        self.open.lock().remove(name);
        let path = self.path(name);
        if path.exists() {
            DB::destroy(&Options::default(), &path).map_err(|e| io_err("destroy", e))?;
        }
        tracing::debug!(db = name, "dropped rocksdb database");
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.base_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_dir())
                    .filter_map(|e| e.file_name().into_string().ok())
                    .filter(|n| validate_db_name(n).is_ok())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
