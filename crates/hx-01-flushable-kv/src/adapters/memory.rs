//! # In-Memory Adapters
//!
//! `MemoryStore` keeps pairs in an ordered map. Iterators work on a snapshot
//! of the requested range taken at creation, so writes made while iterating
//! are not observed.
//!
//! `MemoryProducer` hands out named `MemoryStore`s. Clones share the same
//! databases, which lets tests simulate a restart by building a new engine
//! over the same producer.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::errors::KvResult;
use crate::ports::outbound::{
    validate_db_name, BatchOperation, DbProducer, KeyValueStore, KvIter, KvPair,
};

/// Ordered in-memory key-value store.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.data.read().contains_key(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()> {
        let mut data = self.data.write();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>> {
        let from = [prefix, start].concat();
        let snapshot: Vec<KvResult<KvPair>> = self
            .data
            .read()
            .range::<[u8], _>((Bound::Included(from.as_slice()), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }
}

/// Producer of shared in-memory databases.
#[derive(Clone, Default)]
pub struct MemoryProducer {
    dbs: Arc<RwLock<BTreeMap<String, Arc<MemoryStore>>>>,
}

impl MemoryProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The concrete store behind `name`, if it was opened.
    pub fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.dbs.read().get(name).cloned()
    }
}

impl DbProducer for MemoryProducer {
    fn open_db(&self, name: &str) -> KvResult<Arc<dyn KeyValueStore>> {
        validate_db_name(name)?;
        let store: Arc<dyn KeyValueStore> = self
            .dbs
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new()))
            .clone();
        Ok(store)
    }

    fn drop_db(&self, name: &str) -> KvResult<()> {
        validate_db_name(name)?;
        self.dbs.write().remove(name);
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        self.dbs.read().keys().cloned().collect()
    }
}
