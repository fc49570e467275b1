//! # Flushable Store
//!
//! Write-back cache over a [`KeyValueStore`]. Mutations accumulate in an
//! ordered in-memory map (deletions as tombstones) and reach the backend
//! only on [`Flushable::flush`], through a single atomic batch.
//! [`Flushable::drop_not_flushed`] discards them instead.
//!
//! Reads see the cache first. Iterators merge a snapshot of the cached range
//! with the backend iterator; cached entries shadow backend entries and
//! tombstones hide them.

mod iterator;

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::errors::KvResult;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter};
use iterator::MergedIter;

/// Rough per-entry bookkeeping cost added to the size estimate.
const ENTRY_OVERHEAD: usize = 32;

#[derive(Default)]
struct Pending {
    modified: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    size_est: usize,
}

impl Pending {
    fn record(&mut self, key: Vec<u8>, value: Option<Vec<u8>>) {
        self.size_est += key.len() + value.as_ref().map_or(0, Vec::len) + ENTRY_OVERHEAD;
        self.modified.insert(key, value);
    }

    fn clear(&mut self) {
        self.modified.clear();
        self.size_est = 0;
    }
}

/// Write-back cache over a backend store.
pub struct Flushable {
    underlying: Arc<dyn KeyValueStore>,
    pending: RwLock<Pending>,
}

impl Flushable {
    pub fn wrap(underlying: Arc<dyn KeyValueStore>) -> Self {
        Self {
            underlying,
            pending: RwLock::new(Pending::default()),
        }
    }

    pub fn underlying(&self) -> &Arc<dyn KeyValueStore> {
        &self.underlying
    }

    /// Persist every pending mutation through one backend batch.
    pub fn flush(&self) -> KvResult<()> {
        let mut pending = self.pending.write();
        if pending.modified.is_empty() {
            return Ok(());
        }
        let operations = pending
            .modified
            .iter()
            .map(|(k, v)| match v {
                Some(v) => BatchOperation::put(k.clone(), v.clone()),
                None => BatchOperation::delete(k.clone()),
            })
            .collect();
        self.underlying.atomic_batch_write(operations)?;
        pending.clear();
        Ok(())
    }

    pub fn drop_not_flushed(&self) {
        self.pending.write().clear();
    }

    /// Number of keys with pending mutations.
    pub fn not_flushed_pairs(&self) -> usize {
        self.pending.read().modified.len()
    }

    /// Approximate memory held by pending mutations, in bytes.
    pub fn not_flushed_size_est(&self) -> usize {
        self.pending.read().size_est
    }
}

impl KeyValueStore for Flushable {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        if let Some(cached) = self.pending.read().modified.get(key) {
            return Ok(cached.clone());
        }
        self.underlying.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.pending
            .write()
            .record(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.pending.write().record(key.to_vec(), None);
        Ok(())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()> {
        let mut pending = self.pending.write();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => pending.record(key, Some(value)),
                BatchOperation::Delete { key } => pending.record(key, None),
            }
        }
        Ok(())
    }

    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>> {
        let from = [prefix, start].concat();
        let cached: Vec<(Vec<u8>, Option<Vec<u8>>)> = self
            .pending
            .read()
            .modified
            .range::<[u8], _>((Bound::Included(from.as_slice()), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let parent = self.underlying.iter(prefix, start)?;
        Ok(Box::new(MergedIter::new(cached, parent)))
    }

    fn compact(&self, start: &[u8], limit: Option<&[u8]>) -> KvResult<()> {
        self.underlying.compact(start, limit)
    }
}
