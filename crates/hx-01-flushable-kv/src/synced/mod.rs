//! # Synchronised Stores
//!
//! [`SyncedStore`] guards a store with a read-write lock: regular operations
//! and live iterators hold the read side, [`SyncedStore::exclusive`] takes
//! the write side. A flush run through `exclusive` therefore waits until
//! every iterator created before it has been dropped.
//!
//! [`SyncedPool`] coordinates flushes of several [`Flushable`] databases
//! with dirty/clean flush markers so a crash between them is detectable.
//!
//! Iterators must be drained or dropped before flushing from the same
//! thread, otherwise the flush deadlocks.
//!
//! [`Flushable`]: crate::flushable::Flushable

mod pool;

use parking_lot::{ArcRwLockReadGuard, RawRwLock, RwLock};
use std::sync::Arc;

use crate::errors::KvResult;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter, KvPair};

pub use pool::{PoolConfig, SyncedPool, CLEAN_PREFIX, DIRTY_PREFIX};

/// Store shared behind a read-write lock.
pub struct SyncedStore<S> {
    inner: Arc<RwLock<S>>,
}

impl<S: KeyValueStore + 'static> SyncedStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run `f` while no reader or iterator is active.
    pub fn exclusive<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.inner.write();
        f(&guard)
    }

    /// Run `f` under the shared lock.
    pub fn shared<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.inner.read_recursive();
        f(&guard)
    }
}

/// Iterator keeping the read lock alive until it is dropped.
struct GuardedIter<S: 'static> {
    _guard: ArcRwLockReadGuard<RawRwLock, S>,
    items: std::vec::IntoIter<KvResult<KvPair>>,
}

impl<S> Iterator for GuardedIter<S> {
    type Item = KvResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

impl<S: KeyValueStore + 'static> KeyValueStore for SyncedStore<S> {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.inner.read_recursive().get(key)
    }

    fn has(&self, key: &[u8]) -> KvResult<bool> {
        self.inner.read_recursive().has(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.inner.read_recursive().put(key, value)
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.inner.read_recursive().delete(key)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> KvResult<()> {
        self.inner.read_recursive().atomic_batch_write(operations)
    }

    fn iter(&self, prefix: &[u8], start: &[u8]) -> KvResult<KvIter<'_>> {
        let guard = self.inner.read_arc_recursive();
        let items: Vec<KvResult<KvPair>> = guard.iter(prefix, start)?.collect();
        Ok(Box::new(GuardedIter {
            _guard: guard,
            items: items.into_iter(),
        }))
    }

    fn compact(&self, start: &[u8], limit: Option<&[u8]>) -> KvResult<()> {
        self.inner.read_recursive().compact(start, limit)
    }
}
