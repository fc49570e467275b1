//! Crash-consistent flushing of several databases.
//!
//! Every backend carries a marker under a configurable key:
//!
//! ```text
//! 0xDE ‖ flush_id   dirty: a flush with this id started
//! 0x00 ‖ flush_id   clean: the flush with this id completed
//! ```
//!
//! A flush writes dirty markers everywhere, flushes every wrapper, then
//! writes clean markers everywhere. On startup [`SyncedPool::initialize`]
//! refuses databases left dirty or carrying different markers.

use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::SyncedStore;
use crate::errors::{KvError, KvResult};
use crate::flushable::Flushable;
use crate::ports::outbound::{validate_db_name, DbProducer, KeyValueStore};

/// First byte of a marker written before a flush.
pub const DIRTY_PREFIX: u8 = 0xDE;
/// First byte of a marker written after a flush.
pub const CLEAN_PREFIX: u8 = 0x00;

/// Pool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Key the flush marker is stored under in every database.
    pub flush_id_key: Vec<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            flush_id_key: b"flushID".to_vec(),
        }
    }
}

type Wrapper = Arc<SyncedStore<Flushable>>;

#[derive(Default)]
struct PoolState {
    wrappers: BTreeMap<String, Wrapper>,
    bare: BTreeMap<String, Arc<dyn KeyValueStore>>,
    queued_drops: BTreeSet<String>,
}

/// Set of flushable databases committed together.
pub struct SyncedPool {
    producer: Arc<dyn DbProducer>,
    config: PoolConfig,
    // the single lock also serialises flushes
    state: Mutex<PoolState>,
}

fn marker(prefix: u8, id: &[u8]) -> Vec<u8> {
    let mut m = Vec::with_capacity(id.len() + 1);
    m.push(prefix);
    m.extend_from_slice(id);
    m
}

fn describe(mark: &Option<Vec<u8>>) -> String {
    match mark {
        None => "no marker".to_string(),
        Some(m) => hex::encode(m),
    }
}

impl SyncedPool {
    pub fn new(producer: Arc<dyn DbProducer>, config: PoolConfig) -> Self {
        Self {
            producer,
            config,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Open `name` through the pool, returning its flushable wrapper.
    pub fn open_wrapper(&self, name: &str) -> KvResult<Wrapper> {
        let mut state = self.state.lock();
        self.open_locked(&mut state, name)
    }

    fn open_locked(&self, state: &mut PoolState, name: &str) -> KvResult<Wrapper> {
        validate_db_name(name)?;
        if let Some(wrapper) = state.wrappers.get(name) {
            return Ok(wrapper.clone());
        }
        if state.queued_drops.remove(name) {
            // reopened before the drop was flushed: start from an empty db
            self.producer.drop_db(name)?;
        }
        let bare = self.producer.open_db(name)?;
        let wrapper = Arc::new(SyncedStore::new(Flushable::wrap(bare.clone())));
        state.bare.insert(name.to_string(), bare);
        state.wrappers.insert(name.to_string(), wrapper.clone());
        Ok(wrapper)
    }

    /// Open every named database and check their flush markers.
    ///
    /// With `flush_id` set, every marker must be the clean marker of that id.
    pub fn initialize(&self, names: &[String], flush_id: Option<&[u8]>) -> KvResult<()> {
        let mut state = self.state.lock();
        for name in names {
            self.open_locked(&mut state, name)?;
        }
        self.check_synced_locked(&state, flush_id)
    }

    /// Check the markers of every opened database.
    pub fn check_dbs_synced(&self, flush_id: Option<&[u8]>) -> KvResult<()> {
        let state = self.state.lock();
        self.check_synced_locked(&state, flush_id)
    }

    fn check_synced_locked(&self, state: &PoolState, flush_id: Option<&[u8]>) -> KvResult<()> {
        let key = &self.config.flush_id_key;
        let mut marks = Vec::with_capacity(state.bare.len());
        for (name, db) in &state.bare {
            let mark = db.get(key)?;
            if let Some(m) = &mark {
                if m.first() == Some(&DIRTY_PREFIX) {
                    warn!(db = %name, "database left in dirty state");
                    return Err(KvError::DirtyState {
                        db: name.clone(),
                        flush_id: hex::encode(&m[1..]),
                    });
                }
            }
            marks.push((name, mark));
        }

        if let Some(expected) = flush_id {
            let expected = marker(CLEAN_PREFIX, expected);
            for (name, mark) in &marks {
                if mark.as_deref() != Some(expected.as_slice()) {
                    return Err(KvError::DbsNotSynced {
                        details: format!(
                            "{name} has {}, expected {}",
                            describe(mark),
                            hex::encode(&expected)
                        ),
                    });
                }
            }
        }

        if let Some((first_name, first_mark)) = marks.first() {
            for (name, mark) in &marks[1..] {
                if mark != first_mark {
                    return Err(KvError::DbsNotSynced {
                        details: format!(
                            "{first_name} has {}, {name} has {}",
                            describe(first_mark),
                            describe(mark)
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Clean flush id shared by the opened databases, if any.
    pub fn last_flush_id(&self) -> KvResult<Option<Vec<u8>>> {
        let state = self.state.lock();
        for db in state.bare.values() {
            if let Some(m) = db.get(&self.config.flush_id_key)? {
                if m.first() == Some(&CLEAN_PREFIX) {
                    return Ok(Some(m[1..].to_vec()));
                }
            }
        }
        Ok(None)
    }

    /// Commit every wrapper under the marker protocol.
    pub fn flush(&self, id: &[u8]) -> KvResult<()> {
        let mut state = self.state.lock();

        let drops: Vec<String> = state.queued_drops.iter().cloned().collect();
        for name in drops {
            self.producer.drop_db(&name)?;
            state.queued_drops.remove(&name);
        }

        let key = &self.config.flush_id_key;
        let dirty = marker(DIRTY_PREFIX, id);
        for db in state.bare.values() {
            db.put(key, &dirty)?;
        }
        for wrapper in state.wrappers.values() {
            wrapper.exclusive(|db| db.flush())?;
        }
        let clean = marker(CLEAN_PREFIX, id);
        for db in state.bare.values() {
            db.put(key, &clean)?;
        }

        debug!(dbs = state.bare.len(), flush_id = %hex::encode(id), "flushed pool");
        Ok(())
    }

    /// Flush only when the pending size estimate exceeds `limit`.
    pub fn flush_if_needed(&self, id: &[u8], limit: usize) -> KvResult<bool> {
        if self.not_flushed_size_est() <= limit {
            return Ok(false);
        }
        self.flush(id)?;
        Ok(true)
    }

    /// Sum of the pending size estimates of every wrapper.
    pub fn not_flushed_size_est(&self) -> usize {
        let state = self.state.lock();
        state
            .wrappers
            .values()
            .map(|w| w.shared(|db| db.not_flushed_size_est()))
            .sum()
    }
}

impl DbProducer for SyncedPool {
    fn open_db(&self, name: &str) -> KvResult<Arc<dyn KeyValueStore>> {
        let wrapper: Arc<dyn KeyValueStore> = self.open_wrapper(name)?;
        Ok(wrapper)
    }

    /// Pending data is discarded now; the backend is dropped by the next
    /// flush.
    fn drop_db(&self, name: &str) -> KvResult<()> {
        validate_db_name(name)?;
        let mut state = self.state.lock();
        if let Some(wrapper) = state.wrappers.remove(name) {
            wrapper.shared(|db| db.drop_not_flushed());
        }
        state.bare.remove(name);
        state.queued_drops.insert(name.to_string());
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut names: BTreeSet<String> = self.producer.names().into_iter().collect();
        names.extend(state.wrappers.keys().cloned());
        names
            .into_iter()
            .filter(|n| !state.queued_drops.contains(n))
            .collect()
    }
}
