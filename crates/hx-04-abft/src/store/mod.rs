//! # Orderer Store
//!
//! Two kinds of databases:
//!
//! | Database | Table | Key | Value |
//! |----------|-------|-----|-------|
//! | main | `c` | `d` | bincode [`LastDecidedState`] |
//! | main | `e` | `e` | bincode [`EpochState`] |
//! | `epoch-{n}` | `r` | frame BE ‖ validator BE ‖ event id | empty |
//! | `epoch-{n}` | `v` | vector index tables | |
//! | `epoch-{n}` | `C` | event id | confirming frame BE |
//!
//! The epoch database is obtained from a [`DbProducer`] and dropped when the
//! epoch is sealed. Storage and decode failures are reported through the
//! [`Crit`] hook before they are returned.

mod confirmed;
mod roots;

use lru::LruCache;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use hx_01_flushable_kv::{DbProducer, KeyValueStore, Table};
use hx_03_election::RootAndSlot;
use shared_types::{Crit, Epoch, Frame, TypesError, Validators};

use crate::config::StoreConfig;
use crate::domain::{EpochState, LastDecidedState};
use crate::errors::{AbftError, AbftResult};

const TABLE_LAST_DECIDED: &[u8] = b"c";
const TABLE_EPOCH_STATE: &[u8] = b"e";
const KEY_LAST_DECIDED: &[u8] = b"d";
const KEY_EPOCH_STATE: &[u8] = b"e";

const TABLE_ROOTS: &[u8] = b"r";
const TABLE_VECTOR_INDEX: &[u8] = b"v";
const TABLE_CONFIRMED: &[u8] = b"C";

/// Name of the database holding the epoch's tables.
pub fn epoch_db_name(epoch: Epoch) -> String {
    format!("epoch-{epoch}")
}

struct EpochDb {
    name: String,
    roots: Table,
    vectors: Arc<dyn KeyValueStore>,
    confirmed: Table,
}

impl EpochDb {
    fn new(name: String, db: Arc<dyn KeyValueStore>) -> Self {
        Self {
            name,
            roots: Table::new(db.clone(), TABLE_ROOTS),
            vectors: Arc::new(Table::new(db.clone(), TABLE_VECTOR_INDEX)),
            confirmed: Table::new(db, TABLE_CONFIRMED),
        }
    }
}

struct Cache {
    last_decided: Option<LastDecidedState>,
    epoch_state: Option<EpochState>,
    frame_roots: LruCache<Frame, Vec<RootAndSlot>>,
}

/// Persistent state of the orderer.
pub struct Store {
    crit: Crit,
    producer: Arc<dyn DbProducer>,
    last_decided_table: Table,
    epoch_state_table: Table,
    epoch_db: Option<EpochDb>,
    cache: Mutex<Cache>,
}

impl Store {
    pub fn new(
        main: Arc<dyn KeyValueStore>,
        producer: Arc<dyn DbProducer>,
        config: &StoreConfig,
        crit: Crit,
    ) -> Self {
        let frames = NonZeroUsize::new(config.roots_cache_frames).unwrap_or(NonZeroUsize::MIN);
        Self {
            crit,
            producer,
            last_decided_table: Table::new(main.clone(), TABLE_LAST_DECIDED),
            epoch_state_table: Table::new(main, TABLE_EPOCH_STATE),
            epoch_db: None,
            cache: Mutex::new(Cache {
                last_decided: None,
                epoch_state: None,
                frame_roots: LruCache::new(frames),
            }),
        }
    }

    pub fn crit(&self) -> &Crit {
        &self.crit
    }

    /// Reports storage and decode failures to the crit hook.
    pub(crate) fn check<T>(&self, res: AbftResult<T>) -> AbftResult<T> {
        if let Err(err) = &res {
            if err.is_critical() {
                self.crit.report(err);
            }
        }
        res
    }

    fn get_value<T: DeserializeOwned>(&self, table: &Table, key: &[u8]) -> AbftResult<Option<T>> {
        let res = (|| -> AbftResult<Option<T>> {
            match table.get(key)? {
                Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
                None => Ok(None),
            }
        })();
        self.check(res)
    }

    fn set_value<T: Serialize>(&self, table: &Table, key: &[u8], value: &T) -> AbftResult<()> {
        let res = (|| -> AbftResult<()> {
            let raw = bincode::serialize(value)?;
            table.put(key, &raw)?;
            Ok(())
        })();
        self.check(res)
    }

    /// Writes the initial epoch and last decided states.
    pub fn apply_genesis(&self, epoch: Epoch, validators: &Validators) -> AbftResult<()> {
        if validators.is_empty() {
            return Err(TypesError::EmptyValidators.into());
        }
        if let Some(existing) = self.get_value::<EpochState>(&self.epoch_state_table, KEY_EPOCH_STATE)? {
            return Err(AbftError::GenesisAlreadyApplied {
                epoch: existing.epoch,
            });
        }
        self.set_epoch_state(EpochState {
            epoch,
            validators: validators.clone(),
        })?;
        self.set_last_decided_state(LastDecidedState::default())?;
        debug!(epoch, validators = validators.len(), "genesis applied");
        Ok(())
    }

    pub fn get_epoch_state(&self) -> AbftResult<EpochState> {
        if let Some(state) = &self.cache.lock().epoch_state {
            return Ok(state.clone());
        }
        let state: EpochState = self
            .get_value(&self.epoch_state_table, KEY_EPOCH_STATE)?
            .ok_or(AbftError::NoGenesis)?;
        self.cache.lock().epoch_state = Some(state.clone());
        Ok(state)
    }

    pub fn set_epoch_state(&self, state: EpochState) -> AbftResult<()> {
        self.set_value(&self.epoch_state_table, KEY_EPOCH_STATE, &state)?;
        self.cache.lock().epoch_state = Some(state);
        Ok(())
    }

    pub fn get_last_decided_state(&self) -> AbftResult<LastDecidedState> {
        if let Some(state) = self.cache.lock().last_decided {
            return Ok(state);
        }
        let state: LastDecidedState = self
            .get_value(&self.last_decided_table, KEY_LAST_DECIDED)?
            .ok_or(AbftError::NoGenesis)?;
        self.cache.lock().last_decided = Some(state);
        Ok(state)
    }

    pub fn set_last_decided_state(&self, state: LastDecidedState) -> AbftResult<()> {
        self.set_value(&self.last_decided_table, KEY_LAST_DECIDED, &state)?;
        self.cache.lock().last_decided = Some(state);
        Ok(())
    }

    pub fn get_epoch(&self) -> AbftResult<Epoch> {
        Ok(self.get_epoch_state()?.epoch)
    }

    pub fn get_validators(&self) -> AbftResult<Validators> {
        Ok(self.get_epoch_state()?.validators)
    }

    pub fn get_last_decided_frame(&self) -> AbftResult<Frame> {
        Ok(self.get_last_decided_state()?.last_decided_frame)
    }

    /// Opens (or creates) the database of `epoch`, closing any other.
    pub fn open_epoch_db(&mut self, epoch: Epoch) -> AbftResult<()> {
        let name = epoch_db_name(epoch);
        let db = self.check(self.producer.open_db(&name).map_err(Into::into))?;
        self.epoch_db = Some(EpochDb::new(name.clone(), db));
        self.cache.lock().frame_roots.clear();
        debug!(db = %name, "epoch database opened");
        Ok(())
    }

    /// Closes and drops the open epoch database, if any.
    pub fn drop_epoch_db(&mut self) -> AbftResult<()> {
        let Some(epoch_db) = self.epoch_db.take() else {
            return Ok(());
        };
        self.cache.lock().frame_roots.clear();
        let name = epoch_db.name.clone();
        drop(epoch_db);
        self.check(self.producer.drop_db(&name).map_err(Into::into))?;
        debug!(db = %name, "epoch database dropped");
        Ok(())
    }

    /// Drops whatever the database of `epoch` holds and opens it empty.
    pub fn reset_epoch_db(&mut self, epoch: Epoch) -> AbftResult<()> {
        self.drop_epoch_db()?;
        self.check(self.producer.drop_db(&epoch_db_name(epoch)).map_err(Into::into))?;
        self.open_epoch_db(epoch)
    }

    pub fn is_epoch_db_open(&self) -> bool {
        self.epoch_db.is_some()
    }

    fn epoch_db(&self) -> AbftResult<&EpochDb> {
        self.epoch_db.as_ref().ok_or(AbftError::EpochDbClosed)
    }

    /// Table the vector index of the current epoch lives in.
    pub fn epoch_vector_table(&self) -> AbftResult<Arc<dyn KeyValueStore>> {
        Ok(self.epoch_db()?.vectors.clone())
    }
}
