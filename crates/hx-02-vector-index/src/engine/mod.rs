//! # Vector Engine
//!
//! Maintains, per indexed event, the branch-aware vector clocks:
//!
//! - `HighestBefore(e)[b]` - range of seqs on branch `b` observed by `e`
//! - `LowestAfter(e)[b]` - lowest seq on branch `b` of an event observing `e`
//!
//! ## Ingest
//!
//! ```text
//! add(e):
//!   branch  = branch of e (new branch if e forks)
//!   HB(e)   = (seq, seq) at branch, folded with HB(parent) for each parent
//!   forks   = creators with overlapping or fork-marked branches → marked
//!   walk ancestors, LA(a)[branch] = seq where still unset
//!   store HB(e), LA(e), EventBranch(e)
//! ```
//!
//! Writes go to a [`Flushable`] over the epoch's vector table and are
//! persisted by [`VectorEngine::flush`] or discarded by
//! [`VectorEngine::drop_not_flushed`].

mod fork;
mod storage;

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use hx_01_flushable_kv::{Flushable, KeyValueStore, MemoryStore, Table};
use shared_types::{BranchIdx, Crit, Event, EventId, EventSource, Validators};

use crate::config::VectorIndexConfig;
use crate::domain::{BranchesInfo, HighestBeforeSeq, LowestAfterSeq};
use crate::errors::{VectorError, VectorResult};

const TABLE_HIGHEST_BEFORE: &[u8] = b"S";
const TABLE_LOWEST_AFTER: &[u8] = b"s";
const TABLE_EVENT_BRANCH: &[u8] = b"b";
const TABLE_BRANCHES_INFO: &[u8] = b"B";
const BRANCHES_INFO_KEY: &[u8] = b"c";

pub(crate) fn cache_size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

struct Tables {
    highest_before: Table,
    lowest_after: Table,
    event_branch: Table,
    branches_info: Table,
}

impl Tables {
    fn new(db: Arc<dyn KeyValueStore>) -> Self {
        Self {
            highest_before: Table::new(db.clone(), TABLE_HIGHEST_BEFORE),
            lowest_after: Table::new(db.clone(), TABLE_LOWEST_AFTER),
            event_branch: Table::new(db.clone(), TABLE_EVENT_BRANCH),
            branches_info: Table::new(db, TABLE_BRANCHES_INFO),
        }
    }
}

struct Caches {
    highest_before: LruCache<EventId, HighestBeforeSeq>,
    lowest_after: LruCache<EventId, LowestAfterSeq>,
    event_branch: LruCache<EventId, BranchIdx>,
}

impl Caches {
    fn new(config: &VectorIndexConfig) -> Self {
        Self {
            highest_before: LruCache::new(cache_size(config.highest_before_cache)),
            lowest_after: LruCache::new(cache_size(config.lowest_after_cache)),
            event_branch: LruCache::new(cache_size(config.event_branch_cache)),
        }
    }

    fn purge(&mut self) {
        self.highest_before.clear();
        self.lowest_after.clear();
        self.event_branch.clear();
    }
}

/// Branch-aware vector clock engine.
pub struct VectorEngine<S> {
    input: S,
    crit: Crit,
    validators: Validators,
    db: Arc<Flushable>,
    tables: Tables,
    branches: BranchesInfo,
    cache: Mutex<Caches>,
}

impl<S: EventSource> VectorEngine<S> {
    /// Creates an engine bound to an empty in-memory table until
    /// [`VectorEngine::reset`] is called with the epoch's table.
    pub fn new(input: S, config: &VectorIndexConfig, crit: Crit) -> Self {
        let db = Arc::new(Flushable::wrap(Arc::new(MemoryStore::new())));
        Self {
            input,
            crit,
            validators: Validators::default(),
            tables: Tables::new(db.clone()),
            db,
            branches: BranchesInfo::new(0),
            cache: Mutex::new(Caches::new(config)),
        }
    }

    /// Rebinds the engine to a new epoch: validators and vector table.
    pub fn reset(&mut self, validators: &Validators, db: Arc<dyn KeyValueStore>) -> VectorResult<()> {
        self.validators = validators.clone();
        self.db = Arc::new(Flushable::wrap(db));
        self.tables = Tables::new(self.db.clone());
        self.cache.lock().purge();
        self.branches = self.load_or_init_branches()?;
        debug!(
            validators = validators.len(),
            branches = self.branches.num_branches(),
            "vector engine reset"
        );
        Ok(())
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    pub fn branches(&self) -> &BranchesInfo {
        &self.branches
    }

    pub fn input(&self) -> &S {
        &self.input
    }

    pub(crate) fn crit(&self) -> &Crit {
        &self.crit
    }

    pub fn at_least_one_fork(&self) -> bool {
        self.branches.at_least_one_fork()
    }

    /// Number of keys written since the last flush.
    pub fn not_flushed_pairs(&self) -> usize {
        self.db.not_flushed_pairs()
    }

    /// Computes and stores the vectors of `e`. Parents must be indexed.
    pub fn add<E: Event>(&mut self, e: &E) -> VectorResult<()> {
        let me_idx = self
            .validators
            .get_idx(e.creator())
            .ok_or(VectorError::UnknownCreator {
                event: e.id(),
                creator: e.creator(),
            })?;

        let mut parent_vecs = Vec::with_capacity(e.parents().len());
        for p in e.parents() {
            let hb = self
                .get_highest_before(p)?
                .ok_or(VectorError::OutOfOrder {
                    event: e.id(),
                    parent: *p,
                })?;
            parent_vecs.push(hb);
        }

        let branch = self.assign_branch(e, me_idx)?;
        let num_branches = self.branches.num_branches();

        let mut before = HighestBeforeSeq::with_size(num_branches);
        let mut after = LowestAfterSeq::with_size(num_branches);
        before.init_with_event(branch, e);
        after.init_with_event(branch, e);
        for hb in &parent_vecs {
            before.collect_from(hb, num_branches);
        }
        if self.at_least_one_fork() {
            self.detect_forks(&mut before);
        }

        self.mark_ancestors(e, branch)?;

        let id = e.id();
        self.set_highest_before(&id, before)?;
        self.set_lowest_after(&id, after)?;
        self.set_event_branch(&id, branch)?;
        Ok(())
    }

    /// Walks the ancestors of `e` (excluding `e`), recording `e` as their
    /// lowest descendant on `branch` where none is recorded yet.
    fn mark_ancestors<E: Event>(&mut self, e: &E, branch: BranchIdx) -> VectorResult<()> {
        let mut stack: Vec<EventId> = e.parents().to_vec();
        while let Some(walk) = stack.pop() {
            let mut la = self
                .get_lowest_after(&walk)?
                .ok_or(VectorError::EventNotFound(walk))?;
            if !la.visit(branch, e) {
                continue;
            }
            self.set_lowest_after(&walk, la)?;
            let walk_event = self
                .input
                .get_event(&walk)
                .ok_or(VectorError::EventNotFound(walk))?;
            stack.extend_from_slice(walk_event.parents());
        }
        Ok(())
    }

    /// Highest-before projected onto one entry per validator.
    pub fn merged_highest_before(&self, id: &EventId) -> VectorResult<HighestBeforeSeq> {
        let scattered = self
            .get_highest_before(id)?
            .ok_or(VectorError::EventNotFound(*id))?;
        if !self.at_least_one_fork() {
            return Ok(scattered);
        }
        let mut merged = HighestBeforeSeq::with_size(self.validators.len());
        for (creator, branches) in self.branches.by_creator.iter().enumerate() {
            merged.gather_from(creator as BranchIdx, &scattered, branches);
        }
        Ok(merged)
    }

    /// Persists pending vectors and the branch table.
    pub fn flush(&mut self) -> VectorResult<()> {
        self.save_branches()?;
        let res = self.db.flush().map_err(VectorError::from);
        self.check(res)
    }

    /// Discards vectors written since the last flush.
    pub fn drop_not_flushed(&mut self) -> VectorResult<()> {
        self.db.drop_not_flushed();
        self.cache.lock().purge();
        self.branches = self.load_or_init_branches()?;
        Ok(())
    }
}
