//! # Vector Index
//!
//! [`VectorEngine`] plus the forkless-cause relation.
//!
//! `forkless_cause(a, b)` holds when `b` observes `a` through a quorum of
//! validators, none of which `b` sees forking:
//!
//! ```text
//! for each branch br of validator v:
//!     low  = LowestAfter(a)[br]      lowest event on br observing a
//!     high = HighestBefore(b)[br]    events on br observed by b
//!     low != 0 && high.min_seq <= low <= high.seq && !fork(high)  → count v
//! ```
//!
//! Results are memoised per `(a, b)` pair until the next reset.

use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

use hx_01_flushable_kv::KeyValueStore;
use shared_types::{BranchIdx, Crit, Event, EventId, EventSource, Validators};

use crate::config::VectorIndexConfig;
use crate::domain::{BranchesInfo, HighestBeforeSeq};
use crate::engine::{cache_size, VectorEngine};
use crate::errors::{VectorError, VectorResult};

/// Vector engine with a memoised forkless-cause query.
pub struct VectorIndex<S> {
    engine: VectorEngine<S>,
    fc_cache: Mutex<LruCache<(EventId, EventId), bool>>,
}

impl<S: EventSource> VectorIndex<S> {
    pub fn new(input: S, config: &VectorIndexConfig, crit: Crit) -> Self {
        Self {
            engine: VectorEngine::new(input, config, crit),
            fc_cache: Mutex::new(LruCache::new(cache_size(config.forkless_cause_pairs))),
        }
    }

    /// Rebinds the index to a new epoch and forgets memoised results.
    pub fn reset(&mut self, validators: &Validators, db: Arc<dyn KeyValueStore>) -> VectorResult<()> {
        self.fc_cache.lock().clear();
        self.engine.reset(validators, db)
    }

    pub fn add<E: Event>(&mut self, e: &E) -> VectorResult<()> {
        self.engine.add(e)
    }

    pub fn flush(&mut self) -> VectorResult<()> {
        self.engine.flush()
    }

    pub fn drop_not_flushed(&mut self) -> VectorResult<()> {
        self.fc_cache.lock().clear();
        self.engine.drop_not_flushed()
    }

    pub fn merged_highest_before(&self, id: &EventId) -> VectorResult<HighestBeforeSeq> {
        self.engine.merged_highest_before(id)
    }

    pub fn validators(&self) -> &Validators {
        self.engine.validators()
    }

    pub fn branches(&self) -> &BranchesInfo {
        self.engine.branches()
    }

    pub fn engine(&self) -> &VectorEngine<S> {
        &self.engine
    }

    /// Whether `b` observes `a` by quorum without observing forks on the
    /// counted branches. Missing vectors are reported to crit and returned.
    pub fn forkless_cause(&self, a: &EventId, b: &EventId) -> VectorResult<bool> {
        if let Some(&res) = self.fc_cache.lock().get(&(*a, *b)) {
            return Ok(res);
        }
        let res = self.compute_forkless_cause(a, b).inspect_err(|err| {
            // storage failures were reported on read
            if matches!(err, VectorError::EventNotFound(_)) {
                self.engine.crit().report(err);
            }
        })?;
        self.fc_cache.lock().put((*a, *b), res);
        Ok(res)
    }

    fn compute_forkless_cause(&self, a: &EventId, b: &EventId) -> VectorResult<bool> {
        let hb = self
            .engine
            .get_highest_before(b)?
            .ok_or(VectorError::EventNotFound(*b))?;

        if self.engine.at_least_one_fork() {
            let a_branch = self
                .engine
                .get_event_branch(a)?
                .ok_or(VectorError::EventNotFound(*a))?;
            if hb.is_fork_detected(a_branch) {
                trace!(a = %a, b = %b, "forkless cause: creator of a seen forking");
                return Ok(false);
            }
        }

        let la = self
            .engine
            .get_lowest_after(a)?
            .ok_or(VectorError::EventNotFound(*a))?;

        let branches = self.engine.branches();
        let mut yes = self.engine.validators().new_counter();
        for (idx, meta) in branches.branches.iter().enumerate() {
            let branch = idx as BranchIdx;
            let low = la.get(branch);
            let high = hb.get(branch);
            if low != 0 && high.min_seq <= low && low <= high.seq && !high.is_fork_detected() {
                // one creator may qualify on several branches
                yes.count_by_idx(meta.creator);
            }
        }
        Ok(yes.has_quorum())
    }
}
