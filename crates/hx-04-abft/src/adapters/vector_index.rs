//! [`DagIndexer`] over the branch-aware [`VectorIndex`].

use std::sync::Arc;

use hx_01_flushable_kv::KeyValueStore;
use hx_02_vector_index::{HighestBeforeSeq, VectorIndex};
use shared_types::{Event, EventId, EventSource, Validators};

use crate::errors::AbftResult;
use crate::ports::outbound::DagIndexer;

impl<S: EventSource> DagIndexer for VectorIndex<S> {
    fn add<E: Event>(&mut self, e: &E) -> AbftResult<()> {
        Ok(VectorIndex::add(self, e)?)
    }

    fn flush(&mut self) -> AbftResult<()> {
        Ok(VectorIndex::flush(self)?)
    }

    fn drop_not_flushed(&mut self) -> AbftResult<()> {
        Ok(VectorIndex::drop_not_flushed(self)?)
    }

    fn reset(&mut self, validators: &Validators, db: Arc<dyn KeyValueStore>) -> AbftResult<()> {
        Ok(VectorIndex::reset(self, validators, db)?)
    }

    fn forkless_cause(&self, a: &EventId, b: &EventId) -> AbftResult<bool> {
        Ok(VectorIndex::forkless_cause(self, a, b)?)
    }

    fn merged_highest_before(&self, id: &EventId) -> AbftResult<HighestBeforeSeq> {
        Ok(VectorIndex::merged_highest_before(self, id)?)
    }
}
