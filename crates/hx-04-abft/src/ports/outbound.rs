//! # Outbound Ports
//!
//! The DAG index the orderer consults for observation queries.

use std::sync::Arc;

use hx_01_flushable_kv::KeyValueStore;
use hx_02_vector_index::HighestBeforeSeq;
use shared_types::{Event, EventId, Validators};

use crate::errors::AbftResult;

/// Incremental index over the events of one epoch.
///
/// Writes made by `add` stay pending until `flush`; `drop_not_flushed`
/// reverts them.
pub trait DagIndexer {
    fn add<E: Event>(&mut self, e: &E) -> AbftResult<()>;

    fn flush(&mut self) -> AbftResult<()>;

    fn drop_not_flushed(&mut self) -> AbftResult<()>;

    /// Rebinds the index to a new epoch table.
    fn reset(&mut self, validators: &Validators, db: Arc<dyn KeyValueStore>) -> AbftResult<()>;

    /// Whether `b` observes `a` by quorum. Fails when either vector is
    /// unreadable.
    fn forkless_cause(&self, a: &EventId, b: &EventId) -> AbftResult<bool>;

    /// One entry per validator in canonical order.
    fn merged_highest_before(&self, id: &EventId) -> AbftResult<HighestBeforeSeq>;
}
