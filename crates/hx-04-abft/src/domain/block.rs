//! Blocks and the application callbacks that consume them.

use std::fmt;

use shared_types::{Epoch, EventId, Frame, ValidatorId, Validators};

/// A decided frame as handed to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub atropos: EventId,
    pub frame: Frame,
    /// Validators seen forking by the Atropos, in canonical order.
    pub cheaters: Vec<ValidatorId>,
}

pub type ApplyEventFn<E> = Box<dyn FnMut(&E) + Send>;
pub type EndBlockFn = Box<dyn FnOnce() -> Option<Validators> + Send>;
pub type BeginBlockFn<E> = Box<dyn FnMut(&Block) -> BlockCallbacks<E> + Send>;
pub type EpochDbLoadedFn = Box<dyn FnMut(Epoch) + Send>;

/// Per-block hooks returned by `begin_block`.
pub struct BlockCallbacks<E> {
    /// Called once per newly confirmed event.
    pub apply_event: Option<ApplyEventFn<E>>,
    /// Called after the last event; a returned set seals the epoch.
    pub end_block: Option<EndBlockFn>,
}

impl<E> Default for BlockCallbacks<E> {
    fn default() -> Self {
        Self {
            apply_event: None,
            end_block: None,
        }
    }
}

impl<E> fmt::Debug for BlockCallbacks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockCallbacks")
            .field("apply_event", &self.apply_event.is_some())
            .field("end_block", &self.end_block.is_some())
            .finish()
    }
}

/// Engine-level hooks installed at bootstrap.
pub struct ConsensusCallbacks<E> {
    pub begin_block: Option<BeginBlockFn<E>>,
    /// Called whenever an epoch database is (re)opened.
    pub epoch_db_loaded: Option<EpochDbLoadedFn>,
}

impl<E> Default for ConsensusCallbacks<E> {
    fn default() -> Self {
        Self {
            begin_block: None,
            epoch_db_loaded: None,
        }
    }
}

impl<E> fmt::Debug for ConsensusCallbacks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsensusCallbacks")
            .field("begin_block", &self.begin_block.is_some())
            .field("epoch_db_loaded", &self.epoch_db_loaded.is_some())
            .finish()
    }
}
