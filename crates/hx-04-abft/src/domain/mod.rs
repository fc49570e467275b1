//! Orderer domain values.

pub mod block;
pub mod state;

pub use block::{
    ApplyEventFn, BeginBlockFn, Block, BlockCallbacks, ConsensusCallbacks, EndBlockFn,
    EpochDbLoadedFn,
};
pub use state::{EpochState, LastDecidedState};
