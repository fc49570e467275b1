//! # aBFT Orderer (hx-04)
//!
//! Turns a stream of DAG events into a totally ordered sequence of decided
//! frames. Each decided frame has one Atropos; the events it confirms form
//! the frame's block.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`Lachesis`] | frames, roots, election feeding, block application, epoch sealing |
//! | [`Store`] | last decided state, epoch state, roots and confirmations |
//! | [`DagIndexer`] | port to the vector index (implemented by [`VectorIndex`]) |
//! | [`AbftConfig`] | frame check switch and cache sizes |
//!
//! ## Decision Flow
//!
//! ```text
//! process(e) ─► index e ─► frame(e) ─► root? ─► Roots[f][creator]
//!                                          └─► Election::process_root
//!                                                  │ Decision{frame, atropos}
//!                                                  ▼
//!                              begin_block ─► confirm subgraph ─► end_block
//!                                                  │ new validators?
//!                                                  ▼
//!                                 seal epoch  |  election.reset(frame + 1)
//! ```
//!
//! [`VectorIndex`]: hx_02_vector_index::VectorIndex

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;
pub mod store;

pub use config::{AbftConfig, StoreConfig};
pub use domain::{
    ApplyEventFn, BeginBlockFn, Block, BlockCallbacks, ConsensusCallbacks, EndBlockFn,
    EpochDbLoadedFn, EpochState, LastDecidedState,
};
pub use errors::{AbftError, AbftResult};
pub use ports::outbound::DagIndexer;
pub use service::Lachesis;
pub use store::{epoch_db_name, Store};
