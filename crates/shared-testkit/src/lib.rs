//! # Shared Test Kit
//!
//! Tooling for exercising the consensus core on generated DAGs:
//!
//! - [`gen_nodes`] - validator ids with registered debug names
//! - [`for_each_rand_fork`] / [`for_each_rand_event`] - random DAG generator,
//!   optionally with forking creators
//! - [`shuffle_parents_first`] - random topological reordering
//! - [`MemoryEventSource`] - shared in-memory [`EventSource`]
//!
//! [`EventSource`]: shared_types::EventSource

mod generator;
mod ordering;
mod source;

pub use generator::{
    calc_event_id, for_each_rand_event, for_each_rand_fork, gen_nodes, EventHandler,
};
pub use ordering::shuffle_parents_first;
pub use source::MemoryEventSource;
