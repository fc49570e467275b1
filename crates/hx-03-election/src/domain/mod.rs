//! Election values.

pub mod vote;

pub use vote::{Decision, RootAndSlot, Slot, Vote, VoteValue};
