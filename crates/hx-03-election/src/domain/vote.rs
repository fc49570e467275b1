//! Roots, slots and votes.

use serde::{Deserialize, Serialize};
use std::fmt;

use shared_types::{EventId, Frame, ValidatorId};

/// Position of a root: its frame and creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub frame: Frame,
    pub validator: ValidatorId,
}

/// A root event together with its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootAndSlot {
    pub id: EventId,
    pub slot: Slot,
}

impl RootAndSlot {
    pub fn new(id: EventId, frame: Frame, validator: ValidatorId) -> Self {
        Self {
            id,
            slot: Slot { frame, validator },
        }
    }
}

impl fmt::Display for RootAndSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{}",
            self.id, self.slot.frame, self.slot.validator
        )
    }
}

/// Vote of one root about one subject validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    /// The subject's root at the election frame, as observed.
    Yes(EventId),
    No,
}

impl VoteValue {
    pub fn is_yes(&self) -> bool {
        matches!(self, VoteValue::Yes(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Undecided(VoteValue),
    /// Backed by a quorum; final unless more than 1/3W is Byzantine.
    Decided(VoteValue),
}

impl Vote {
    pub fn value(&self) -> VoteValue {
        match *self {
            Vote::Undecided(v) | Vote::Decided(v) => v,
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, Vote::Decided(_))
    }
}

/// Outcome of a frame's election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub frame: Frame,
    pub atropos: EventId,
}
