//! # Errors
//!
//! Every election error means the input contradicts the aBFT assumptions:
//! roots fed out of order, or more than a third of the weight is Byzantine.

use shared_types::{EventId, Frame, ValidatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    /// An observed root holds no vote for an undecided subject.
    #[error("Root {observer} has no vote for validator {subject}; roots processed out of order? (new root {root})")]
    MissingVote {
        root: EventId,
        observer: EventId,
        subject: ValidatorId,
    },

    /// Forkless-caused by two fork roots of one validator.
    #[error("Forkless caused by 2 fork roots of validator {validator} at frame {frame}: more than 1/3W is Byzantine")]
    ForkedRoots { frame: Frame, validator: ValidatorId },

    /// The new root does not observe a quorum of previous-frame roots.
    #[error("Root {root} is not forkless caused by 2/3W of frame {frame} roots")]
    NoQuorum { root: EventId, frame: Frame },
}

pub type ElectionResult<T> = Result<T, ElectionError>;
