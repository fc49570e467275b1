//! # Errors
//!
//! Error type of the orderer and its store.

use hx_01_flushable_kv::KvError;
use hx_02_vector_index::VectorError;
use hx_03_election::ElectionError;
use shared_types::{Epoch, EventId, Frame, TypesError, ValidatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbftError {
    /// The event belongs to another epoch.
    #[error("Event {event} of epoch {event_epoch} is not relevant to epoch {epoch}")]
    NotRelevant {
        event: EventId,
        event_epoch: Epoch,
        epoch: Epoch,
    },

    /// The creator is not in the current validator set.
    #[error("Event {event} created by non-validator {creator}")]
    Auth { event: EventId, creator: ValidatorId },

    #[error("Already bootstrapped")]
    AlreadyBootstrapped,

    #[error("Not bootstrapped")]
    NotBootstrapped,

    /// No epoch state in the store.
    #[error("Genesis is not applied")]
    NoGenesis,

    #[error("Genesis already applied (epoch {epoch})")]
    GenesisAlreadyApplied { epoch: Epoch },

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The stamped frame or root flag differs from the computed one.
    #[error("Event {event} claims frame {claimed_frame} (root {claimed_root}), computed frame {frame} (root {is_root})")]
    WrongFrame {
        event: EventId,
        claimed_frame: Frame,
        claimed_root: bool,
        frame: Frame,
        is_root: bool,
    },

    #[error("Frame {frame} decided after frame {last_decided}")]
    FrameAlreadyDecided { frame: Frame, last_decided: Frame },

    /// Epoch-scoped tables accessed with no epoch database open.
    #[error("Epoch database is not open")]
    EpochDbClosed,

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Election(#[from] ElectionError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl From<bincode::Error> for AbftError {
    fn from(err: bincode::Error) -> Self {
        AbftError::Serialization {
            message: err.to_string(),
        }
    }
}

impl AbftError {
    /// Storage and decode failures, which go through the crit hook.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AbftError::Kv(_)
                | AbftError::Serialization { .. }
                | AbftError::Vector(VectorError::Kv(_))
                | AbftError::Vector(VectorError::Serialization { .. })
        )
    }
}

pub type AbftResult<T> = Result<T, AbftError>;
