//! # Errors
//!
//! Error types for the vector index.

use hx_01_flushable_kv::KvError;
use shared_types::{EventId, ValidatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorError {
    /// A parent was not indexed before its child.
    #[error("Event {event} processed out of order: parent {parent} not indexed")]
    OutOfOrder { event: EventId, parent: EventId },

    /// No vectors or event data for this id.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The creator is not part of the current validator set.
    #[error("Event {event} created by unknown validator {creator}")]
    UnknownCreator { event: EventId, creator: ValidatorId },

    /// Stored branch data contradicts itself.
    #[error("Inconsistent vector DB: {message}")]
    InconsistentDb { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error(transparent)]
    Kv(#[from] KvError),
}

impl From<bincode::Error> for VectorError {
    fn from(err: bincode::Error) -> Self {
        VectorError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type VectorResult<T> = Result<T, VectorError>;
