//! # Errors
//!
//! Error types for the flushable key-value layer.

use thiserror::Error;

/// Errors raised by key-value stores, wrappers and producers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// Backend I/O failure.
    #[error("KV store I/O error: {message}")]
    Io { message: String },

    /// A database carries a dirty flush marker: the process stopped in the
    /// middle of a flush.
    #[error("Database {db} is in dirty state (interrupted flush {flush_id})")]
    DirtyState { db: String, flush_id: String },

    /// Databases carry different flush markers, or not the expected one.
    #[error("Databases are not synced: {details}")]
    DbsNotSynced { details: String },

    /// Database names are restricted to `[a-z0-9_-]`, 1 to 64 bytes.
    #[error("Invalid database name: {name:?}")]
    InvalidDatabaseName { name: String },

    /// Operation on a database that is not open.
    #[error("Unknown database: {name}")]
    UnknownDatabase { name: String },

    /// Encoding or decoding of a stored value failed.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl KvError {
    pub fn io(message: impl Into<String>) -> Self {
        KvError::Io {
            message: message.into(),
        }
    }
}

/// Result alias for key-value operations.
pub type KvResult<T> = Result<T, KvError>;
