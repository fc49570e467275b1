//! # Error Types
//!
//! Errors raised while constructing shared domain values.

use thiserror::Error;

/// Errors that can occur while building shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// The summed weight of a validator set does not fit the weight type.
    #[error("Validator weights overflow: total exceeds {max}")]
    WeightOverflow { max: u32 },

    /// A validator set must contain at least one validator with weight.
    #[error("Validator set is empty")]
    EmptyValidators,
}

/// Result alias for shared type construction.
pub type TypesResult<T> = Result<T, TypesError>;
