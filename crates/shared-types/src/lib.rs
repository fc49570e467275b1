//! # Shared Types Crate
//!
//! Domain entities shared by every subsystem of the engine.
//!
//! ## Contents
//!
//! - `entities` - numeric identifiers and the 32-byte [`EventId`]
//! - `event` - the [`Event`] / [`MutableEvent`] traits, [`BaseEvent`] and the
//!   [`EventSource`] port the engine reads the DAG through
//! - `validators` - weighted validator sets and the [`WeightCounter`]
//! - `endian` - fixed-width integer <-> byte helpers
//! - `names` - debug-only name dictionaries used by `Display`
//! - `crit` - the fatal-error hook storage layers report through
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers and event shape are defined once.
//! - **Deterministic ordering**: validator order and id order are total and
//!   independent of insertion order.

pub mod crit;
pub mod endian;
pub mod entities;
pub mod errors;
pub mod event;
pub mod names;
pub mod validators;

pub use crit::Crit;
pub use entities::*;
pub use errors::{TypesError, TypesResult};
pub use event::{BaseEvent, Event, EventSource, MutableEvent};
pub use validators::{Validators, ValidatorsBuilder, WeightCounter};
