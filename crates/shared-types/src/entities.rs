//! # Core Domain Entities
//!
//! Numeric identifiers of the DAG and the 32-byte event identifier.
//!
//! ## Clusters
//!
//! - **Counters**: `Epoch`, `Frame`, `Seq`, `Lamport`
//! - **Validators**: `ValidatorId`, `ValidatorIdx`, `Weight`, `BranchIdx`
//! - **Events**: [`EventId`]

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::endian::bigendian;
use crate::names;

// =============================================================================
// CLUSTER A: COUNTERS
// =============================================================================

/// Epoch number. Validator sets are fixed within an epoch.
pub type Epoch = u32;

/// Frame number within an epoch.
pub type Frame = u32;

/// Per-creator sequence number, starting at 1.
pub type Seq = u32;

/// Lamport timestamp of an event.
pub type Lamport = u32;

/// First epoch of a freshly started network.
pub const FIRST_EPOCH: Epoch = 1;

/// First frame of every epoch.
pub const FIRST_FRAME: Frame = 1;

// =============================================================================
// CLUSTER B: VALIDATORS
// =============================================================================

/// Stable validator identifier.
pub type ValidatorId = u32;

/// Dense 0-based position of a validator in the canonical order of a set.
pub type ValidatorIdx = u32;

/// Index into the branch table of the vector engine. The first
/// `num_validators` branches coincide with validator indexes.
pub type BranchIdx = u32;

/// Voting weight of a validator.
pub type Weight = u32;

// =============================================================================
// CLUSTER C: EVENTS
// =============================================================================

/// Length of an [`EventId`] in bytes.
pub const EVENT_ID_LEN: usize = 32;

/// Length of the hash-derived tail of an [`EventId`].
pub const EVENT_ID_TAIL_LEN: usize = 24;

/// 32-byte event identifier.
///
/// Layout: `[0..4)` epoch (big-endian), `[4..8)` lamport (big-endian),
/// `[8..32)` hash-derived bytes. Byte order therefore sorts ids by
/// `(epoch, lamport, tail)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EventId(pub [u8; EVENT_ID_LEN]);

impl EventId {
    /// The all-zero identifier.
    pub const ZERO: EventId = EventId([0u8; EVENT_ID_LEN]);

    /// Assembles an id from its epoch, lamport and hash-derived tail.
    pub fn from_parts(epoch: Epoch, lamport: Lamport, tail: &[u8; EVENT_ID_TAIL_LEN]) -> Self {
        let mut bytes = [0u8; EVENT_ID_LEN];
        bytes[0..4].copy_from_slice(&bigendian::u32_to_bytes(epoch));
        bytes[4..8].copy_from_slice(&bigendian::u32_to_bytes(lamport));
        bytes[8..].copy_from_slice(tail);
        EventId(bytes)
    }

    /// Reads an id from a byte slice of exactly [`EVENT_ID_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; EVENT_ID_LEN] = bytes.try_into().ok()?;
        Some(EventId(arr))
    }

    pub fn epoch(&self) -> Epoch {
        bigendian::bytes_to_u32(&self.0[0..4])
    }

    pub fn lamport(&self) -> Lamport {
        bigendian::bytes_to_u32(&self.0[4..8])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; EVENT_ID_LEN]
    }

    /// Short form used in logs: `epoch:lamport:hex(bytes 8..12)`.
    pub fn short(&self) -> String {
        format!(
            "{}:{}:{}",
            self.epoch(),
            self.lamport(),
            hex::encode(&self.0[8..12])
        )
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match names::event_name(self) {
            Some(name) => f.write_str(&name),
            None => f.write_str(&self.short()),
        }
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
