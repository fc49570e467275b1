//! Outbound port: what the election reads from the DAG.

use shared_types::{EventId, Frame};

use crate::domain::RootAndSlot;
use crate::errors::ElectionError;

/// DAG view consulted while counting votes.
///
/// Passed into every [`Election::process_root`] call rather than stored.
/// Read failures abort the call with `Self::Error`; no vote is cast.
///
/// [`Election::process_root`]: crate::Election::process_root
pub trait ElectionSource {
    type Error: From<ElectionError>;

    /// Whether `b` observes `a` by quorum (`a` forkless-causes `b`).
    fn forkless_cause(&self, a: &EventId, b: &EventId) -> Result<bool, Self::Error>;

    /// Roots of `frame`, in a deterministic order.
    fn frame_roots(&self, frame: Frame) -> Result<Vec<RootAndSlot>, Self::Error>;
}
