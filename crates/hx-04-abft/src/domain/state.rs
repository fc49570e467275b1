//! Persistent orderer state.

use serde::{Deserialize, Serialize};

use shared_types::{Epoch, Frame, Validators};

/// Highest decided frame of the current epoch, 0 before the first decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastDecidedState {
    pub last_decided_frame: Frame,
}

/// Current epoch and its validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochState {
    pub epoch: Epoch,
    pub validators: Validators,
}
