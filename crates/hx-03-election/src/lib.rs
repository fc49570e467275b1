//! # Atropos Election (hx-03)
//!
//! Per-frame election of the Atropos, the root that finalises a frame.
//!
//! ## Flow
//!
//! ```text
//! orderer ── process_root(root, source) ──→ Election ──→ Option<Decision>
//!                                              │
//!                          forkless_cause / frame_roots
//!                                              ↓
//!                                       ElectionSource (port)
//! ```
//!
//! The election never reads storage itself; the orderer passes its DAG view
//! with every call.

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

pub use domain::{Decision, RootAndSlot, Slot, Vote, VoteValue};
pub use errors::{ElectionError, ElectionResult};
pub use ports::outbound::ElectionSource;
pub use service::Election;
