//! # Events
//!
//! The shape of a DAG event as consumed by the consensus core, and the
//! read port through which the core looks events up.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{Epoch, EventId, Frame, Lamport, Seq, ValidatorId};

/// Read-only view of a DAG event.
pub trait Event {
    fn id(&self) -> EventId;
    fn epoch(&self) -> Epoch;
    fn seq(&self) -> Seq;
    fn frame(&self) -> Frame;
    fn creator(&self) -> ValidatorId;
    fn lamport(&self) -> Lamport;
    /// Parent ids, self-parent first when the event has one.
    fn parents(&self) -> &[EventId];
    fn is_root(&self) -> bool;

    /// The self-parent is the first parent of every event past seq 1.
    fn self_parent(&self) -> Option<EventId> {
        if self.seq() <= 1 {
            return None;
        }
        self.parents().first().copied()
    }

    fn is_self_parent(&self, id: &EventId) -> bool {
        self.self_parent().as_ref() == Some(id)
    }
}

/// Event whose consensus fields can be stamped by `build`.
pub trait MutableEvent: Event {
    fn set_id(&mut self, id: EventId);
    fn set_epoch(&mut self, epoch: Epoch);
    fn set_seq(&mut self, seq: Seq);
    fn set_frame(&mut self, frame: Frame);
    fn set_creator(&mut self, creator: ValidatorId);
    fn set_lamport(&mut self, lamport: Lamport);
    fn set_parents(&mut self, parents: Vec<EventId>);
    fn set_is_root(&mut self, is_root: bool);
}

/// Source of already processed events.
///
/// The engine requires events to arrive parents-first, so every parent of a
/// processed event is expected to be present here.
pub trait EventSource {
    type Event: Event;

    fn has_event(&self, id: &EventId) -> bool;
    fn get_event(&self, id: &EventId) -> Option<Self::Event>;
}

/// Plain event carrying only the consensus fields.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseEvent {
    pub id: EventId,
    pub epoch: Epoch,
    pub seq: Seq,
    pub frame: Frame,
    pub creator: ValidatorId,
    pub lamport: Lamport,
    pub parents: Vec<EventId>,
    pub is_root: bool,
}

impl Event for BaseEvent {
    fn id(&self) -> EventId {
        self.id
    }
    fn epoch(&self) -> Epoch {
        self.epoch
    }
    fn seq(&self) -> Seq {
        self.seq
    }
    fn frame(&self) -> Frame {
        self.frame
    }
    fn creator(&self) -> ValidatorId {
        self.creator
    }
    fn lamport(&self) -> Lamport {
        self.lamport
    }
    fn parents(&self) -> &[EventId] {
        &self.parents
    }
    fn is_root(&self) -> bool {
        self.is_root
    }
}

impl MutableEvent for BaseEvent {
    fn set_id(&mut self, id: EventId) {
        self.id = id;
    }
    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }
    fn set_seq(&mut self, seq: Seq) {
        self.seq = seq;
    }
    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }
    fn set_creator(&mut self, creator: ValidatorId) {
        self.creator = creator;
    }
    fn set_lamport(&mut self, lamport: Lamport) {
        self.lamport = lamport;
    }
    fn set_parents(&mut self, parents: Vec<EventId>) {
        self.parents = parents;
    }
    fn set_is_root(&mut self, is_root: bool) {
        self.is_root = is_root;
    }
}

impl fmt::Debug for BaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{id={}, creator={}, seq={}, frame={}, root={}, parents={:?}}}",
            self.id, self.creator, self.seq, self.frame, self.is_root, self.parents
        )
    }
}
