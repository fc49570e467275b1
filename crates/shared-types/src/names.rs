//! Debug-only name dictionaries.
//!
//! Tests and tooling may attach human readable names to event ids and
//! validator ids. Only `Display` consults them; consensus never does.
//!
//! The dictionaries exist with the `debug-names` feature only. Without it
//! registration is a no-op and ids always print in their short form.

use crate::entities::ValidatorId;

pub use registry::{event_name, set_event_name, set_node_name};

#[cfg(feature = "debug-names")]
mod registry {
    use lazy_static::lazy_static;
    use parking_lot::RwLock;
    use std::collections::HashMap;

    use crate::entities::{EventId, ValidatorId};

    lazy_static! {
        static ref EVENT_NAMES: RwLock<HashMap<EventId, String>> = RwLock::new(HashMap::new());
        static ref NODE_NAMES: RwLock<HashMap<ValidatorId, String>> = RwLock::new(HashMap::new());
    }

    pub fn set_event_name(id: EventId, name: impl Into<String>) {
        EVENT_NAMES.write().insert(id, name.into());
    }

    pub fn event_name(id: &EventId) -> Option<String> {
        EVENT_NAMES.read().get(id).cloned()
    }

    pub fn set_node_name(id: ValidatorId, name: impl Into<String>) {
        NODE_NAMES.write().insert(id, name.into());
    }

    pub(super) fn registered_node_name(id: ValidatorId) -> Option<String> {
        NODE_NAMES.read().get(&id).cloned()
    }
}

#[cfg(not(feature = "debug-names"))]
mod registry {
    use crate::entities::{EventId, ValidatorId};

    pub fn set_event_name(_id: EventId, _name: impl Into<String>) {}

    pub fn event_name(_id: &EventId) -> Option<String> {
        None
    }

    pub fn set_node_name(_id: ValidatorId, _name: impl Into<String>) {}

    pub(super) fn registered_node_name(_id: ValidatorId) -> Option<String> {
        None
    }
}

/// Registered name of a validator, or its numeric id.
pub fn node_name(id: ValidatorId) -> String {
    registry::registered_node_name(id).unwrap_or_else(|| id.to_string())
}
