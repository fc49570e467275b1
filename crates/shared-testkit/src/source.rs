//! In-memory event source shared between an engine and its test driver.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{BaseEvent, EventId, EventSource};

/// Cloneable handle to a shared map of events.
#[derive(Clone, Default)]
pub struct MemoryEventSource {
    events: Arc<RwLock<HashMap<EventId, BaseEvent>>>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, event: BaseEvent) {
        self.events.write().insert(event.id, event);
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSource for MemoryEventSource {
    type Event = BaseEvent;

    fn has_event(&self, id: &EventId) -> bool {
        self.events.read().contains_key(id)
    }

    fn get_event(&self, id: &EventId) -> Option<BaseEvent> {
        self.events.read().get(id).cloned()
    }
}
