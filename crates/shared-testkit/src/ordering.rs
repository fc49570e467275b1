//! Random parents-first reordering of a DAG.

use rand::Rng;
use std::collections::{HashMap, HashSet};

use shared_types::{BaseEvent, EventId};

/// Returns the events in a random order in which every event comes after
/// all of its parents that are part of `events`.
pub fn shuffle_parents_first<R: Rng>(events: &[BaseEvent], rng: &mut R) -> Vec<BaseEvent> {
    let known: HashSet<EventId> = events.iter().map(|e| e.id).collect();
    let mut children: HashMap<EventId, Vec<usize>> = HashMap::new();
    let mut waiting: Vec<usize> = Vec::with_capacity(events.len());

    for (i, e) in events.iter().enumerate() {
        let mut pending = 0;
        for p in e.parents.iter().filter(|p| known.contains(p)) {
            children.entry(*p).or_default().push(i);
            pending += 1;
        }
        waiting.push(pending);
    }

    let mut ready: Vec<usize> = (0..events.len()).filter(|&i| waiting[i] == 0).collect();
    let mut ordered = Vec::with_capacity(events.len());
    while !ready.is_empty() {
        let pick = ready.swap_remove(rng.gen_range(0..ready.len()));
        let e = &events[pick];
        if let Some(kids) = children.get(&e.id) {
            for &k in kids {
                waiting[k] -= 1;
                if waiting[k] == 0 {
                    ready.push(k);
                }
            }
        }
        ordered.push(e.clone());
    }
    ordered
}
