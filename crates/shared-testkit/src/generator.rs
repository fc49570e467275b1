//! Random DAG generator.
//!
//! Creators take turns in round-robin order. Each new event gets its
//! creator's last event as self-parent plus the last events of
//! `parent_count - 1` other random creators. Cheaters may instead pick an
//! older self-parent (or none), producing forks, until they have forked
//! `forks_count` times.

use rand::seq::SliceRandom;
use rand::Rng;
use sha3::{Digest, Keccak256};
use std::collections::HashMap;

use shared_types::entities::EVENT_ID_TAIL_LEN;
use shared_types::names;
use shared_types::{BaseEvent, Event, EventId, MutableEvent, ValidatorId};

/// Callbacks invoked by the generator for every new event.
pub trait EventHandler {
    /// Called before the id is assigned; returning `false` skips the event.
    fn build(&mut self, _event: &mut BaseEvent, _name: &str) -> bool {
        true
    }

    /// Called once the event is final and recorded.
    fn process(&mut self, _event: &BaseEvent, _name: &str) {}
}

/// Returns `n` validator ids (1..=n) named `a`, `b`, ...
pub fn gen_nodes(n: usize) -> Vec<ValidatorId> {
    (0..n)
        .map(|i| {
            let id = i as ValidatorId + 1;
            names::set_node_name(id, node_letter(i).to_string());
            id
        })
        .collect()
}

fn node_letter(i: usize) -> char {
    char::from_u32('a' as u32 + i as u32).unwrap_or('?')
}

/// Derives an id from the event's content (epoch and lamport in front).
pub fn calc_event_id(e: &BaseEvent) -> EventId {
    let mut hasher = Keccak256::new();
    hasher.update(e.epoch.to_be_bytes());
    hasher.update(e.seq.to_be_bytes());
    hasher.update(e.frame.to_be_bytes());
    hasher.update(e.creator.to_be_bytes());
    hasher.update(e.lamport.to_be_bytes());
    hasher.update([u8::from(e.is_root)]);
    for p in &e.parents {
        hasher.update(p.as_bytes());
    }
    let digest = hasher.finalize();
    let mut tail = [0u8; EVENT_ID_TAIL_LEN];
    tail.copy_from_slice(&digest[..EVENT_ID_TAIL_LEN]);
    EventId::from_parts(e.epoch, e.lamport, &tail)
}

/// Generates `event_count` events per node without forks.
pub fn for_each_rand_event<R: Rng>(
    nodes: &[ValidatorId],
    event_count: usize,
    parent_count: usize,
    rng: &mut R,
    handler: &mut impl EventHandler,
) -> HashMap<ValidatorId, Vec<BaseEvent>> {
    for_each_rand_fork(nodes, &[], event_count, parent_count, 0, rng, handler)
}

/// Generates `event_count` events per node; `cheaters` may fork up to
/// `forks_count` times each.
pub fn for_each_rand_fork<R: Rng>(
    nodes: &[ValidatorId],
    cheaters: &[ValidatorId],
    event_count: usize,
    parent_count: usize,
    forks_count: usize,
    rng: &mut R,
    handler: &mut impl EventHandler,
) -> HashMap<ValidatorId, Vec<BaseEvent>> {
    let mut events: HashMap<ValidatorId, Vec<BaseEvent>> =
        nodes.iter().map(|&n| (n, Vec::new())).collect();
    if nodes.is_empty() {
        return events;
    }
    let others_count = parent_count.saturating_sub(1).min(nodes.len() - 1);

    for i in 0..nodes.len() * event_count {
        let self_idx = i % nodes.len();
        let creator = nodes[self_idx];

        let mut others: Vec<usize> = (0..nodes.len()).filter(|&n| n != self_idx).collect();
        others.shuffle(rng);
        others.truncate(others_count);

        let mut e = BaseEvent {
            creator,
            ..Default::default()
        };

        let own = &events[&creator];
        let mut self_parent = own.last();
        if let Some(last) = own.last() {
            let forks_already = own.len() - last.seq as usize;
            if cheaters.contains(&creator) && forks_already < forks_count {
                let from = rng.gen_range(0..=own.len());
                self_parent = own.get(from);
            }
        }
        match self_parent {
            None => {
                e.set_seq(1);
                e.set_lamport(1);
            }
            Some(p) => {
                e.set_seq(p.seq + 1);
                e.set_lamport(p.lamport + 1);
                e.parents.push(p.id);
            }
        }

        for other in others {
            if let Some(p) = events[&nodes[other]].last() {
                e.parents.push(p.id);
                if e.lamport <= p.lamport {
                    e.lamport = p.lamport + 1;
                }
            }
        }

        let name = format!("{}{:03}", node_letter(self_idx), events[&creator].len());
        if !handler.build(&mut e, &name) {
            continue;
        }
        e.set_id(calc_event_id(&e));
        names::set_event_name(e.id(), name.clone());

        if let Some(list) = events.get_mut(&creator) {
            list.push(e.clone());
        }
        handler.process(&e, &name);
    }
    events
}
