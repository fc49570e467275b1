//! # Engine Benchmarks
//!
//! Criterion workloads per layer, registered in `benches/engine_benchmarks.rs`.

pub mod flushable_kv;
pub mod lachesis;
pub mod vector_index;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_testkit::{for_each_rand_fork, gen_nodes, EventHandler};
use shared_types::{BaseEvent, ValidatorId};

#[derive(Default)]
struct Collect(Vec<BaseEvent>);

impl EventHandler for Collect {
    fn build(&mut self, e: &mut BaseEvent, _name: &str) -> bool {
        e.epoch = 1;
        true
    }

    fn process(&mut self, e: &BaseEvent, _name: &str) {
        self.0.push(e.clone());
    }
}

/// Random DAG over `validators` nodes, parents first. Frames are not stamped.
pub fn random_dag(
    validators: usize,
    cheaters: usize,
    events_per_node: usize,
    seed: u64,
) -> (Vec<ValidatorId>, Vec<BaseEvent>) {
    let nodes = gen_nodes(validators);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Collect::default();
    for_each_rand_fork(
        &nodes,
        &nodes[..cheaters],
        events_per_node,
        3,
        3,
        &mut rng,
        &mut out,
    );
    (nodes, out.0)
}
