//! # Orderer Benchmarks
//!
//! Full pipeline per event: indexing, framing, roots, election and block
//! application, replayed from a recorded DAG into a fresh engine.

use criterion::{black_box, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::harness::{Application, TestNode};
use shared_testkit::gen_nodes;
use shared_types::{BaseEvent, Validators};

/// Events built and accepted by a reference node, frames stamped.
fn recorded(validators: usize, cheaters: usize, events_per_node: usize) -> (Validators, Vec<BaseEvent>) {
    let nodes = gen_nodes(validators);
    let set = Validators::equal(&nodes).unwrap_or_default();
    let mut node = TestNode::genesis(1, &set, Application::new());
    let mut rng = StdRng::seed_from_u64(validators as u64);
    let events = node.run_epoch(&nodes, &nodes[..cheaters], events_per_node, 3, 3, &mut rng);
    (set, events)
}

pub fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("hx-04-process");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for (n, cheaters) in [(5usize, 0usize), (20, 0), (20, 5)] {
        let (validators, events) = recorded(n, cheaters, 30);
        let label = format!("{n}v-{cheaters}c");

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::new("replay", &label), &events, |b, events| {
            b.iter_batched(
                || TestNode::genesis(1, &validators, Application::new()),
                |mut node| {
                    for e in events {
                        let _ = node.feed(e);
                    }
                    black_box(node.last_decided_frame())
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

pub fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("hx-04-build");
    let (validators, events) = recorded(10, 0, 30);

    let mut node = TestNode::genesis(1, &validators, Application::new());
    let (head, tail) = events.split_at(events.len() - 1);
    for e in head {
        let _ = node.feed(e);
    }
    let template = tail[0].clone();

    group.bench_function("build_next", |b| {
        b.iter(|| {
            let mut e = template.clone();
            black_box(node.lachesis.build(&mut e).is_ok())
        })
    });

    group.finish();
}
