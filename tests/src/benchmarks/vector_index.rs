//! # Vector Index Benchmarks
//!
//! Indexing a random DAG and answering forkless-cause queries, with and
//! without forking validators.

use criterion::{black_box, BatchSize, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use hx_01_flushable_kv::MemoryStore;
use hx_02_vector_index::{VectorIndex, VectorIndexConfig};
use shared_testkit::MemoryEventSource;
use shared_types::{BaseEvent, Crit, Validators};

use super::random_dag;

fn indexed(validators: &Validators, events: &[BaseEvent]) -> VectorIndex<MemoryEventSource> {
    let source = MemoryEventSource::new();
    let mut index = VectorIndex::new(source.clone(), &VectorIndexConfig::default(), Crit::log_only());
    let _ = index.reset(validators, Arc::new(MemoryStore::new()));
    for e in events {
        source.insert(e.clone());
        let _ = index.add(e);
    }
    let _ = index.flush();
    index
}

pub fn bench_vector_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("hx-02-vector-index");

    for (n, cheaters) in [(10usize, 0usize), (10, 3), (50, 0)] {
        let (nodes, events) = random_dag(n, cheaters, 20, 7);
        let validators = Validators::equal(&nodes).unwrap_or_default();
        let label = format!("{n}v-{cheaters}c");

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::new("add_all", &label), &events, |b, events| {
            b.iter_batched(
                || events.clone(),
                |events| black_box(indexed(&validators, &events)),
                BatchSize::LargeInput,
            )
        });

        let index = indexed(&validators, &events);
        let pairs: Vec<_> = events
            .iter()
            .zip(events.iter().rev())
            .map(|(a, b)| (a.id, b.id))
            .collect();
        group.throughput(Throughput::Elements(pairs.len() as u64));
        group.bench_with_input(BenchmarkId::new("forkless_cause", &label), &pairs, |b, pairs| {
            b.iter(|| {
                pairs
                    .iter()
                    .filter(|(a, b)| index.forkless_cause(a, b).unwrap_or(false))
                    .count()
            })
        });
    }

    group.finish();
}
