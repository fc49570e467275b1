//! # Helios aBFT Benchmarks
//!
//! | Group | Workload |
//! |-------|----------|
//! | hx-01-flushable | cached puts, batch flush, reads of pending data |
//! | hx-01-synced-pool | marker protocol across databases |
//! | hx-02-vector-index | indexing, forkless cause with and without forks |
//! | hx-04-process | full event pipeline up to block application |
//! | hx-04-build | frame stamping of a new event |

use criterion::{criterion_group, criterion_main};

use hx_tests::benchmarks::{flushable_kv, lachesis, vector_index};

criterion_group!(
    benches,
    flushable_kv::bench_flushable,
    flushable_kv::bench_synced_pool,
    vector_index::bench_vector_index,
    lachesis::bench_process,
    lachesis::bench_build,
);

criterion_main!(benches);
