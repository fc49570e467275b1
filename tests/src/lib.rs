//! # Helios aBFT Test Suite
//!
//! Unified test crate exercising the engine end to end.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # TestNode, recording Application, epoch driver
//! ├── benchmarks/       # Criterion workloads (run from benches/)
//! └── integration/
//!     ├── scenarios.rs      # random DAGs: honest, cheaters, sealing, reset
//!     ├── determinism.rs    # same events, different orders
//!     └── persistence.rs    # flush markers, restarts over a synced pool
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hx-tests
//! cargo test -p hx-tests --features rocksdb
//! RUST_LOG=hx_04_abft=debug cargo test -p hx-tests integration::scenarios
//!
//! # Benchmarks
//! cargo bench -p hx-tests
//! ```

pub mod benchmarks;
pub mod harness;
pub mod integration;
