//! # Integration Tests
//!
//! Flushable storage, vector index, election and orderer working together.

mod determinism;
mod persistence;
mod scenarios;
