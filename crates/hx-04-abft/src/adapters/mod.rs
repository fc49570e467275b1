//! Adapters implementing the outbound ports.

pub mod vector_index;
