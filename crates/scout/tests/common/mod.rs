//! Test infrastructure for the scout integration tests.
//!
//! Provides a recording mock transport, an in-memory searchable record type
//! and canned cluster responses.

#![allow(dead_code)]

pub mod fixtures;
pub mod transport;

// Re-export commonly used items
pub use fixtures::*;
pub use transport::*;
