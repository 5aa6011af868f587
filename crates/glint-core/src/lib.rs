//! glint core
//!
//! Shared utilities for the glint crates: logging setup, profiling hooks,
//! fast hash collections, math re-exports and plain geometry types.

pub mod alloc;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
