//! CLI command handlers.

pub mod analyze;
pub mod batch;
pub mod graph;
pub mod transform;
