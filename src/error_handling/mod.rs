//! Error handling utilities.
//!
//! Defines the failure taxonomy: typed errors for initialization and
//! persistence, recoverable per-source error kinds, and the run-level
//! statistics tracker.

mod stats;
mod types;

pub use stats::IngestStats;
pub use types::{DatabaseError, InitializationError, SourceErrorKind};
