//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, source catalog)
//! - The library configuration struct and log option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
