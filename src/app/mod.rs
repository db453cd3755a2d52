//! Application support modules: logger setup and user-facing reporting.

pub mod logging;
pub mod statistics;

pub use logging::init_logger_with;
pub use statistics::{print_aggregate_stats, print_threat_detail};
