// storage/mod.rs
// Database operations module

pub mod insert;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

// Re-export commonly used items
pub use insert::{
    add_occurrences, backfill_asn, insert_geo_record, insert_run_metadata, record_category,
    update_run_stats, upsert_threat,
};
pub use migrations::run_migrations;
pub use models::{
    AggregateStats, GeoRecord, GeoSource, RunCounts, ThreatDetail, ThreatRecord, UpsertOutcome,
};
pub use pool::init_db_pool_with_path;
pub use queries::{
    aggregate_stats, count_geolocated, list_missing_asn, list_unenriched, lookup_threat,
    reset_store,
};
