//! Database write operations.
//!
//! All writes use parameterized queries. The threat upsert is a single
//! statement so SQLite's writer serialization is enough to preserve the
//! max-severity and occurrence-count invariants under concurrent callers;
//! a duplicate address is not an error, it is the update path.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

use super::models::{GeoRecord, RunCounts, UpsertOutcome};

/// Applies one `(address, severity)` observation to the store.
///
/// Absent addresses are inserted with `occurrence_count = 1` and both
/// timestamps set to now. Existing addresses keep the maximum of the stored
/// and offered severity, gain one occurrence, and refresh `last_updated`;
/// `first_seen` is never touched.
pub async fn upsert_threat(
    pool: &SqlitePool,
    address: &str,
    severity: u8,
) -> Result<UpsertOutcome, DatabaseError> {
    let now = Utc::now().timestamp_millis();
    let occurrence_count = sqlx::query_scalar::<_, i64>(
        "INSERT INTO threats (address, severity, first_seen, last_updated, occurrence_count)
         VALUES (?, ?, ?, ?, 1)
         ON CONFLICT(address) DO UPDATE SET
             severity = MAX(severity, excluded.severity),
             occurrence_count = occurrence_count + 1,
             last_updated = excluded.last_updated
         RETURNING occurrence_count",
    )
    .bind(address)
    .bind(severity as i64)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    if occurrence_count == 1 {
        Ok(UpsertOutcome::Inserted)
    } else {
        Ok(UpsertOutcome::Updated)
    }
}

/// Adds extra observations for an address already upserted in this run.
///
/// Used when several sources contributed the same address within one run:
/// the merged record is upserted once, then the remaining contributions are
/// counted here.
pub async fn add_occurrences(
    pool: &SqlitePool,
    address: &str,
    extra: u32,
) -> Result<(), DatabaseError> {
    if extra == 0 {
        return Ok(());
    }
    let now = Utc::now().timestamp_millis();
    sqlx::query(
        "UPDATE threats
         SET occurrence_count = occurrence_count + ?, last_updated = ?
         WHERE address = ?",
    )
    .bind(extra as i64)
    .bind(now)
    .bind(address)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(())
}

/// Inserts a geolocation row for an address.
///
/// Enrichment is write-once: a conflicting insert is silently ignored and
/// the function reports whether a row was actually created. Re-running
/// enrichment therefore never produces a second row or mutates an existing
/// one.
pub async fn insert_geo_record(
    pool: &SqlitePool,
    record: &GeoRecord,
) -> Result<bool, DatabaseError> {
    let now = Utc::now().timestamp_millis();
    let result = sqlx::query(
        "INSERT INTO geolocation (address, country, city, latitude, longitude, asn, source, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(address) DO NOTHING",
    )
    .bind(&record.address)
    .bind(&record.country)
    .bind(&record.city)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(&record.asn)
    .bind(record.source.as_str())
    .bind(now)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(result.rows_affected() == 1)
}

/// Patches the ASN of a geolocation row that lacks one.
///
/// Never overwrites a non-null ASN; idempotent.
pub async fn backfill_asn(
    pool: &SqlitePool,
    address: &str,
    asn: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "UPDATE geolocation SET asn = ? WHERE address = ? AND (asn IS NULL OR asn = '')",
    )
    .bind(asn)
    .bind(address)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(result.rows_affected() == 1)
}

/// Records a category tag for an address, bumping the count on repeats.
pub async fn record_category(
    pool: &SqlitePool,
    address: &str,
    category: &str,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO threat_categories (address, category, count)
         VALUES (?, ?, 1)
         ON CONFLICT(address, category) DO UPDATE SET count = count + 1",
    )
    .bind(address)
    .bind(category)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(())
}

/// Inserts or refreshes run metadata at the start of an ingestion run.
pub async fn insert_run_metadata(
    pool: &SqlitePool,
    run_id: &str,
    start_time: i64,
    version: &str,
    geoip_version: Option<&str>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO runs (run_id, version, start_time, geoip_version)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(run_id) DO UPDATE SET
             version = excluded.version,
             start_time = excluded.start_time,
             geoip_version = excluded.geoip_version",
    )
    .bind(run_id)
    .bind(version)
    .bind(start_time)
    .bind(geoip_version)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(())
}

/// Updates run statistics when an ingestion run completes.
pub async fn update_run_stats(
    pool: &SqlitePool,
    run_id: &str,
    counts: &RunCounts,
    elapsed_seconds: f64,
) -> Result<(), DatabaseError> {
    let end_time = Utc::now().timestamp_millis();
    sqlx::query(
        "UPDATE runs
         SET end_time = ?, candidates = ?, inserted = ?, updated = ?,
             enriched = ?, sources_failed = ?, elapsed_seconds = ?
         WHERE run_id = ?",
    )
    .bind(end_time)
    .bind(counts.candidates)
    .bind(counts.inserted)
    .bind(counts.updated)
    .bind(counts.enriched)
    .bind(counts.sources_failed)
    .bind(elapsed_seconds)
    .bind(run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(())
}
