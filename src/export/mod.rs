//! Export functionality.
//!
//! Exports the joined threat + geolocation view to CSV (flattened, for
//! spreadsheets) or JSONL (one object per line, for programmatic access),
//! ordered by detection count descending.

mod csv;
mod jsonl;

pub use self::csv::export_csv;
pub use jsonl::export_jsonl;

use clap::ValueEnum;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;

/// Export format options.
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Flattened CSV for Excel/Sheets
    Csv,
    /// One JSON object per line
    Jsonl,
}

/// One row of the export view.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub address: String,
    pub severity: i64,
    pub occurrence_count: i64,
    pub first_seen: i64,
    pub last_updated: i64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub asn: Option<String>,
    pub geo_source: Option<String>,
}

/// Fetches the full export view, most-detected addresses first.
pub(crate) async fn fetch_export_rows(pool: &SqlitePool) -> Result<Vec<ExportRow>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT t.address, t.severity, t.occurrence_count, t.first_seen, t.last_updated,
                g.country, g.city, g.latitude, g.longitude, g.asn, g.source
         FROM threats t
         LEFT JOIN geolocation g ON t.address = g.address
         ORDER BY t.occurrence_count DESC, t.address",
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(rows
        .into_iter()
        .map(|row| ExportRow {
            address: row.get(0),
            severity: row.get(1),
            occurrence_count: row.get(2),
            first_seen: row.get(3),
            last_updated: row.get(4),
            country: row.get(5),
            city: row.get(6),
            latitude: row.get(7),
            longitude: row.get(8),
            asn: row.get(9),
            geo_source: row.get(10),
        })
        .collect())
}
