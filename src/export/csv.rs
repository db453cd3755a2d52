//! CSV export.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use sqlx::SqlitePool;

use super::fetch_export_rows;

/// Exports the store as CSV to `output`, or stdout when `None`.
///
/// Returns the number of records written.
pub async fn export_csv(pool: &SqlitePool, output: Option<&Path>) -> Result<usize> {
    let rows = fetch_export_rows(pool)
        .await
        .context("Failed to query export rows")?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut csv_writer = Writer::from_writer(writer);

    csv_writer
        .write_record([
            "address",
            "severity",
            "occurrence_count",
            "first_seen",
            "last_updated",
            "country",
            "city",
            "latitude",
            "longitude",
            "asn",
            "geo_source",
        ])
        .context("Failed to write CSV header")?;

    let mut written = 0;
    for row in &rows {
        let record = [
            row.address.clone(),
            row.severity.to_string(),
            row.occurrence_count.to_string(),
            row.first_seen.to_string(),
            row.last_updated.to_string(),
            row.country.clone().unwrap_or_default(),
            row.city.clone().unwrap_or_default(),
            row.latitude.map(|v| v.to_string()).unwrap_or_default(),
            row.longitude.map(|v| v.to_string()).unwrap_or_default(),
            row.asn.clone().unwrap_or_default(),
            row.geo_source.clone().unwrap_or_default(),
        ];
        csv_writer
            .write_record(&record)
            .with_context(|| format!("Failed to write CSV row for {}", row.address))?;
        written += 1;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(written)
}
