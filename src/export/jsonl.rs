//! JSONL export.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::fetch_export_rows;

/// Exports the store as JSONL (one object per line) to `output`, or stdout
/// when `None`.
///
/// Returns the number of records written.
pub async fn export_jsonl(pool: &SqlitePool, output: Option<&Path>) -> Result<usize> {
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
    let mut writer = BufWriter::new(writer);

    let mut written = 0;
    for row in &rows {
        let line = serde_json::to_string(row)
            .with_context(|| format!("Failed to serialize row for {}", row.address))?;
        writeln!(writer, "{line}").context("Failed to write JSONL output")?;
        written += 1;
    }

    writer.flush().context("Failed to flush JSONL output")?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::seeded_pool;

    #[tokio::test]
    async fn test_export_jsonl_one_object_per_line() {
        let pool = seeded_pool().await;
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("export.jsonl");

        let written = export_jsonl(&pool, Some(&path)).await.expect("export");
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).expect("read export");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(first["address"], "203.0.113.5");
        assert_eq!(first["country"], "Brazil");
        assert_eq!(first["geo_source"], "local");
    }
}
