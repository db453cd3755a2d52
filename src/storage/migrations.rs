// storage/migrations.rs
// Schema creation

use sqlx::{Pool, Sqlite};

/// Creates the schema if it does not exist. Idempotent; safe to run at the
/// start of every ingestion.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS threats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT UNIQUE NOT NULL,
            severity INTEGER NOT NULL DEFAULT 3,
            first_seen INTEGER NOT NULL,
            last_updated INTEGER NOT NULL,
            occurrence_count INTEGER NOT NULL DEFAULT 1
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS geolocation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT UNIQUE NOT NULL,
            country TEXT,
            city TEXT,
            latitude REAL,
            longitude REAL,
            asn TEXT,
            source TEXT NOT NULL DEFAULT 'local',
            created_at INTEGER NOT NULL,
            FOREIGN KEY (address) REFERENCES threats(address)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS threat_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL,
            category TEXT NOT NULL,
            count INTEGER NOT NULL DEFAULT 1,
            UNIQUE (address, category),
            FOREIGN KEY (address) REFERENCES threats(address)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS runs (
            run_id TEXT PRIMARY KEY,
            version TEXT,
            start_time INTEGER NOT NULL,
            end_time INTEGER,
            candidates INTEGER,
            inserted INTEGER,
            updated INTEGER,
            enriched INTEGER,
            sources_failed INTEGER,
            elapsed_seconds REAL,
            geoip_version TEXT
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_threats_severity ON threats(severity)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_geolocation_country ON geolocation(country)")
        .execute(pool)
        .await?;

    Ok(())
}
