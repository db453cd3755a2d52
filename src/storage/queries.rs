//! Read-side queries: enrichment work lists, aggregate statistics, and the
//! single-address lookup behind the `search` subcommand.

use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;

use super::models::{AggregateStats, GeoRecord, GeoSource, ThreatDetail, ThreatRecord};

/// How many entries the top-N aggregate lists carry.
const TOP_N: i64 = 10;

/// Returns addresses that have a threat record but no geolocation row.
///
/// Order is arbitrary but stable (by address) and capped to bound the
/// volume of downstream enrichment calls.
pub async fn list_unenriched(
    pool: &SqlitePool,
    limit: usize,
) -> Result<Vec<String>, DatabaseError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT t.address
         FROM threats t
         LEFT JOIN geolocation g ON t.address = g.address
         WHERE g.address IS NULL
         ORDER BY t.address
         LIMIT ?",
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(rows)
}

/// Returns addresses whose geolocation row lacks an ASN.
pub async fn list_missing_asn(pool: &SqlitePool) -> Result<Vec<String>, DatabaseError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT address FROM geolocation
         WHERE asn IS NULL OR asn = ''
         ORDER BY address",
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(rows)
}

/// Counts addresses that have any geolocation row.
pub async fn count_geolocated(pool: &SqlitePool) -> Result<i64, DatabaseError> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM geolocation")
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::SqlError)
}

/// Looks up one address, joining its geolocation row if present.
pub async fn lookup_threat(
    pool: &SqlitePool,
    address: &str,
) -> Result<Option<ThreatDetail>, DatabaseError> {
    let row = sqlx::query(
        "SELECT t.address, t.severity, t.first_seen, t.last_updated, t.occurrence_count,
                g.country, g.city, g.latitude, g.longitude, g.asn, g.source
         FROM threats t
         LEFT JOIN geolocation g ON t.address = g.address
         WHERE t.address = ?",
    )
    .bind(address)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let threat = ThreatRecord {
        address: row.get::<String, _>(0),
        severity: row.get::<i64, _>(1) as u8,
        first_seen: row.get::<i64, _>(2),
        last_updated: row.get::<i64, _>(3),
        occurrence_count: row.get::<i64, _>(4),
    };

    // The geolocation side of the join is NULL when no row exists; the
    // `source` column is NOT NULL in the table, so it marks presence.
    let geo = row
        .get::<Option<String>, _>(10)
        .and_then(|source| GeoSource::from_str(&source))
        .map(|source| GeoRecord {
            address: threat.address.clone(),
            country: row.get::<Option<String>, _>(5),
            city: row.get::<Option<String>, _>(6),
            latitude: row.get::<Option<f64>, _>(7),
            longitude: row.get::<Option<f64>, _>(8),
            asn: row.get::<Option<String>, _>(9),
            source,
        });

    Ok(Some(ThreatDetail { threat, geo }))
}

/// Recomputes the derived reporting view from the store.
pub async fn aggregate_stats(pool: &SqlitePool) -> Result<AggregateStats, DatabaseError> {
    let total_threats = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threats")
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::SqlError)?;

    let countries_affected = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT country) FROM geolocation WHERE country IS NOT NULL",
    )
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    let geolocated = count_geolocated(pool).await?;

    let synthetic_rows =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM geolocation WHERE source = 'synthetic'")
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::SqlError)?;

    let average_severity =
        sqlx::query_scalar::<_, Option<f64>>("SELECT AVG(severity) FROM threats")
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::SqlError)?
            .unwrap_or(0.0);

    let severity_distribution = sqlx::query_as::<_, (i64, i64)>(
        "SELECT severity, COUNT(*) FROM threats GROUP BY severity ORDER BY severity",
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?
    .into_iter()
    .map(|(severity, count)| (severity as u8, count))
    .collect();

    let top_countries = top_geolocation_counts(pool, "country").await?;
    let top_asns = top_geolocation_counts(pool, "asn").await?;
    let top_cities = top_geolocation_counts(pool, "city").await?;

    Ok(AggregateStats {
        total_threats,
        countries_affected,
        geolocated,
        synthetic_rows,
        average_severity,
        severity_distribution,
        top_countries,
        top_asns,
        top_cities,
    })
}

/// Top-N non-null values of one geolocation column with their counts.
async fn top_geolocation_counts(
    pool: &SqlitePool,
    column: &str,
) -> Result<Vec<(String, i64)>, DatabaseError> {
    // Column names cannot be bound; this is only ever called with fixed
    // identifiers from aggregate_stats.
    let sql = format!(
        "SELECT {column}, COUNT(*) as n
         FROM geolocation
         WHERE {column} IS NOT NULL AND {column} != ''
         GROUP BY {column}
         ORDER BY n DESC
         LIMIT {TOP_N}"
    );
    sqlx::query_as::<_, (String, i64)>(&sql)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::SqlError)
}

/// Administrative full clear of the store. Deletes every threat,
/// geolocation, category, and run row; only reachable from the explicit
/// `reset` subcommand.
pub async fn reset_store(pool: &SqlitePool) -> Result<(), DatabaseError> {
    for table in ["geolocation", "threat_categories", "threats", "runs"] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await
            .map_err(DatabaseError::SqlError)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::insert::{insert_geo_record, upsert_threat};
    use crate::storage::migrations::run_migrations;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    async fn seed_threat_with_geo(pool: &SqlitePool, address: &str, country: &str, severity: u8) {
        upsert_threat(pool, address, severity).await.expect("upsert");
        insert_geo_record(
            pool,
            &GeoRecord {
                address: address.to_string(),
                country: Some(country.to_string()),
                city: Some("City".to_string()),
                latitude: Some(0.0),
                longitude: Some(0.0),
                asn: Some("AS64500".to_string()),
                source: GeoSource::Local,
            },
        )
        .await
        .expect("geo insert");
    }

    #[tokio::test]
    async fn test_list_unenriched_honors_cap_and_order() {
        let pool = test_pool().await;
        for n in 1..=5 {
            upsert_threat(&pool, &format!("10.0.0.{n}"), 3)
                .await
                .expect("upsert");
        }
        seed_threat_with_geo(&pool, "10.0.0.9", "United States", 3).await;

        let unenriched = list_unenriched(&pool, 3).await.expect("list");
        assert_eq!(unenriched.len(), 3);
        assert_eq!(unenriched, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        let all = list_unenriched(&pool, 100).await.expect("list all");
        assert_eq!(all.len(), 5);
        assert!(!all.contains(&"10.0.0.9".to_string()));
    }

    #[tokio::test]
    async fn test_list_missing_asn() {
        let pool = test_pool().await;
        upsert_threat(&pool, "10.0.1.1", 3).await.expect("upsert");
        insert_geo_record(
            &pool,
            &GeoRecord {
                address: "10.0.1.1".to_string(),
                country: Some("Brazil".to_string()),
                city: None,
                latitude: None,
                longitude: None,
                asn: None,
                source: GeoSource::Api,
            },
        )
        .await
        .expect("geo insert");
        seed_threat_with_geo(&pool, "10.0.1.2", "Brazil", 3).await;

        let missing = list_missing_asn(&pool).await.expect("list");
        assert_eq!(missing, vec!["10.0.1.1"]);
    }

    #[tokio::test]
    async fn test_lookup_threat_joins_geo() {
        let pool = test_pool().await;
        seed_threat_with_geo(&pool, "10.0.2.1", "Mexico", 4).await;
        upsert_threat(&pool, "10.0.2.2", 2).await.expect("upsert");

        let with_geo = lookup_threat(&pool, "10.0.2.1")
            .await
            .expect("lookup")
            .expect("exists");
        assert_eq!(with_geo.threat.severity, 4);
        let geo = with_geo.geo.expect("geo present");
        assert_eq!(geo.country.as_deref(), Some("Mexico"));
        assert_eq!(geo.source, GeoSource::Local);

        let without_geo = lookup_threat(&pool, "10.0.2.2")
            .await
            .expect("lookup")
            .expect("exists");
        assert!(without_geo.geo.is_none());

        let absent = lookup_threat(&pool, "10.0.2.3").await.expect("lookup");
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn test_aggregate_stats() {
        let pool = test_pool().await;
        seed_threat_with_geo(&pool, "10.0.3.1", "China", 5).await;
        seed_threat_with_geo(&pool, "10.0.3.2", "China", 1).await;
        seed_threat_with_geo(&pool, "10.0.3.3", "Brazil", 3).await;
        upsert_threat(&pool, "10.0.3.4", 3).await.expect("upsert");

        let stats = aggregate_stats(&pool).await.expect("stats");
        assert_eq!(stats.total_threats, 4);
        assert_eq!(stats.countries_affected, 2);
        assert_eq!(stats.geolocated, 3);
        assert_eq!(stats.synthetic_rows, 0);
        assert!((stats.average_severity - 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.severity_distribution, vec![(1, 1), (3, 2), (5, 1)]);
        assert_eq!(stats.top_countries[0], ("China".to_string(), 2));
    }

    #[tokio::test]
    async fn test_aggregate_stats_empty_store() {
        let pool = test_pool().await;
        let stats = aggregate_stats(&pool).await.expect("stats");
        assert_eq!(stats.total_threats, 0);
        assert_eq!(stats.average_severity, 0.0);
        assert!(stats.severity_distribution.is_empty());
        assert!(stats.top_countries.is_empty());
    }

    #[tokio::test]
    async fn test_reset_store_clears_everything() {
        let pool = test_pool().await;
        seed_threat_with_geo(&pool, "10.0.4.1", "Iran", 5).await;
        reset_store(&pool).await.expect("reset");

        let stats = aggregate_stats(&pool).await.expect("stats");
        assert_eq!(stats.total_threats, 0);
        assert_eq!(stats.geolocated, 0);
    }
}
