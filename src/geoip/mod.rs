//! Geolocation enrichment.
//!
//! Enrichment is layered: an offline MaxMind dataset when available, a
//! remote lookup API as a bounded fallback, and a clearly-flagged synthetic
//! tier that only fires when real coverage stays below a threshold. The
//! dataset handles live in an explicit [`GeoDatabases`] value passed into
//! the enrichment stage; there is no process-wide reader state.

mod api;
mod download;
mod resolver;
mod synthetic;

pub use download::ensure_dataset;
pub use resolver::{GeoResolver, LocalDatabaseStrategy, RemoteApiStrategy, ResolveStrategy};
pub use synthetic::apply_synthetic_fallback;

use std::net::IpAddr;
use std::path::Path;

use maxminddb::Reader;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error_handling::DatabaseError;
use crate::storage::models::{GeoRecord, GeoSource};
use crate::storage::{backfill_asn, list_missing_asn};

/// Handles on the offline geolocation datasets.
///
/// Either reader may be absent: a missing or unreadable dataset disables
/// that lookup with a degraded-mode warning instead of failing the run.
pub struct GeoDatabases {
    city: Option<Reader<Vec<u8>>>,
    asn: Option<Reader<Vec<u8>>>,
}

impl GeoDatabases {
    /// Opens the datasets found at the given paths, best-effort.
    pub async fn open(city_path: Option<&Path>, asn_path: Option<&Path>) -> Self {
        let city = match city_path {
            Some(path) => open_reader(path, "city").await,
            None => None,
        };
        let asn = match asn_path {
            Some(path) => open_reader(path, "ASN").await,
            None => None,
        };
        GeoDatabases { city, asn }
    }

    /// A handle with no datasets loaded; every lookup misses.
    #[allow(dead_code)] // Used in tests
    pub fn disabled() -> Self {
        GeoDatabases {
            city: None,
            asn: None,
        }
    }

    pub fn city_available(&self) -> bool {
        self.city.is_some()
    }

    pub fn asn_available(&self) -> bool {
        self.asn.is_some()
    }

    /// Build date of the city dataset, if loaded.
    pub fn version(&self) -> Option<String> {
        self.city
            .as_ref()
            .map(|reader| reader.metadata.build_epoch.to_string())
    }

    /// Looks up city-level geolocation (and ASN, when that dataset is also
    /// loaded) for an address.
    pub fn lookup_city(&self, address: &str) -> Option<GeoRecord> {
        let reader = self.city.as_ref()?;
        let ip: IpAddr = address.parse().ok()?;

        let lookup = reader.lookup(ip).ok()?;
        if !lookup.has_data() {
            return None;
        }
        let city: maxminddb::geoip2::City = match lookup.decode() {
            Ok(Some(city)) => city,
            _ => return None,
        };

        let country = city
            .country
            .names
            .english
            .map(|s| s.to_string())
            .or_else(|| city.country.iso_code.map(|s| s.to_string()));
        let city_name = city.city.names.english.map(|s| s.to_string()).or_else(|| {
            city.subdivisions
                .first()
                .and_then(|s| s.names.english)
                .map(|s| s.to_string())
        });

        Some(GeoRecord {
            address: address.to_string(),
            country,
            city: city_name,
            latitude: city.location.latitude,
            longitude: city.location.longitude,
            asn: self.lookup_asn(address),
            source: GeoSource::Local,
        })
    }

    /// Looks up the ASN for an address, formatted as `AS<number>`.
    pub fn lookup_asn(&self, address: &str) -> Option<String> {
        let reader = self.asn.as_ref()?;
        let ip: IpAddr = address.parse().ok()?;

        let lookup = reader.lookup(ip).ok()?;
        if !lookup.has_data() {
            return None;
        }
        match lookup.decode::<maxminddb::geoip2::Asn>() {
            Ok(Some(asn)) => asn
                .autonomous_system_number
                .map(|number| format!("AS{number}")),
            _ => None,
        }
    }
}

async fn open_reader(path: &Path, kind: &str) -> Option<Reader<Vec<u8>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!(
                "GeoIP {kind} dataset not available at {} ({e}); continuing without it",
                path.display()
            );
            return None;
        }
    };
    match Reader::from_source(bytes) {
        Ok(reader) => {
            log::info!("Loaded GeoIP {kind} dataset from {}", path.display());
            Some(reader)
        }
        Err(e) => {
            log::warn!(
                "Failed to parse GeoIP {kind} dataset at {} ({e}); continuing without it",
                path.display()
            );
            None
        }
    }
}

/// Prepares the offline datasets for a run: downloads missing files from
/// the public mirror when enabled, then opens whatever is present.
pub async fn init_geoip(config: &Config, client: &reqwest::Client) -> GeoDatabases {
    if config.download_geoip {
        for (path, url) in [
            (&config.geoip_city, crate::config::GEOIP_CITY_MIRROR_URL),
            (&config.geoip_asn, crate::config::GEOIP_ASN_MIRROR_URL),
        ] {
            if let Some(path) = path {
                if let Err(e) = ensure_dataset(client, path, url).await {
                    log::warn!("Could not download {}: {e}", path.display());
                }
            }
        }
    }
    GeoDatabases::open(config.geoip_city.as_deref(), config.geoip_asn.as_deref()).await
}

/// Fills missing ASN values in existing geolocation rows from the offline
/// ASN dataset. Idempotent; never overwrites a non-null ASN.
pub async fn backfill_asn_pass(
    pool: &SqlitePool,
    databases: &GeoDatabases,
) -> Result<usize, DatabaseError> {
    if !databases.asn_available() {
        return Ok(0);
    }
    let mut updated = 0;
    for address in list_missing_asn(pool).await? {
        if let Some(asn) = databases.lookup_asn(&address) {
            if backfill_asn(pool, &address, &asn).await? {
                updated += 1;
            }
        }
    }
    if updated > 0 {
        log::info!("Backfilled ASN for {updated} address(es)");
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_paths_yields_disabled_handles() {
        let databases = GeoDatabases::open(
            Some(Path::new("nonexistent/GeoLite2-City.mmdb")),
            Some(Path::new("nonexistent/GeoLite2-ASN.mmdb")),
        )
        .await;
        assert!(!databases.city_available());
        assert!(!databases.asn_available());
        assert!(databases.version().is_none());
    }

    #[tokio::test]
    async fn test_garbage_file_is_rejected_not_fatal() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("bogus.mmdb");
        tokio::fs::write(&path, b"not a maxmind database")
            .await
            .expect("write");
        let databases = GeoDatabases::open(Some(&path), None).await;
        assert!(!databases.city_available());
    }

    #[test]
    fn test_disabled_lookups_miss() {
        let databases = GeoDatabases::disabled();
        assert!(databases.lookup_city("8.8.8.8").is_none());
        assert!(databases.lookup_asn("8.8.8.8").is_none());
    }

    #[test]
    fn test_invalid_address_misses() {
        let databases = GeoDatabases::disabled();
        assert!(databases.lookup_city("not-an-address").is_none());
    }

    #[tokio::test]
    async fn test_backfill_pass_without_asn_dataset_is_noop() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .expect("pool");
        crate::storage::run_migrations(&pool).await.expect("schema");
        let updated = backfill_asn_pass(&pool, &GeoDatabases::disabled())
            .await
            .expect("pass");
        assert_eq!(updated, 0);
    }
}
