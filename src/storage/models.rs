// storage/models.rs
// Database models and types

/// A persisted threat record, keyed by canonical address.
///
/// `severity` only ever rises across merges and `occurrence_count` is
/// monotonically non-decreasing; both invariants are enforced by the upsert
/// statement, not by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatRecord {
    pub address: String,
    pub severity: u8,
    /// Milliseconds since Unix epoch, set once on first insert.
    pub first_seen: i64,
    /// Milliseconds since Unix epoch, refreshed on every re-observation.
    pub last_updated: i64,
    pub occurrence_count: i64,
}

/// Provenance of a geolocation row.
///
/// Synthetic rows are explicitly distinguishable so aggregate statistics
/// built on fabricated fallback data can be audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoSource {
    /// Offline dataset lookup.
    Local,
    /// Remote lookup service.
    Api,
    /// Fabricated fallback data (low confidence).
    Synthetic,
}

impl GeoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoSource::Local => "local",
            GeoSource::Api => "api",
            GeoSource::Synthetic => "synthetic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(GeoSource::Local),
            "api" => Some(GeoSource::Api),
            "synthetic" => Some(GeoSource::Synthetic),
            _ => None,
        }
    }
}

impl std::fmt::Display for GeoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geolocation metadata attached to a threat record.
///
/// Created once per address and never mutated, except ASN backfill into a
/// missing `asn`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub address: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `AS<number>` when known.
    pub asn: Option<String>,
    pub source: GeoSource,
}

/// Result of applying one `(address, severity)` observation to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Address was new; record created with occurrence count 1.
    Inserted,
    /// Address existed; severity max-merged, occurrence count incremented.
    Updated,
}

/// A threat record joined with its geolocation row, if any.
#[derive(Debug, Clone)]
pub struct ThreatDetail {
    pub threat: ThreatRecord,
    pub geo: Option<GeoRecord>,
}

/// Derived reporting view over the store. Recomputed on demand, never
/// hand-edited.
#[derive(Debug, Clone, Default)]
pub struct AggregateStats {
    pub total_threats: i64,
    pub countries_affected: i64,
    pub geolocated: i64,
    pub synthetic_rows: i64,
    pub average_severity: f64,
    /// `(severity, count)` pairs in ascending severity order.
    pub severity_distribution: Vec<(u8, i64)>,
    pub top_countries: Vec<(String, i64)>,
    pub top_asns: Vec<(String, i64)>,
    pub top_cities: Vec<(String, i64)>,
}

/// Counters persisted to the `runs` table when an ingestion run completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub candidates: i64,
    pub inserted: i64,
    pub updated: i64,
    pub enriched: i64,
    pub sources_failed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_source_round_trip() {
        for source in [GeoSource::Local, GeoSource::Api, GeoSource::Synthetic] {
            assert_eq!(GeoSource::from_str(source.as_str()), Some(source));
        }
        assert_eq!(GeoSource::from_str("guess"), None);
    }
}
