//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the
//! application, including timeouts, batch limits, default paths, and the
//! fixed external source catalog.

use std::time::Duration;

/// Default SQLite database path.
pub const DB_PATH: &str = "./badips.db";

/// Default primary input list (one address per line, optional `,score`).
pub const DEFAULT_INPUT_FILE: &str = "badip_list.csv";

/// Severity assigned when a source carries no usable score.
pub const DEFAULT_SEVERITY: u8 = 3;

/// Raw score attached to addresses extracted from feed entries.
///
/// Feed mentions are weaker evidence than a blocklist hit, so they map to
/// the default severity tier rather than the top of the scale.
pub const FEED_RAW_SCORE: &str = "15";

/// Per-source read timeout. A stalled source must not block the others.
pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-request timeout for geolocation API lookups.
pub const GEO_API_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for downloading an offline geolocation dataset.
pub const GEO_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum number of addresses enriched via the remote API per run.
///
/// ip-api.com rate-limits free usage; this cap bounds external call volume.
pub const DEFAULT_API_ENRICH_LIMIT: usize = 100;

/// Cap on the enrichment work list pulled from the store per run.
pub const ENRICH_BATCH_LIMIT: usize = 5000;

/// Minimum number of geolocation rows expected after enrichment.
///
/// If fewer addresses than this have any geolocation at the end of a run
/// (no dataset, no network), the synthetic fallback tier fills the gap so
/// aggregate statistics stay non-empty.
pub const DEFAULT_SYNTHETIC_THRESHOLD: usize = 100;

/// Maximum addresses given synthetic geolocation in one fallback pass.
pub const SYNTHETIC_BATCH_LIMIT: usize = 500;

/// Default path for the offline city-level geolocation dataset.
pub const GEOIP_CITY_PATH: &str = "data/GeoLite2-City.mmdb";

/// Default path for the offline ASN dataset.
pub const GEOIP_ASN_PATH: &str = "data/GeoLite2-ASN.mmdb";

/// Public mirror for the city-level dataset.
pub const GEOIP_CITY_MIRROR_URL: &str =
    "https://raw.githubusercontent.com/P3TERX/GeoLite.mmdb/download/GeoLite2-City.mmdb";

/// Public mirror for the ASN dataset.
pub const GEOIP_ASN_MIRROR_URL: &str =
    "https://raw.githubusercontent.com/P3TERX/GeoLite.mmdb/download/GeoLite2-ASN.mmdb";

/// Geolocation API endpoint. The address is appended as a path segment.
pub const GEO_API_BASE_URL: &str = "http://ip-api.com/json";

/// Remote blocklists fetched when `--remote` is enabled.
pub const REMOTE_BLOCKLISTS: &[(&str, &str)] = &[
    (
        "stamparm_ipsum",
        "https://raw.githubusercontent.com/stamparm/ipsum/master/ipsum.txt",
    ),
    ("spamhaus_drop", "https://www.spamhaus.org/drop/drop.txt"),
    (
        "emerging_block_ips",
        "https://rules.emergingthreats.net/fwrules/emerging-Block-IPs.txt",
    ),
];

/// JSON feeds scanned for address mentions when `--feeds` is enabled.
pub const DEFAULT_FEEDS: &[&str] = &["https://hnrss.org/security?format=json"];

/// Optional file listing feed URLs, one per line (`#` comments allowed).
/// When present it replaces `DEFAULT_FEEDS`.
pub const FEEDS_FILE: &str = "data/feeds.txt";
