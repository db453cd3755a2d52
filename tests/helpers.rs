// Shared test helpers for ingestion fixtures.
//
// Builds temporary input files and configurations used across the
// integration tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use badip_tracker::Config;

/// Writes a list file with the given lines into `dir` and returns its path.
#[allow(dead_code)] // Used by other test files
pub fn write_list_file(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).expect("Failed to write fixture file");
    path
}

/// A configuration wired entirely to temporary paths with every network
/// tier disabled: no remote lists, no feeds, no offline datasets, no API
/// budget. Tests opt back into individual pieces.
#[allow(dead_code)] // Used by other test files
pub fn offline_config(dir: &TempDir, input: PathBuf) -> Config {
    Config {
        file: input,
        extra_files: Vec::new(),
        fetch_remote: false,
        ingest_feeds: false,
        db_path: dir.path().join("badips.db"),
        geoip_city: None,
        geoip_asn: None,
        download_geoip: false,
        api_enrich_limit: 0,
        synthetic_threshold: 0,
        ..Default::default()
    }
}
