//! Configuration types.
//!
//! This module defines enums and the library-facing configuration struct.
//! The struct carries no CLI dependencies so it can be constructed
//! programmatically; the binary layers clap on top of it.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::constants::{
    DB_PATH, DEFAULT_API_ENRICH_LIMIT, DEFAULT_INPUT_FILE, DEFAULT_SYNTHETIC_THRESHOLD,
};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use badip_tracker::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("badip_list.csv"),
///     fetch_remote: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary address list (one address per line, optional `,score`).
    pub file: PathBuf,

    /// Supplementary per-source files of the same shape.
    pub extra_files: Vec<PathBuf>,

    /// Fetch the configured remote blocklists.
    pub fetch_remote: bool,

    /// Scan the configured JSON feeds for address mentions.
    pub ingest_feeds: bool,

    /// Database path (SQLite file).
    pub db_path: PathBuf,

    /// Path to the offline city-level geolocation dataset, if any.
    pub geoip_city: Option<PathBuf>,

    /// Path to the offline ASN dataset, if any.
    pub geoip_asn: Option<PathBuf>,

    /// Download missing offline datasets from the public mirror.
    pub download_geoip: bool,

    /// Maximum addresses enriched via the remote API per run.
    pub api_enrich_limit: usize,

    /// Minimum geolocation coverage before the synthetic fallback fires.
    pub synthetic_threshold: usize,

    /// Log level.
    pub log_level: LogLevel,

    /// Log format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_INPUT_FILE),
            extra_files: Vec::new(),
            fetch_remote: false,
            ingest_feeds: false,
            db_path: PathBuf::from(DB_PATH),
            geoip_city: Some(PathBuf::from(crate::config::GEOIP_CITY_PATH)),
            geoip_asn: Some(PathBuf::from(crate::config::GEOIP_ASN_PATH)),
            download_geoip: false,
            api_enrich_limit: DEFAULT_API_ENRICH_LIMIT,
            synthetic_threshold: DEFAULT_SYNTHETIC_THRESHOLD,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
