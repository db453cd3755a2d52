//! badip_tracker library: malicious-IP aggregation and enrichment
//!
//! This library ingests IP addresses associated with malicious activity
//! from multiple untrusted sources (local list files, remote blocklists,
//! security-news feeds), merges them with max-severity precedence, persists
//! them idempotently in a SQLite store, and enriches stored addresses with
//! geolocation and ASN metadata through a layered resolution chain.
//!
//! # Example
//!
//! ```no_run
//! use badip_tracker::{Config, run_ingest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("badip_list.csv"),
//!     fetch_remote: true,
//!     ..Default::default()
//! };
//!
//! let report = run_ingest(config).await?;
//! println!("{} new, {} updated, {} enriched",
//!          report.new_addresses, report.updated_addresses, report.enriched);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call library functions within an async context.

mod app;
pub mod config;
mod error_handling;
pub mod export;
mod geoip;
mod merge;
mod severity;
mod source;
mod storage;

// Re-export public API
pub use app::{init_logger_with, print_aggregate_stats, print_threat_detail};
pub use config::{Config, LogFormat, LogLevel};
pub use run::{run_ingest, IngestReport};
pub use storage::{
    aggregate_stats, init_db_pool_with_path, lookup_threat, reset_store, run_migrations,
    AggregateStats, GeoRecord, GeoSource, ThreatDetail, ThreatRecord,
};

// Internal run module (contains the main ingestion logic)
mod run {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use chrono::Utc;
    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{info, warn};

    use crate::config::{
        Config, ENRICH_BATCH_LIMIT, FEEDS_FILE, REMOTE_BLOCKLISTS, SOURCE_TIMEOUT,
        SYNTHETIC_BATCH_LIMIT,
    };
    use crate::error_handling::{IngestStats, SourceErrorKind};
    use crate::geoip::{apply_synthetic_fallback, backfill_asn_pass, init_geoip, GeoResolver};
    use crate::merge::merge_candidates;
    use crate::severity::map_score;
    use crate::source::{load_feed_urls, read_source, Candidate, SourceResult, SourceSpec};
    use crate::storage::models::{RunCounts, UpsertOutcome};
    use crate::storage::{
        add_occurrences, init_db_pool_with_path, insert_geo_record, insert_run_metadata,
        list_unenriched, record_category, run_migrations, update_run_stats, upsert_threat,
    };

    /// Results of one ingestion run.
    #[derive(Debug, Clone)]
    pub struct IngestReport {
        /// Run identifier (format: `run_<timestamp_millis>`)
        pub run_id: String,
        /// Path to the SQLite database containing results
        pub db_path: PathBuf,
        /// Raw candidate pairs contributed by all sources
        pub candidates: usize,
        /// Distinct addresses after the merge
        pub distinct_addresses: usize,
        /// Addresses inserted for the first time
        pub new_addresses: usize,
        /// Addresses already present whose record was refreshed
        pub updated_addresses: usize,
        /// Geolocation rows created from real data (local dataset or API)
        pub enriched: usize,
        /// Geolocation rows created by the synthetic fallback tier
        pub synthetic: usize,
        /// Geolocation rows whose missing ASN was backfilled
        pub asn_backfilled: usize,
        /// Sources that contributed results
        pub sources_succeeded: usize,
        /// Sources skipped after a transport or decode failure
        pub sources_failed: usize,
        /// Per-address remote enrichment lookups that failed
        pub api_lookup_failures: usize,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs one ingestion with the provided configuration.
    ///
    /// Reads all configured sources in parallel, merges the candidates with
    /// max-severity precedence, applies them to the store, and enriches
    /// unresolved addresses through the layered geolocation chain.
    ///
    /// # Errors
    ///
    /// Returns an error only for unrecoverable conditions: the store cannot
    /// be opened or created, or a store write fails mid-run. Source and
    /// enrichment failures are recovered locally and reported in the
    /// returned [`IngestReport`].
    pub async fn run_ingest(config: Config) -> Result<IngestReport> {
        let start_time = std::time::Instant::now();

        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to open or create the threat store")?;
        run_migrations(pool.as_ref())
            .await
            .context("Failed to create the threat store schema")?;

        let client = reqwest::Client::builder()
            .timeout(SOURCE_TIMEOUT)
            .user_agent(concat!("badip_tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to initialize HTTP client")?;

        let geo_databases = Arc::new(init_geoip(&config, &client).await);

        let start_time_epoch = Utc::now().timestamp_millis();
        let run_id = format!("run_{start_time_epoch}");
        info!("Starting run: {run_id}");

        insert_run_metadata(
            pool.as_ref(),
            &run_id,
            start_time_epoch,
            env!("CARGO_PKG_VERSION"),
            geo_databases.version().as_deref(),
        )
        .await
        .context("Failed to insert run metadata")?;

        let stats = Arc::new(IngestStats::new());

        let mut specs: Vec<SourceSpec> = vec![SourceSpec::File(config.file.clone())];
        specs.extend(config.extra_files.iter().cloned().map(SourceSpec::File));
        if config.fetch_remote {
            specs.extend(
                REMOTE_BLOCKLISTS
                    .iter()
                    .map(|(name, url)| SourceSpec::RemoteList {
                        name: name.to_string(),
                        url: url.to_string(),
                    }),
            );
        }
        if config.ingest_feeds {
            specs.extend(
                load_feed_urls(Path::new(FEEDS_FILE))
                    .into_iter()
                    .map(|url| SourceSpec::Feed { url }),
            );
        }

        // One task per source: sources are independent and a stalled one
        // must not block the others.
        let mut tasks = FuturesUnordered::new();
        for spec in specs {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                let label = spec.label();
                match tokio::time::timeout(SOURCE_TIMEOUT, read_source(&spec, &client)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("{label}: skipped (timed out)");
                        SourceResult {
                            label,
                            result: Err(SourceErrorKind::SourceTimeout),
                        }
                    }
                }
            }));
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        while let Some(task_result) = tasks.next().await {
            match task_result {
                Ok(SourceResult {
                    result: Ok(found), ..
                }) => {
                    stats.record_source_success(found.len());
                    candidates.extend(found);
                }
                Ok(SourceResult {
                    result: Err(kind), ..
                }) => {
                    stats.record_source_failure(kind);
                }
                Err(join_error) => {
                    warn!("Source task panicked: {join_error:?}");
                    stats.record_source_panic();
                }
            }
        }

        let categories: Vec<(String, String)> = candidates
            .iter()
            .filter_map(|c| c.category.clone().map(|cat| (c.address.clone(), cat)))
            .collect();

        let merged = merge_candidates(
            candidates
                .iter()
                .map(|c| (c.address.clone(), map_score(c.raw_score.as_deref()))),
        );
        info!(
            "Merged {} candidate(s) into {} distinct address(es)",
            candidates.len(),
            merged.len()
        );

        let mut counts = RunCounts {
            candidates: candidates.len() as i64,
            ..Default::default()
        };
        for (address, entry) in &merged {
            match upsert_threat(pool.as_ref(), address, entry.severity)
                .await
                .with_context(|| format!("Failed to apply merged record for {address}"))?
            {
                UpsertOutcome::Inserted => counts.inserted += 1,
                UpsertOutcome::Updated => counts.updated += 1,
            }
            if entry.observations > 1 {
                add_occurrences(pool.as_ref(), address, entry.observations - 1)
                    .await
                    .with_context(|| format!("Failed to count observations for {address}"))?;
            }
        }
        for (address, category) in &categories {
            record_category(pool.as_ref(), address, category)
                .await
                .with_context(|| format!("Failed to tag category for {address}"))?;
        }

        let resolver = GeoResolver::for_run(
            Arc::clone(&geo_databases),
            client.clone(),
            config.api_enrich_limit,
            Arc::clone(&stats),
        );

        let mut enriched = 0usize;
        if resolver.is_empty() {
            warn!("No geolocation tier available; relying on the synthetic fallback");
        } else {
            for address in list_unenriched(pool.as_ref(), ENRICH_BATCH_LIMIT).await? {
                if let Some(record) = resolver.resolve(&address).await {
                    if insert_geo_record(pool.as_ref(), &record).await? {
                        enriched += 1;
                    }
                }
            }
            info!("Enriched {enriched} address(es) with geolocation data");
        }

        let asn_backfilled = backfill_asn_pass(pool.as_ref(), &geo_databases).await?;

        let synthetic = apply_synthetic_fallback(
            pool.as_ref(),
            config.synthetic_threshold,
            SYNTHETIC_BATCH_LIMIT,
        )
        .await?;

        counts.enriched = (enriched + synthetic) as i64;
        counts.sources_failed = stats.sources_failed() as i64;

        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        update_run_stats(pool.as_ref(), &run_id, &counts, elapsed_seconds)
            .await
            .context("Failed to update run statistics")?;

        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(pool.as_ref())
            .await
        {
            warn!("Failed to checkpoint WAL file (this is non-critical): {e}");
        }

        info!(
            "Run {run_id} complete: {} new, {} updated, {} enriched ({} synthetic), {} ASN backfilled",
            counts.inserted, counts.updated, enriched, synthetic, asn_backfilled
        );
        if stats.sources_failed() > 0 {
            warn!(
                "{} of {} source(s) skipped after failures",
                stats.sources_failed(),
                stats.sources_failed() + stats.sources_succeeded()
            );
        }
        if stats.api_lookup_failures() > 0 {
            warn!(
                "{} remote geolocation lookup(s) failed and were skipped",
                stats.api_lookup_failures()
            );
        }

        Ok(IngestReport {
            run_id,
            db_path: config.db_path.clone(),
            candidates: candidates.len(),
            distinct_addresses: merged.len(),
            new_addresses: counts.inserted as usize,
            updated_addresses: counts.updated as usize,
            enriched,
            synthetic,
            asn_backfilled,
            sources_succeeded: stats.sources_succeeded(),
            sources_failed: stats.sources_failed(),
            api_lookup_failures: stats.api_lookup_failures(),
            elapsed_seconds,
        })
    }
}
