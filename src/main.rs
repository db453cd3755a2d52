//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `badip_tracker` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use badip_tracker::config::{
    DB_PATH, DEFAULT_API_ENRICH_LIMIT, DEFAULT_INPUT_FILE, DEFAULT_SYNTHETIC_THRESHOLD,
    GEOIP_ASN_PATH, GEOIP_CITY_PATH,
};
use badip_tracker::export::{export_csv, export_jsonl, ExportFormat};
use badip_tracker::{
    aggregate_stats, init_db_pool_with_path, init_logger_with, lookup_threat,
    print_aggregate_stats, print_threat_detail, reset_store, run_ingest, run_migrations, Config,
    LogFormat, LogLevel,
};

#[derive(Parser)]
#[command(
    name = "badip_tracker",
    version,
    about = "Aggregates malicious IP addresses into a queryable SQLite database"
)]
struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest addresses from the configured sources and enrich the store
    Ingest(IngestArgs),
    /// Print aggregate statistics for the store
    Stats(StoreArgs),
    /// Look up one address in the store
    Search {
        /// Address to look up
        address: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Export the store as CSV or JSONL
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Clear the entire store (threats, geolocation, categories, runs)
    Reset {
        /// Confirm the reset; without this flag nothing is deleted
        #[arg(long)]
        yes: bool,
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Database path (SQLite file)
    #[arg(long, default_value = DB_PATH)]
    db_path: PathBuf,
}

#[derive(Args)]
struct IngestArgs {
    /// Primary address list (one address per line, optional `,score`)
    #[arg(default_value = DEFAULT_INPUT_FILE)]
    file: PathBuf,

    /// Supplementary source files of the same shape (repeatable)
    #[arg(long = "source")]
    sources: Vec<PathBuf>,

    /// Fetch the configured remote blocklists
    #[arg(long)]
    remote: bool,

    /// Scan the configured JSON feeds for address mentions
    #[arg(long)]
    feeds: bool,

    /// Database path (SQLite file)
    #[arg(long, default_value = DB_PATH)]
    db_path: PathBuf,

    /// Path to the offline city-level geolocation dataset
    #[arg(long, default_value = GEOIP_CITY_PATH)]
    geoip_city: PathBuf,

    /// Path to the offline ASN dataset
    #[arg(long, default_value = GEOIP_ASN_PATH)]
    geoip_asn: PathBuf,

    /// Download missing offline datasets from the public mirror
    #[arg(long)]
    download_geoip: bool,

    /// Maximum addresses enriched via the remote API this run
    #[arg(long, default_value_t = DEFAULT_API_ENRICH_LIMIT)]
    api_limit: usize,

    /// Minimum geolocation coverage before synthetic fallback data is generated
    #[arg(long, default_value_t = DEFAULT_SYNTHETIC_THRESHOLD)]
    synthetic_threshold: usize,
}

impl IngestArgs {
    fn into_config(self, log_level: LogLevel, log_format: LogFormat) -> Config {
        Config {
            file: self.file,
            extra_files: self.sources,
            fetch_remote: self.remote,
            ingest_feeds: self.feeds,
            db_path: self.db_path,
            geoip_city: Some(self.geoip_city),
            geoip_asn: Some(self.geoip_asn),
            download_geoip: self.download_geoip,
            api_enrich_limit: self.api_limit,
            synthetic_threshold: self.synthetic_threshold,
            log_level,
            log_format,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present; optional.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    match cli.command {
        Command::Ingest(args) => {
            let config = args.into_config(cli.log_level, cli.log_format);
            match run_ingest(config).await {
                Ok(report) => {
                    println!(
                        "Processed {} candidate(s) across {} source(s): {} new, {} updated, \
                         {} enriched ({} synthetic) in {:.1}s",
                        report.candidates,
                        report.sources_succeeded + report.sources_failed,
                        report.new_addresses,
                        report.updated_addresses,
                        report.enriched + report.synthetic,
                        report.synthetic,
                        report.elapsed_seconds
                    );
                    if report.sources_failed > 0 {
                        println!("{} source(s) skipped after failures", report.sources_failed);
                    }
                    println!("Results saved in {}", report.db_path.display());
                    Ok(())
                }
                Err(e) => {
                    eprintln!("badip_tracker error: {e:#}");
                    process::exit(1);
                }
            }
        }
        Command::Stats(store) => {
            let pool = open_store(&store.db_path).await?;
            let stats = aggregate_stats(pool.as_ref())
                .await
                .context("Failed to compute statistics")?;
            print_aggregate_stats(&stats);
            Ok(())
        }
        Command::Search { address, store } => {
            let pool = open_store(&store.db_path).await?;
            let detail = lookup_threat(pool.as_ref(), &address)
                .await
                .context("Failed to look up address")?;
            print_threat_detail(&address, detail.as_ref());
            Ok(())
        }
        Command::Export {
            format,
            output,
            store,
        } => {
            let pool = open_store(&store.db_path).await?;
            let written = match format {
                ExportFormat::Csv => export_csv(pool.as_ref(), output.as_deref()).await?,
                ExportFormat::Jsonl => export_jsonl(pool.as_ref(), output.as_deref()).await?,
            };
            eprintln!("Exported {written} record(s)");
            Ok(())
        }
        Command::Reset { yes, store } => {
            if !yes {
                eprintln!(
                    "Refusing to reset {} without --yes",
                    store.db_path.display()
                );
                process::exit(2);
            }
            let pool = open_store(&store.db_path).await?;
            reset_store(pool.as_ref())
                .await
                .context("Failed to reset store")?;
            println!("Store reset: {}", store.db_path.display());
            Ok(())
        }
    }
}

async fn open_store(db_path: &std::path::Path) -> Result<std::sync::Arc<sqlx::SqlitePool>> {
    let pool = init_db_pool_with_path(db_path)
        .await
        .context("Failed to open the threat store")?;
    run_migrations(pool.as_ref())
        .await
        .context("Failed to prepare the threat store schema")?;
    Ok(pool)
}
