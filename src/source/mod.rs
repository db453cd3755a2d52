//! Source readers.
//!
//! Each source yields candidate `(address, raw score)` pairs from one of
//! three shapes: a local list file, a remote blocklist, or a JSON feed.
//! Readers only fetch and extract; severity mapping and cross-source merge
//! happen downstream. Sources are independent: a failure in one reports a
//! warning and zero candidates, never aborting the run.

mod extract;
mod feed;
mod file;
mod remote;

pub use extract::{canonicalize_address, extract_ipv4_addresses, parse_list_line};
pub use feed::load_feed_urls;

use std::path::PathBuf;

use crate::error_handling::SourceErrorKind;

/// A candidate sighting emitted by a source reader.
///
/// The address is already canonical; the raw score (if any) is mapped to a
/// severity by the pipeline, not the reader.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub address: String,
    pub raw_score: Option<String>,
    /// Category tag recorded alongside the threat (e.g. the list or feed
    /// that reported it).
    pub category: Option<String>,
}

/// Descriptor for one ingestion source.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Local list file: one address per line, optional `,score` column.
    File(PathBuf),
    /// Remote plain-text blocklist.
    RemoteList { name: String, url: String },
    /// JSON feed whose entries are scanned for address mentions.
    Feed { url: String },
}

impl SourceSpec {
    /// Short human-readable label used in logs and the run summary.
    pub fn label(&self) -> String {
        match self {
            SourceSpec::File(path) => format!("file:{}", path.display()),
            SourceSpec::RemoteList { name, .. } => format!("list:{name}"),
            SourceSpec::Feed { url } => format!("feed:{url}"),
        }
    }
}

/// Outcome of reading one source.
pub struct SourceResult {
    pub label: String,
    pub result: Result<Vec<Candidate>, SourceErrorKind>,
}

/// Reads one source to completion.
///
/// Transport and decode failures are folded into the `Err` variant of the
/// result; callers aggregate them into run statistics. The per-source
/// timeout is enforced by the caller so a stalled source cannot block the
/// other readers.
pub async fn read_source(spec: &SourceSpec, client: &reqwest::Client) -> SourceResult {
    let label = spec.label();
    let result = match spec {
        SourceSpec::File(path) => file::read_list_file(path).await,
        SourceSpec::RemoteList { name, url } => remote::fetch_blocklist(client, name, url).await,
        SourceSpec::Feed { url } => feed::fetch_feed(client, url).await,
    };
    match &result {
        Ok(candidates) => {
            log::info!("{label}: {} candidate address(es)", candidates.len());
        }
        Err(kind) => {
            log::warn!("{label}: skipped ({kind})");
        }
    }
    SourceResult { label, result }
}
