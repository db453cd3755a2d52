//! Local list-file reader.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::extract::{canonicalize_address, parse_list_line};
use super::Candidate;
use crate::error_handling::SourceErrorKind;
use crate::severity::map_score;

/// Reads a list file of `address[,score]` lines.
///
/// Malformed tokens (header rows, out-of-range octets) are discarded
/// silently. Duplicate addresses within the file collapse to a single
/// candidate keeping the score that maps to the highest severity, so one
/// file contributes at most one observation per address.
pub(super) async fn read_list_file(path: &Path) -> Result<Vec<Candidate>, SourceErrorKind> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        log::warn!("Failed to open {}: {e}", path.display());
        SourceErrorKind::FileUnreadable
    })?;

    let mut seen: BTreeMap<String, Option<String>> = BTreeMap::new();
    let mut lines = BufReader::new(file).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Failed to read line from {}: {e}", path.display());
                continue;
            }
        };
        let Some((token, score)) = parse_list_line(&line) else {
            continue;
        };
        let Some(address) = canonicalize_address(token) else {
            continue;
        };
        let score = score.map(str::to_string);
        seen.entry(address)
            .and_modify(|existing| {
                if map_score(score.as_deref()) > map_score(existing.as_deref()) {
                    *existing = score.clone();
                }
            })
            .or_insert(score);
    }

    Ok(seen
        .into_iter()
        .map(|(address, raw_score)| Candidate {
            address,
            raw_score,
            category: None,
        })
        .collect())
}
