//! Remote blocklist reader.

use super::extract::extract_ipv4_addresses;
use super::Candidate;
use crate::error_handling::SourceErrorKind;

/// Fetches a plain-text blocklist and extracts the addresses it mentions.
///
/// Blocklists carry no per-address score; candidates are emitted unscored
/// and pick up the default severity downstream. Each candidate is tagged
/// with the list name as its category.
pub(super) async fn fetch_blocklist(
    client: &reqwest::Client,
    name: &str,
    url: &str,
) -> Result<Vec<Candidate>, SourceErrorKind> {
    let response = client.get(url).send().await.map_err(|e| {
        log::warn!("Failed to fetch {name} from {url}: {e}");
        SourceErrorKind::RemoteFetchError
    })?;

    let response = response.error_for_status().map_err(|e| {
        log::warn!("{name} returned an error status: {e}");
        SourceErrorKind::RemoteFetchError
    })?;

    let body = response.text().await.map_err(|e| {
        log::warn!("Failed to read body of {name}: {e}");
        SourceErrorKind::RemoteFetchError
    })?;

    Ok(extract_ipv4_addresses(&body)
        .into_iter()
        .map(|address| Candidate {
            address,
            raw_score: None,
            category: Some(name.to_string()),
        })
        .collect())
}
