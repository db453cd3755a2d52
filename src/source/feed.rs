//! JSON feed reader.
//!
//! Scans security-news feed entries (JSON Feed format, e.g. hnrss) for
//! address mentions. Feed-sourced candidates carry a fixed raw score and
//! are tagged with the feed title so category reporting can tell them apart
//! from blocklist hits.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use super::extract::extract_ipv4_addresses;
use super::Candidate;
use crate::config::{DEFAULT_FEEDS, FEED_RAW_SCORE};
use crate::error_handling::SourceErrorKind;

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    items: Vec<JsonFeedItem>,
}

#[derive(Debug, Deserialize)]
struct JsonFeedItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content_html: Option<String>,
    #[serde(default)]
    content_text: Option<String>,
}

/// Returns the feed URLs to scan: the contents of `feeds_file` when it
/// exists (one URL per line, `#` comments allowed), else the built-in list.
pub fn load_feed_urls(feeds_file: &Path) -> Vec<String> {
    match std::fs::read_to_string(feeds_file) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(_) => DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Fetches one feed and extracts addresses mentioned in its entries.
pub(super) async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<Candidate>, SourceErrorKind> {
    let response = client.get(url).send().await.map_err(|e| {
        log::warn!("Failed to fetch feed {url}: {e}");
        SourceErrorKind::FeedError
    })?;

    let response = response.error_for_status().map_err(|e| {
        log::warn!("Feed {url} returned an error status: {e}");
        SourceErrorKind::FeedError
    })?;

    let feed: JsonFeed = response.json().await.map_err(|e| {
        log::warn!("Failed to decode feed {url}: {e}");
        SourceErrorKind::FeedError
    })?;

    let category = feed.title.clone().unwrap_or_else(|| url.to_string());

    let mut addresses: BTreeSet<String> = BTreeSet::new();
    for item in &feed.items {
        for text in [&item.title, &item.content_html, &item.content_text]
            .into_iter()
            .flatten()
        {
            addresses.extend(extract_ipv4_addresses(text));
        }
    }

    Ok(addresses
        .into_iter()
        .map(|address| Candidate {
            address,
            raw_score: Some(FEED_RAW_SCORE.to_string()),
            category: Some(category.clone()),
        })
        .collect())
}
