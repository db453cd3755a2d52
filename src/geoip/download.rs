//! Offline dataset download.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::GEO_DOWNLOAD_TIMEOUT;

/// Downloads a geolocation dataset from its public mirror if it is not
/// already present locally.
///
/// Returns `true` when a download happened, `false` when the local file was
/// reused. Failures propagate so the caller can log a degraded-mode warning
/// and carry on with the next resolution tier.
pub async fn ensure_dataset(
    client: &reqwest::Client,
    path: &Path,
    url: &str,
) -> Result<bool> {
    if path.exists() {
        log::debug!("Dataset already present at {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dataset directory {}", parent.display()))?;
    }

    log::info!("Downloading dataset from {url}...");
    let response = client
        .get(url)
        .timeout(GEO_DOWNLOAD_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("{url} returned an error status"))?;

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read dataset body from {url}"))?;

    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write dataset to {}", path.display()))?;

    log::info!(
        "Dataset downloaded to {} ({:.1} MB)",
        path.display(),
        bytes.len() as f64 / 1024.0 / 1024.0
    );
    Ok(true)
}
