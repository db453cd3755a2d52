//! Remote geolocation API adapter.
//!
//! Decodes the ip-api.com JSON response into the fixed internal record
//! shape. The service reports ASN as a free-form string ("AS15169 Google
//! LLC"); only the leading `AS<number>` token is kept.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::GEO_API_TIMEOUT;
use crate::storage::models::{GeoRecord, GeoSource};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(rename = "as", default)]
    asn: Option<String>,
}

/// Looks up one address via the remote service.
///
/// `Ok(None)` means the service answered but could not locate the address;
/// transport and decode failures are errors for the caller to log and skip.
pub(super) async fn fetch_geolocation(
    client: &reqwest::Client,
    base_url: &str,
    address: &str,
) -> Result<Option<GeoRecord>> {
    let url = format!("{base_url}/{address}?fields=status,country,city,lat,lon,as");
    let response = client
        .get(&url)
        .timeout(GEO_API_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("Geolocation request failed for {address}"))?
        .error_for_status()
        .with_context(|| format!("Geolocation service rejected lookup for {address}"))?;

    let body: ApiResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to decode geolocation response for {address}"))?;

    if body.status != "success" {
        return Ok(None);
    }

    Ok(Some(GeoRecord {
        address: address.to_string(),
        country: body.country,
        city: body.city,
        latitude: body.lat,
        longitude: body.lon,
        asn: body.asn.as_deref().and_then(normalize_asn),
        source: GeoSource::Api,
    }))
}

/// Reduces the service's ASN field to the bare `AS<number>` token.
fn normalize_asn(raw: &str) -> Option<String> {
    let token = raw.split_whitespace().next()?;
    if token.starts_with("AS") && token.len() > 2 && token[2..].chars().all(|c| c.is_ascii_digit())
    {
        Some(token.to_string())
    } else {
        None
    }
}
