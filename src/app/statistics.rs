//! User-facing reporting for the `stats` and `search` subcommands.

use chrono::{DateTime, Utc};

use crate::storage::models::{AggregateStats, ThreatDetail};

fn format_epoch_ms(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Prints the derived aggregate view of the store.
pub fn print_aggregate_stats(stats: &AggregateStats) {
    println!("\nThreat Database Statistics");
    println!("{}", "=".repeat(50));
    println!("Total Malicious IPs: {}", stats.total_threats);
    println!("Countries Affected: {}", stats.countries_affected);
    println!("Average Severity: {:.2}/5", stats.average_severity);
    println!("IPs with Geolocation: {}", stats.geolocated);
    if stats.synthetic_rows > 0 {
        println!(
            "  (of which synthetic/low-confidence: {})",
            stats.synthetic_rows
        );
    }

    if !stats.top_countries.is_empty() {
        println!("\nTop Countries:");
        println!("{}", "-".repeat(50));
        for (country, count) in stats.top_countries.iter().take(5) {
            println!("  {country}: {count} IPs");
        }
    }

    if !stats.top_asns.is_empty() {
        println!("\nTop ASNs:");
        println!("{}", "-".repeat(50));
        for (asn, count) in stats.top_asns.iter().take(5) {
            println!("  {asn}: {count} IPs");
        }
    }

    if !stats.top_cities.is_empty() {
        println!("\nTop Cities:");
        println!("{}", "-".repeat(50));
        for (city, count) in stats.top_cities.iter().take(5) {
            println!("  {city}: {count} IPs");
        }
    }

    if !stats.severity_distribution.is_empty() {
        println!("\nThreat Severity Distribution:");
        println!("{}", "-".repeat(50));
        let scale = std::cmp::max(1, stats.total_threats / 20);
        for (severity, count) in &stats.severity_distribution {
            let bar = "#".repeat((count / scale) as usize);
            println!("  Level {severity}: {count} IPs {bar}");
        }
    }
    println!();
}

/// Prints a single-address lookup result.
pub fn print_threat_detail(address: &str, detail: Option<&ThreatDetail>) {
    let Some(detail) = detail else {
        println!("IP {address} not found in the threat database.");
        return;
    };

    println!("\nFound Malicious IP: {address}");
    println!("{}", "=".repeat(50));
    println!("Threat Severity: {}/5", detail.threat.severity);
    println!("Detection Count: {}", detail.threat.occurrence_count);
    println!("First Seen: {}", format_epoch_ms(detail.threat.first_seen));
    println!(
        "Last Updated: {}",
        format_epoch_ms(detail.threat.last_updated)
    );

    if let Some(geo) = &detail.geo {
        if let Some(country) = &geo.country {
            println!("Country: {country}");
        }
        if let Some(city) = &geo.city {
            println!("City: {city}");
        }
        if let (Some(lat), Some(lon)) = (geo.latitude, geo.longitude) {
            println!("Coordinates: {lat:.4}, {lon:.4}");
        }
        if let Some(asn) = &geo.asn {
            println!("ASN: {asn}");
        }
        println!("Geolocation Source: {}", geo.source);
    }
    println!();
}
