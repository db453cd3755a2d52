//! Layered geolocation resolution.
//!
//! Each tier exposes the same `try_resolve` capability; the resolver walks
//! an explicit ordered list until one tier answers. The remote tier carries
//! its own per-run budget so external call volume stays bounded no matter
//! how many addresses need enrichment.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error_handling::IngestStats;
use crate::storage::models::GeoRecord;

use super::{api, GeoDatabases};

/// One tier of the geolocation resolution chain.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    /// Tier label used in logs.
    fn name(&self) -> &'static str;

    /// Attempts to resolve one address. `None` means this tier cannot
    /// answer and the next tier should be consulted.
    async fn try_resolve(&self, address: &str) -> Option<GeoRecord>;
}

/// Tier 1: offline dataset lookup.
pub struct LocalDatabaseStrategy {
    databases: Arc<GeoDatabases>,
}

impl LocalDatabaseStrategy {
    pub fn new(databases: Arc<GeoDatabases>) -> Self {
        Self { databases }
    }
}

#[async_trait]
impl ResolveStrategy for LocalDatabaseStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn try_resolve(&self, address: &str) -> Option<GeoRecord> {
        self.databases.lookup_city(address)
    }
}

/// Tier 2: remote lookup service, bounded per run.
pub struct RemoteApiStrategy {
    client: reqwest::Client,
    base_url: String,
    budget: AtomicUsize,
    stats: Arc<IngestStats>,
}

impl RemoteApiStrategy {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        budget: usize,
        stats: Arc<IngestStats>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            budget: AtomicUsize::new(budget),
            stats,
        }
    }

    /// Consumes one unit of budget; `false` when exhausted.
    fn take_budget(&self) -> bool {
        self.budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ResolveStrategy for RemoteApiStrategy {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn try_resolve(&self, address: &str) -> Option<GeoRecord> {
        if !self.take_budget() {
            return None;
        }
        match api::fetch_geolocation(&self.client, &self.base_url, address).await {
            Ok(record) => record,
            Err(e) => {
                // Best-effort: log, count, skip. No within-run retry.
                log::warn!("Geolocation lookup failed for {address}: {e:#}");
                self.stats.record_api_lookup_failure();
                None
            }
        }
    }
}

/// Ordered chain of resolution tiers.
pub struct GeoResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl GeoResolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Builds the tier list for one run: the offline dataset when loaded,
    /// then the remote service when a budget is configured.
    pub fn for_run(
        databases: Arc<GeoDatabases>,
        client: reqwest::Client,
        api_limit: usize,
        stats: Arc<IngestStats>,
    ) -> Self {
        let mut strategies: Vec<Box<dyn ResolveStrategy>> = Vec::new();
        if databases.city_available() {
            strategies.push(Box::new(LocalDatabaseStrategy::new(databases)));
        } else {
            log::warn!("Offline geolocation dataset unavailable; skipping local tier");
        }
        if api_limit > 0 {
            strategies.push(Box::new(RemoteApiStrategy::new(
                client,
                crate::config::GEO_API_BASE_URL,
                api_limit,
                stats,
            )));
        }
        Self::new(strategies)
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Walks the tiers in order until one resolves the address.
    pub async fn resolve(&self, address: &str) -> Option<GeoRecord> {
        for strategy in &self.strategies {
            if let Some(record) = strategy.try_resolve(address).await {
                log::debug!("Resolved {address} via {} tier", strategy.name());
                return Some(record);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::GeoSource;

    struct FixedStrategy {
        name: &'static str,
        record: Option<GeoRecord>,
    }

    impl FixedStrategy {
        fn answering(name: &'static str, country: &str) -> Self {
            Self {
                name,
                record: Some(GeoRecord {
                    address: String::new(),
                    country: Some(country.to_string()),
                    city: None,
                    latitude: None,
                    longitude: None,
                    asn: None,
                    source: GeoSource::Local,
                }),
            }
        }

        fn missing(name: &'static str) -> Self {
            Self { name, record: None }
        }
    }

    #[async_trait]
    impl ResolveStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn try_resolve(&self, address: &str) -> Option<GeoRecord> {
            self.record.clone().map(|mut record| {
                record.address = address.to_string();
                record
            })
        }
    }

    #[tokio::test]
    async fn test_first_answering_tier_wins() {
        let resolver = GeoResolver::new(vec![
            Box::new(FixedStrategy::answering("first", "Brazil")),
            Box::new(FixedStrategy::answering("second", "Mexico")),
        ]);
        let record = resolver.resolve("192.0.2.1").await.expect("resolved");
        assert_eq!(record.country.as_deref(), Some("Brazil"));
        assert_eq!(record.address, "192.0.2.1");
    }

    #[tokio::test]
    async fn test_falls_through_missing_tiers() {
        let resolver = GeoResolver::new(vec![
            Box::new(FixedStrategy::missing("first")),
            Box::new(FixedStrategy::answering("second", "Mexico")),
        ]);
        let record = resolver.resolve("192.0.2.2").await.expect("resolved");
        assert_eq!(record.country.as_deref(), Some("Mexico"));
    }

    #[tokio::test]
    async fn test_empty_chain_resolves_nothing() {
        let resolver = GeoResolver::new(Vec::new());
        assert!(resolver.is_empty());
        assert!(resolver.resolve("192.0.2.3").await.is_none());
    }

    #[tokio::test]
    async fn test_remote_budget_bounds_attempts() {
        let stats = Arc::new(IngestStats::new());
        // Unroutable base URL: every attempted lookup fails fast and burns
        // one unit of budget.
        let strategy = RemoteApiStrategy::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            2,
            Arc::clone(&stats),
        );
        for _ in 0..5 {
            assert!(strategy.try_resolve("192.0.2.4").await.is_none());
        }
        // Only the budgeted attempts reached the network.
        assert_eq!(stats.api_lookup_failures(), 2);
    }

    #[tokio::test]
    async fn test_for_run_without_dataset_or_budget_is_empty() {
        let stats = Arc::new(IngestStats::new());
        let resolver = GeoResolver::for_run(
            Arc::new(GeoDatabases::disabled()),
            reqwest::Client::new(),
            0,
            stats,
        );
        assert!(resolver.is_empty());
    }
}
