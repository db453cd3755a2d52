//! Ingestion statistics tracking.
//!
//! Thread-safe counters for the outcome of one ingestion run. Source tasks
//! run concurrently, so everything here is atomic and shared via `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::SourceErrorKind;

/// Thread-safe statistics tracker for one ingestion run.
pub struct IngestStats {
    source_errors: HashMap<SourceErrorKind, AtomicUsize>,
    sources_succeeded: AtomicUsize,
    sources_failed: AtomicUsize,
    candidates_seen: AtomicUsize,
    api_lookup_failures: AtomicUsize,
}

impl IngestStats {
    pub fn new() -> Self {
        let mut source_errors = HashMap::new();
        for kind in SourceErrorKind::iter() {
            source_errors.insert(kind, AtomicUsize::new(0));
        }

        IngestStats {
            source_errors,
            sources_succeeded: AtomicUsize::new(0),
            sources_failed: AtomicUsize::new(0),
            candidates_seen: AtomicUsize::new(0),
            api_lookup_failures: AtomicUsize::new(0),
        }
    }

    /// Record a successful source read contributing `candidates` pairs.
    pub fn record_source_success(&self, candidates: usize) {
        self.sources_succeeded.fetch_add(1, Ordering::Relaxed);
        self.candidates_seen.fetch_add(candidates, Ordering::Relaxed);
    }

    /// Record a failed source read.
    pub fn record_source_failure(&self, kind: SourceErrorKind) {
        self.sources_failed.fetch_add(1, Ordering::Relaxed);
        if let Some(counter) = self.source_errors.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment source error counter for {:?} which is not in the map.",
                kind
            );
        }
    }

    /// Record a source task that died without reporting an outcome.
    pub fn record_source_panic(&self) {
        self.sources_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a per-address remote enrichment failure (logged and skipped).
    pub fn record_api_lookup_failure(&self) {
        self.api_lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sources_succeeded(&self) -> usize {
        self.sources_succeeded.load(Ordering::SeqCst)
    }

    pub fn sources_failed(&self) -> usize {
        self.sources_failed.load(Ordering::SeqCst)
    }

    #[allow(dead_code)] // Used in tests
    pub fn candidates_seen(&self) -> usize {
        self.candidates_seen.load(Ordering::SeqCst)
    }

    pub fn api_lookup_failures(&self) -> usize {
        self.api_lookup_failures.load(Ordering::SeqCst)
    }

    #[allow(dead_code)] // Used in tests
    pub fn source_error_count(&self, kind: SourceErrorKind) -> usize {
        self.source_errors
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = IngestStats::new();
        assert_eq!(stats.sources_succeeded(), 0);
        assert_eq!(stats.sources_failed(), 0);
        assert_eq!(stats.candidates_seen(), 0);
        assert_eq!(stats.api_lookup_failures(), 0);
    }

    #[test]
    fn test_record_source_success_accumulates_candidates() {
        let stats = IngestStats::new();
        stats.record_source_success(10);
        stats.record_source_success(5);
        assert_eq!(stats.sources_succeeded(), 2);
        assert_eq!(stats.candidates_seen(), 15);
    }

    #[test]
    fn test_record_source_failure_tracks_kind() {
        let stats = IngestStats::new();
        stats.record_source_failure(SourceErrorKind::RemoteFetchError);
        stats.record_source_failure(SourceErrorKind::RemoteFetchError);
        stats.record_source_failure(SourceErrorKind::SourceTimeout);
        assert_eq!(stats.sources_failed(), 3);
        assert_eq!(
            stats.source_error_count(SourceErrorKind::RemoteFetchError),
            2
        );
        assert_eq!(stats.source_error_count(SourceErrorKind::SourceTimeout), 1);
        assert_eq!(stats.source_error_count(SourceErrorKind::FeedError), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;

        let stats = Arc::new(IngestStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_source_success(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread panicked");
        }
        assert_eq!(stats.sources_succeeded(), 800);
        assert_eq!(stats.candidates_seen(), 800);
    }
}
