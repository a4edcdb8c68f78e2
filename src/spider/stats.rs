// src/spider/stats.rs
// =============================================================================
// Crawl counters, updated by workers and by admission.
// Atomics only; nothing here is used for coordination.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// A snapshot of the counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// URLs that passed admission and were queued
    pub admitted: usize,
    /// URLs rejected as already seen
    pub duplicates: usize,
    /// Requests that got a response (any status)
    pub fetched: usize,
    /// Requests dropped because the transport failed
    pub transport_failures: usize,
    /// Handlers that returned an error or panicked
    pub handler_failures: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    admitted: AtomicUsize,
    duplicates: AtomicUsize,
    fetched: AtomicUsize,
    transport_failures: AtomicUsize,
    handler_failures: AtomicUsize,
}

impl StatsCounters {
    pub(crate) fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}
