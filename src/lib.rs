// src/lib.rs
// =============================================================================
// spider: a bounded-concurrency async web crawler.
//
// You give it seed URLs and a handler per URL. A fixed pool of workers fetches
// pages, calls your handler for each response, and the handler may queue more
// URLs. The crawl ends by itself once nothing is queued or in flight.
//
// Modules:
// - spider: the scheduler, work queue, dedup set, workers and fetcher
// - config: SpiderConfig (concurrency, delay, duplicates, headers, timeout)
// - error: SpiderError
// - crawl: a ready-made link-following handler
// - report: printing crawl results (table or JSON)
// - logging: tracing subscriber setup for binaries
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod report;
pub mod spider;

pub use config::SpiderConfig;
pub use error::{Result, SpiderError};
pub use spider::{
    crawl_blocking, handler_fn, noop, CrawlStats, Handler, HandlerFuture, HandlerRef, Request,
    Spider, SpiderHandle, SpiderState,
};
