// src/spider/mod.rs
// =============================================================================
// The crawl scheduler.
//
// A Spider owns everything one crawl needs:
// - the HTTP client (Fetcher)
// - the set of admitted URLs (DedupSet)
// - the work queue (WorkQueue)
// - a fixed pool of worker tasks while the crawl runs
//
// Lifecycle:  Created -> Running -> Draining -> Stopped
//
// 1. seed()/add_request() push URLs through admission into the queue
// 2. run() spawns `concurrency` workers and waits for the queue to drain
// 3. handlers may queue more URLs while run() is waiting (link following)
// 4. once nothing is queued and nothing is in flight, the pool is cancelled,
//    every worker task is awaited, and run() returns the crawl stats
//
// Handlers get a SpiderHandle rather than the Spider itself; it is a cheap
// clone of the shared state and is the only way to add work mid-crawl.
// =============================================================================

mod dedup;
mod fetch;
mod handler;
mod queue;
mod request;
mod stats;
mod worker;

pub use dedup::DedupSet;
pub use fetch::{FailureKind, Fetcher};
pub use handler::{handler_fn, noop, Handler, HandlerFuture, HandlerRef};
pub use queue::{DoneGuard, WorkQueue};
pub use request::Request;
pub use stats::CrawlStats;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SpiderConfig;
use crate::error::{Result, SpiderError};
use stats::StatsCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpiderState {
    Created,
    Running,
    Draining,
    Stopped,
}

pub(crate) struct Shared {
    config: SpiderConfig,
    fetcher: Fetcher,
    dedup: DedupSet,
    queue: WorkQueue,
    stats: StatsCounters,
    state: Mutex<SpiderState>,
}

/// Cloneable access to a spider's queue, handed to every handler call.
#[derive(Clone)]
pub struct SpiderHandle {
    shared: Arc<Shared>,
}

impl SpiderHandle {
    /// Offers a request to the crawl.
    ///
    /// Returns false if the URL was already admitted (and duplicates are not
    /// allowed) or if the crawl is already draining or stopped.
    pub fn add_request(&self, request: Request) -> bool {
        let state = self.lock_state();
        self.offer(*state, request)
    }

    /// Offers a GET request for `url`
    pub fn add(&self, url: impl Into<String>, handler: HandlerRef) -> bool {
        self.add_request(Request::get(url, handler))
    }

    /// Pairs URLs with handlers and offers each pair.
    ///
    /// If there are fewer handlers than URLs the last handler is reused for
    /// the rest; surplus handlers are ignored. Returns how many URLs were
    /// admitted.
    pub fn seed<I, S>(&self, urls: I, handlers: &[HandlerRef]) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let state = self.lock_state();
        self.seed_locked(*state, urls, handlers)
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> CrawlStats {
        self.shared.stats.snapshot()
    }

    pub fn state(&self) -> SpiderState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, SpiderState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SpiderState) {
        *self.lock_state() = next;
    }

    // Admission + enqueue. The caller holds the state lock, so the pool can't
    // start draining between the state check and the enqueue.
    fn offer(&self, state: SpiderState, request: Request) -> bool {
        if !matches!(state, SpiderState::Created | SpiderState::Running) {
            warn!(url = %request.url(), ?state, "crawl is shutting down, ignoring request");
            return false;
        }
        if !self.shared.dedup.admit(request.url()) {
            self.shared.stats.record_duplicate();
            debug!("SKIP {}", request.url());
            return false;
        }

        self.shared.stats.record_admitted();
        info!("ADD {}", request.url());
        self.shared.queue.enqueue(request);
        true
    }

    fn seed_locked(&self, state: SpiderState, urls: Vec<String>, handlers: &[HandlerRef]) -> Result<usize> {
        let Some(last) = handlers.last() else {
            if urls.is_empty() {
                return Ok(0);
            }
            return Err(SpiderError::NoHandlers { urls: urls.len() });
        };

        let mut admitted = 0;
        for (i, url) in urls.into_iter().enumerate() {
            let handler = handlers.get(i).unwrap_or(last);
            if self.offer(state, Request::get(url, Arc::clone(handler))) {
                admitted += 1;
            }
        }
        Ok(admitted)
    }

    // Created -> Running, exactly once per spider. `seed` runs under the same
    // lock, so nothing is queued by a start() that loses the race.
    fn begin(&self, seed: Option<(Vec<String>, &[HandlerRef])>) -> Result<()> {
        let mut state = self.lock_state();
        if *state != SpiderState::Created {
            return Err(SpiderError::AlreadyStarted { state: *state });
        }
        if let Some((urls, handlers)) = seed {
            self.seed_locked(*state, urls, handlers)?;
        }
        *state = SpiderState::Running;
        Ok(())
    }

    // Running -> Draining, only if the queue is still drained once admission
    // is locked out. A request that slipped in after join() returned keeps us
    // Running.
    fn try_drain(&self) -> bool {
        let mut state = self.lock_state();
        if !self.shared.queue.is_drained() {
            return false;
        }
        *state = SpiderState::Draining;
        true
    }
}

// Owns the pool's cancellation. Dropping it (normally, or because the run()
// future was dropped mid-crawl) stops every worker and marks the spider Stopped.
struct PoolGuard {
    spider: SpiderHandle,
    cancel: CancellationToken,
}

impl PoolGuard {
    fn cancel(&self) {
        self.cancel.cancel();
        self.spider.shared.queue.close();
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        self.cancel();
        self.spider.set_state(SpiderState::Stopped);
    }
}

/// A bounded-concurrency crawler.
///
/// ```ignore
/// let spider = Spider::new(SpiderConfig::default())?;
/// let stats = spider.start(["https://example.com"], &[my_handler]).await?;
/// ```
pub struct Spider {
    handle: SpiderHandle,
}

impl Spider {
    /// Builds a spider. Fails fast on an invalid config, before any I/O.
    pub fn new(config: SpiderConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        let shared = Shared {
            dedup: DedupSet::new(config.allow_duplicates),
            queue: WorkQueue::new(),
            stats: StatsCounters::default(),
            state: Mutex::new(SpiderState::Created),
            fetcher,
            config,
        };
        Ok(Self {
            handle: SpiderHandle {
                shared: Arc::new(shared),
            },
        })
    }

    pub fn handle(&self) -> SpiderHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> SpiderState {
        self.handle.state()
    }

    pub fn config(&self) -> &SpiderConfig {
        self.handle.config()
    }

    pub fn stats(&self) -> CrawlStats {
        self.handle.stats()
    }

    pub fn add_request(&self, request: Request) -> bool {
        self.handle.add_request(request)
    }

    pub fn add(&self, url: impl Into<String>, handler: HandlerRef) -> bool {
        self.handle.add(url, handler)
    }

    pub fn seed<I, S>(&self, urls: I, handlers: &[HandlerRef]) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handle.seed(urls, handlers)
    }

    /// Seeds the crawl, then runs it to completion.
    pub async fn start<I, S>(&self, urls: I, handlers: &[HandlerRef]) -> Result<CrawlStats>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        self.handle.begin(Some((urls, handlers)))?;
        self.drive().await
    }

    /// Runs the worker pool until the queue drains.
    ///
    /// A spider runs at most once; a second call fails with AlreadyStarted.
    pub async fn run(&self) -> Result<CrawlStats> {
        self.handle.begin(None)?;
        self.drive().await
    }

    // Runs the pool of an already Running spider until the queue drains
    async fn drive(&self) -> Result<CrawlStats> {
        let shared = &self.handle.shared;
        let concurrency = shared.config.concurrency;
        info!(concurrency, queued = shared.queue.len(), "crawl started");

        let pool = PoolGuard {
            spider: self.handle.clone(),
            cancel: CancellationToken::new(),
        };
        let workers: Vec<JoinHandle<()>> = (0..concurrency)
            .map(|worker_id| {
                tokio::spawn(worker::run_worker(
                    worker_id,
                    self.handle.clone(),
                    pool.cancel.clone(),
                ))
            })
            .collect();

        loop {
            shared.queue.join().await;
            if self.handle.try_drain() {
                break;
            }
        }

        pool.cancel();
        for result in join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "worker task ended abnormally");
            }
        }
        drop(pool);

        let stats = self.stats();
        info!(
            fetched = stats.fetched,
            transport_failures = stats.transport_failures,
            handler_failures = stats.handler_failures,
            duplicates = stats.duplicates,
            "crawl finished"
        );
        Ok(stats)
    }

    /// One-shot download of `src` into `dst`; does not touch the queue.
    pub async fn download(&self, src: &str, dst: &Path) -> Result<u64> {
        self.handle.shared.fetcher.download(src, dst).await
    }
}

/// Runs a whole crawl on a runtime owned by this call.
///
/// The runtime, HTTP client and spider are created here and all dropped before
/// returning, whether or not the crawl got as far as running.
pub fn crawl_blocking<I, S>(config: SpiderConfig, urls: I, handlers: &[HandlerRef]) -> Result<CrawlStats>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let spider = Spider::new(config)?;
        spider.start(urls, handlers).await
    })
}
