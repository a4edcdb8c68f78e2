// src/crawl/follow.rs
// =============================================================================
// LinkFollower: the handler behind `spider crawl`.
//
// For every response it:
// 1. records a PageRecord (url, status, depth, links found)
// 2. if the page is HTML and we're above the depth limit, extracts links,
//    keeps the ones in scope, and queues them with a follower one level deeper
//
// Scope:
// - depth: seed pages are depth 1; max_depth 1 means "only the seeds"
// - domains: by default only hosts of the seed URLs are followed, so the
//   crawl doesn't wander off across the internet
//
// Deduplication is NOT done here; the spider's admission step already drops
// every URL it has seen.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::Serialize;
use tracing::debug;

use super::links::{extract_links, host_of};
use crate::spider::{Handler, HandlerFuture, HandlerRef, SpiderHandle};

/// What the crawl learned about one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub status: u16,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// In-scope links found on the page (0 when it wasn't parsed)
    pub links: usize,
}

impl PageRecord {
    pub fn is_ok(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

#[derive(Debug)]
struct Scope {
    max_depth: usize,
    // None = follow links to any host
    hosts: Option<HashSet<String>>,
}

impl Scope {
    fn allows(&self, url: &str) -> bool {
        match &self.hosts {
            None => true,
            Some(hosts) => host_of(url).is_some_and(|host| hosts.contains(&host)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkFollower {
    depth: usize,
    scope: Arc<Scope>,
    pages: Arc<Mutex<Vec<PageRecord>>>,
}

impl LinkFollower {
    /// Builds the follower for the seed pages.
    ///
    /// With `same_host` set, only links to the hosts of `seeds` are followed.
    pub fn new(seeds: &[String], max_depth: usize, same_host: bool) -> Self {
        let hosts = same_host.then(|| seeds.iter().filter_map(|s| host_of(s)).collect());
        Self {
            depth: 1,
            scope: Arc::new(Scope { max_depth, hosts }),
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every page recorded so far, by this follower and its descendants
    pub fn pages(&self) -> Vec<PageRecord> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn child(&self) -> Self {
        Self {
            depth: self.depth + 1,
            scope: Arc::clone(&self.scope),
            pages: Arc::clone(&self.pages),
        }
    }

    fn record(&self, page: PageRecord) {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).push(page);
    }

    async fn visit(self, spider: SpiderHandle, response: Response) -> anyhow::Result<()> {
        let url = response.url().to_string();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut page = PageRecord {
            url: url.clone(),
            status: status.as_u16(),
            depth: self.depth,
            content_type: content_type.clone(),
            links: 0,
        };

        // Missing content-type is treated as HTML
        let is_html = content_type.as_deref().map_or(true, |ct| ct.contains("html"));
        if !status.is_success() || !is_html || self.depth >= self.scope.max_depth {
            self.record(page);
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.record(page);
                return Err(e).with_context(|| format!("reading body of {}", url));
            }
        };

        let links: Vec<String> = extract_links(&body, &url)
            .into_iter()
            .filter(|link| self.scope.allows(link))
            .collect();
        page.links = links.len();
        debug!(url = %url, depth = self.depth, links = links.len(), "page parsed");
        self.record(page);

        let next: HandlerRef = Arc::new(self.child());
        for link in links {
            spider.add(link, Arc::clone(&next));
        }
        Ok(())
    }
}

impl Handler for LinkFollower {
    fn handle(&self, spider: SpiderHandle, response: Response) -> HandlerFuture {
        Box::pin(self.clone().visit(spider, response))
    }
}
