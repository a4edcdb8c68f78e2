// src/spider/handler.rs
// =============================================================================
// The response handler interface.
//
// Every request carries a handler. When the fetch succeeds the worker calls
// it with:
// - a SpiderHandle, so the handler can queue more URLs (link following)
// - the raw reqwest::Response (status, headers, body)
//
// Any `Fn(SpiderHandle, Response) -> impl Future<Output = anyhow::Result<()>>`
// is a handler, and so is any type implementing Handler by hand (see
// crawl::LinkFollower). Handlers are stored as Arc<dyn Handler> so one handler
// can be shared by many requests.
// =============================================================================

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Response;

use super::SpiderHandle;

pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Shared reference to a handler, as stored in each request
pub type HandlerRef = Arc<dyn Handler>;

pub trait Handler: Send + Sync + 'static {
    fn handle(&self, spider: SpiderHandle, response: Response) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(SpiderHandle, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handle(&self, spider: SpiderHandle, response: Response) -> HandlerFuture {
        Box::pin(self(spider, response))
    }
}

/// Wraps an async closure into a HandlerRef.
///
/// ```ignore
/// let print_status = spider::handler_fn(|_spider, response| async move {
///     println!("{} {}", response.status(), response.url());
///     Ok(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerRef
where
    F: Fn(SpiderHandle, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(f)
}

/// A handler that ignores the response
pub fn noop() -> HandlerRef {
    handler_fn(|_spider, _response| async { anyhow::Ok(()) })
}
