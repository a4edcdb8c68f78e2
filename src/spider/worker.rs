// src/spider/worker.rs
// =============================================================================
// The worker loop.
//
// Each worker repeats: dequeue -> fetch -> call handler -> mark done -> delay,
// until the scheduler cancels the pool.
//
// Failure policy:
// - transport failure: logged, counted, request dropped (no retry)
// - handler returns Err: logged, counted, worker keeps going
// - handler panics: caught, logged, counted, worker keeps going
// In every case the request is marked done exactly once (DoneGuard).
//
// Cancellation is only observed while the worker is idle: waiting in
// dequeue() or sleeping through the delay. A fetch that is already running
// always finishes.
// =============================================================================

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::fetch::FailureKind;
use super::queue::DoneGuard;
use super::request::Request;
use super::SpiderHandle;

pub(crate) async fn run_worker(worker_id: usize, spider: SpiderHandle, cancel: CancellationToken) {
    trace!(worker_id, "worker starting");
    let delay = spider.config().delay();
    let mut processed = 0usize;

    loop {
        let request = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = spider.shared.queue.dequeue() => match next {
                Some(request) => request,
                None => break,
            },
        };

        {
            let _done = DoneGuard::new(&spider.shared.queue);
            process(worker_id, &spider, request).await;
        }
        processed += 1;

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    debug!(worker_id, processed, "worker stopped");
}

async fn process(worker_id: usize, spider: &SpiderHandle, request: Request) {
    info!("Loading {}", request.url());

    let response = match spider.shared.fetcher.fetch(&request).await {
        Ok(response) => response,
        Err(e) => {
            spider.shared.stats.record_transport_failure();
            warn!(
                worker_id,
                url = %request.url(),
                kind = %FailureKind::classify(&e),
                error = %e,
                "fetch failed, dropping request"
            );
            return;
        }
    };
    spider.shared.stats.record_fetched();

    let handler = request.handler().clone();
    let handle = spider.clone();
    let call = async move { handler.handle(handle, response).await };
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            spider.shared.stats.record_handler_failure();
            warn!(worker_id, url = %request.url(), error = %e, "handler failed");
        }
        Err(panic) => {
            spider.shared.stats.record_handler_failure();
            error!(
                worker_id,
                url = %request.url(),
                panic = panic_message(&*panic),
                "handler panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
