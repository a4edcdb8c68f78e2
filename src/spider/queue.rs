// src/spider/queue.rs
// =============================================================================
// The work queue: an unbounded FIFO of requests shared by all workers.
//
// Besides the items themselves the queue tracks how many requests have been
// dequeued but not yet marked done ("in flight"). The queue is drained when
// there is nothing queued AND nothing in flight. That is the only signal the
// scheduler uses to decide the crawl is over.
//
// How it works:
// - enqueue(): push under the lock, then add one semaphore permit
// - dequeue(): wait for a permit (a real suspension point, no polling),
//   then pop the item the permit stands for
// - mark_done(): decrement in-flight
// - join(): wait on a watch channel carrying `queued + in_flight`
//
// The watch value is republished under the lock on every change, so a handler
// that enqueues new work while the scheduler sits in join() simply pushes the
// count back up; join() only returns once the count is observed at zero.
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{watch, Semaphore};
use tracing::warn;

use super::request::Request;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<Request>,
    in_flight: usize,
}

impl QueueState {
    fn unfinished(&self) -> usize {
        self.items.len() + self.in_flight
    }
}

#[derive(Debug)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    // One permit per queued item
    available: Semaphore,
    unfinished: watch::Sender<usize>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        let (unfinished, _) = watch::channel(0);
        Self {
            state: Mutex::new(QueueState::default()),
            available: Semaphore::new(0),
            unfinished,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a request to the tail. Never blocks.
    pub fn enqueue(&self, request: Request) {
        {
            let mut state = self.lock();
            state.items.push_back(request);
            self.unfinished.send_replace(state.unfinished());
        }
        self.available.add_permits(1);
    }

    /// Waits for the next request.
    ///
    /// Returns None once the queue has been closed. Dropping the returned
    /// future before it completes takes nothing off the queue.
    pub async fn dequeue(&self) -> Option<Request> {
        let permit = self.available.acquire().await.ok()?;
        permit.forget();

        let mut state = self.lock();
        let request = state.items.pop_front()?;
        state.in_flight += 1;
        Some(request)
    }

    /// Marks one dequeued request as finished, successfully or not.
    pub fn mark_done(&self) {
        let mut state = self.lock();
        if state.in_flight == 0 {
            warn!("mark_done called with no request in flight");
            return;
        }
        state.in_flight -= 1;
        self.unfinished.send_replace(state.unfinished());
    }

    /// Waits until nothing is queued and nothing is in flight.
    pub async fn join(&self) {
        let mut unfinished = self.unfinished.subscribe();
        // The sender lives in `self`, so the channel can't close under us
        let _ = unfinished.wait_for(|count| *count == 0).await;
    }

    /// Wakes every worker waiting in dequeue(); they all get None.
    pub fn close(&self) {
        self.available.close();
    }

    pub fn is_closed(&self) -> bool {
        self.available.is_closed()
    }

    /// Requests waiting to be picked up
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn is_drained(&self) -> bool {
        self.lock().unfinished() == 0
    }
}

/// Marks its request done when dropped, so every exit path of a worker's
/// fetch-and-handle cycle (including a panic) counts exactly once.
pub struct DoneGuard<'q> {
    queue: &'q WorkQueue,
}

impl<'q> DoneGuard<'q> {
    pub fn new(queue: &'q WorkQueue) -> Self {
        Self { queue }
    }
}

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.queue.mark_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spider::handler::noop;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn request(url: &str) -> Request {
        Request::get(url, noop())
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.enqueue(request("a"));
        queue.enqueue(request("b"));
        queue.enqueue(request("c"));

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(queue.dequeue().await.unwrap().url().to_string());
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(queue.in_flight(), 3);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_join_on_empty_queue_returns_immediately() {
        let queue = WorkQueue::new();
        timeout(Duration::from_millis(100), queue.join())
            .await
            .expect("join should not wait on an empty queue");
    }

    #[tokio::test]
    async fn test_join_waits_for_mark_done() {
        let queue = Arc::new(WorkQueue::new());
        queue.enqueue(request("a"));
        let _item = queue.dequeue().await.unwrap();

        // Queue is empty but one request is still in flight
        assert!(queue.is_empty());
        assert!(!queue.is_drained());
        assert!(timeout(Duration::from_millis(50), queue.join()).await.is_err());

        queue.mark_done();
        timeout(Duration::from_millis(100), queue.join())
            .await
            .expect("join should resolve once the last request is done");
    }

    #[tokio::test]
    async fn test_join_sees_work_added_while_waiting() {
        let queue = Arc::new(WorkQueue::new());
        queue.enqueue(request("a"));

        let joiner = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.join().await })
        };

        // A handler for "a" queues "b" before "a" is marked done
        let _a = queue.dequeue().await.unwrap();
        queue.enqueue(request("b"));
        queue.mark_done();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!joiner.is_finished());

        let _b = queue.dequeue().await.unwrap();
        queue.mark_done();
        timeout(Duration::from_millis(100), joiner)
            .await
            .expect("join should resolve after b")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_enqueue() {
        let queue = Arc::new(WorkQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await.map(|r| r.url().to_string()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        queue.enqueue(request("late"));
        assert_eq!(consumer.await.unwrap().as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_workers() {
        let queue = Arc::new(WorkQueue::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.dequeue().await.is_none() })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();
        assert!(queue.is_closed());

        for waiter in waiters {
            assert!(timeout(Duration::from_millis(100), waiter).await.unwrap().unwrap());
        }
    }

    #[tokio::test]
    async fn test_dropped_dequeue_keeps_item() {
        let queue = WorkQueue::new();
        assert!(timeout(Duration::from_millis(10), queue.dequeue()).await.is_err());

        queue.enqueue(request("a"));
        assert_eq!(queue.dequeue().await.unwrap().url(), "a");
    }

    #[tokio::test]
    async fn test_done_guard_marks_done_once() {
        let queue = WorkQueue::new();
        queue.enqueue(request("a"));
        let _a = queue.dequeue().await.unwrap();
        {
            let _guard = DoneGuard::new(&queue);
        }
        assert_eq!(queue.in_flight(), 0);
        assert!(queue.is_drained());

        // An extra mark_done is ignored rather than underflowing
        queue.mark_done();
        assert_eq!(queue.in_flight(), 0);
    }
}
