//! Work queue for crawl jobs.
//!
//! The scheduler core only needs push, non-blocking pop, and an approximate
//! length from its queue; the backing store is abstract so a persistent
//! implementation can be swapped in.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::CrawlJob;

/// Abstract FIFO of crawl jobs.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn push(&self, job: CrawlJob);
    /// Non-blocking pop: `None` means currently empty, not closed.
    async fn pop(&self) -> Option<CrawlJob>;
    /// Approximate length.
    async fn len(&self) -> usize;
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// In-memory FIFO with a size cap. When the cap is hit the oldest entries
/// are dropped to bound memory under runaway discovery fan-out.
pub struct MemoryQueue {
    jobs: Mutex<VecDeque<CrawlJob>>,
    cap: usize,
}

impl MemoryQueue {
    /// `cap` of 0 means unbounded.
    pub fn new(cap: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            cap,
        }
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn push(&self, job: CrawlJob) {
        let mut jobs = self.jobs.lock().await;
        if self.cap > 0 && jobs.len() >= self.cap {
            if let Some(dropped) = jobs.pop_front() {
                warn!(
                    resource = %dropped.resource_id,
                    cap = self.cap,
                    "work queue full, dropping oldest job"
                );
            }
        }
        jobs.push_back(job);
    }

    async fn pop(&self) -> Option<CrawlJob> {
        self.jobs.lock().await.pop_front()
    }

    async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobKind;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MemoryQueue::new(0);
        queue.push(CrawlJob::seed("a", JobKind::Video)).await;
        queue.push(CrawlJob::seed("b", JobKind::Video)).await;
        assert_eq!(queue.pop().await.unwrap().resource_id, "a");
        assert_eq!(queue.pop().await.unwrap().resource_id, "b");
        assert!(queue.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_cap_drops_oldest() {
        let queue = MemoryQueue::new(2);
        queue.push(CrawlJob::seed("a", JobKind::Video)).await;
        queue.push(CrawlJob::seed("b", JobKind::Video)).await;
        queue.push(CrawlJob::seed("c", JobKind::Video)).await;
        assert_eq!(queue.len().await, 2);
        assert_eq!(queue.pop().await.unwrap().resource_id, "b");
        assert_eq!(queue.pop().await.unwrap().resource_id, "c");
    }
}
