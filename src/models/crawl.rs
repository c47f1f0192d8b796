//! Crawl scheduler work and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CrawlError;
use crate::models::Item;

/// Kind of resource a crawl job targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Video,
    Channel,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Channel => "channel",
        }
    }
}

/// A unit of scheduler work: one resource to fetch.
///
/// Created when enqueued (seed input or discovery), mutated only by the
/// scheduler, dropped when dispatched or deduplicated away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    pub resource_id: String,
    pub kind: JobKind,
    /// 0 for seeds; parent depth + 1 for discovered jobs.
    pub depth: u32,
    /// Dispatch attempts so far. Incremented when requeued after a
    /// retryable failure.
    pub attempts: u32,
}

impl CrawlJob {
    /// Seed job provided as initial input.
    pub fn seed(resource_id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            resource_id: resource_id.into(),
            kind,
            depth: 0,
            attempts: 0,
        }
    }

    /// Job discovered from a previous job's result.
    pub fn discovered(resource_id: impl Into<String>, kind: JobKind, parent_depth: u32) -> Self {
        Self {
            resource_id: resource_id.into(),
            kind,
            depth: parent_depth + 1,
            attempts: 0,
        }
    }

    /// The same job, one attempt later.
    pub fn retried(mut self) -> Self {
        self.attempts += 1;
        self
    }
}

/// A batch of items produced by one worker cycle, with provenance.
#[derive(Debug)]
pub struct ItemBatch {
    pub items: Vec<Item>,
    pub crawled_at: DateTime<Utc>,
    pub worker_id: usize,
}

/// A failed crawl of one resource.
#[derive(Debug)]
pub struct CrawlFailure {
    pub resource_id: String,
    pub cause: CrawlError,
}

/// Outcome of one dispatched job, consumed by the batch sink.
#[derive(Debug)]
pub enum CrawlResult {
    Items(ItemBatch),
    Failure(CrawlFailure),
}

/// Counters summarizing a scheduler run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    /// Jobs dispatched to a worker.
    pub visited: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Newly seen IDs folded back into the queue.
    pub discovered: usize,
    /// Retryable failures put back on the queue.
    pub requeued: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovered_job_depth() {
        let parent = CrawlJob::seed("a", JobKind::Video);
        let child = CrawlJob::discovered("b", JobKind::Video, parent.depth);
        assert_eq!(child.depth, 1);
        assert_eq!(child.attempts, 0);
    }

    #[test]
    fn test_retried_increments_attempts() {
        let job = CrawlJob::seed("a", JobKind::Video).retried().retried();
        assert_eq!(job.attempts, 2);
    }
}
