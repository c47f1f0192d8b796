//! Crawl scheduler.
//!
//! A fixed pool of workers pulls jobs from a shared queue, runs one
//! synchronous fetch-parse-discover cycle per job, folds newly discovered
//! IDs back into the queue through the dedup record, and pushes results
//! downstream to the batch sink. Concurrency comes from running N cycles in
//! parallel, not from any single cycle being internally concurrent.

mod dedup;
mod queue;

pub use dedup::DedupRecord;
pub use queue::{MemoryQueue, WorkQueue};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{CrawlConfig, WalkConfig};
use crate::error::CrawlError;
use crate::fetch::{channel_page_token, PageFetcher, PageRequest};
use crate::models::{
    Continuation, CrawlFailure, CrawlJob, CrawlResult, CrawlStats, Item, ItemBatch, JobKind,
    SortMode,
};
use crate::protocol;

/// Live counters shared with progress displays.
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub visited: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub failed: AtomicUsize,
    pub discovered: AtomicUsize,
    pub requeued: AtomicUsize,
}

impl CrawlCounters {
    pub fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            visited: self.visited.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
        }
    }
}

pub struct Scheduler {
    fetcher: Arc<dyn PageFetcher>,
    queue: Arc<dyn WorkQueue>,
    dedup: Arc<DedupRecord>,
    config: CrawlConfig,
    walk: WalkConfig,
    counters: Arc<CrawlCounters>,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        queue: Arc<dyn WorkQueue>,
        config: CrawlConfig,
        walk: WalkConfig,
    ) -> Self {
        Self {
            fetcher,
            queue,
            dedup: Arc::new(DedupRecord::new(config.dedup_cap)),
            config,
            walk,
            counters: Arc::new(CrawlCounters::default()),
        }
    }

    pub fn counters(&self) -> Arc<CrawlCounters> {
        self.counters.clone()
    }

    /// Seed the queue. Seeds pass through the dedup record exactly like
    /// discovered work, so repeated seed IDs collapse to one job.
    pub async fn seed(&self, jobs: impl IntoIterator<Item = CrawlJob>) -> usize {
        let mut accepted = 0;
        for job in jobs {
            if self.dedup.try_claim(&job.resource_id).await {
                self.queue.push(job).await;
                accepted += 1;
            }
        }
        accepted
    }

    /// Run workers until the queue drains, the success limit is reached, or
    /// the cancel signal flips. In-flight fetches finish before exit.
    pub async fn run(
        &self,
        result_tx: mpsc::Sender<CrawlResult>,
        cancel: watch::Receiver<bool>,
    ) -> CrawlStats {
        let inflight = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(self.config.workers);

        for worker_id in 0..self.config.workers.max(1) {
            let fetcher = self.fetcher.clone();
            let queue = self.queue.clone();
            let dedup = self.dedup.clone();
            let counters = self.counters.clone();
            let inflight = inflight.clone();
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            let config = self.config;
            let walk = self.walk;

            handles.push(tokio::spawn(async move {
                worker_loop(
                    worker_id, fetcher, queue, dedup, counters, inflight, result_tx, cancel,
                    config, walk,
                )
                .await;
            }));
        }
        drop(result_tx);

        for handle in handles {
            let _ = handle.await;
        }

        let stats = self.counters.snapshot();
        info!(
            visited = stats.visited,
            succeeded = stats.succeeded,
            failed = stats.failed,
            discovered = stats.discovered,
            "crawl finished"
        );
        stats
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    fetcher: Arc<dyn PageFetcher>,
    queue: Arc<dyn WorkQueue>,
    dedup: Arc<DedupRecord>,
    counters: Arc<CrawlCounters>,
    inflight: Arc<AtomicUsize>,
    result_tx: mpsc::Sender<CrawlResult>,
    cancel: watch::Receiver<bool>,
    config: CrawlConfig,
    walk: WalkConfig,
) {
    loop {
        if *cancel.borrow() {
            debug!(worker_id, "cancel signal observed, worker exiting");
            break;
        }
        if config.limit > 0 && counters.succeeded.load(Ordering::Relaxed) >= config.limit {
            break;
        }

        let job = match queue.pop().await {
            Some(job) => {
                inflight.fetch_add(1, Ordering::SeqCst);
                job
            }
            None => {
                // Another worker may still be mid-cycle and about to
                // discover more work; only exit once nothing is in flight.
                if inflight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                tokio::time::sleep(config.idle_backoff()).await;
                continue;
            }
        };

        counters.visited.fetch_add(1, Ordering::Relaxed);
        debug!(worker_id, resource = %job.resource_id, kind = job.kind.as_str(), "dispatching job");

        match crawl_job(fetcher.as_ref(), &job, &walk).await {
            Ok((items, refs)) => {
                counters.succeeded.fetch_add(1, Ordering::Relaxed);

                let within_depth = config.max_depth == 0 || job.depth < config.max_depth;
                if within_depth {
                    for id in refs {
                        if dedup.try_claim(&id).await {
                            counters.discovered.fetch_add(1, Ordering::Relaxed);
                            queue
                                .push(CrawlJob::discovered(id, JobKind::Video, job.depth))
                                .await;
                        }
                    }
                }

                let batch = ItemBatch {
                    items,
                    crawled_at: Utc::now(),
                    worker_id,
                };
                if result_tx.send(CrawlResult::Items(batch)).await.is_err() {
                    inflight.fetch_sub(1, Ordering::SeqCst);
                    break;
                }
            }
            Err(cause) => {
                if matches!(cause, CrawlError::RateLimited) {
                    // Challenge pages get a much heavier backoff than plain
                    // network hiccups.
                    let delay = Duration::from_millis(500u64 << job.attempts.min(5));
                    tokio::time::sleep(delay).await;
                }

                if cause.is_retryable() && job.attempts < config.max_retries {
                    counters.requeued.fetch_add(1, Ordering::Relaxed);
                    queue.push(job.clone().retried()).await;
                } else {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(resource = %job.resource_id, error = %cause, "job failed");
                }

                // Every failure occurrence reaches the sink so the
                // systemic-failure window sees rate limiting early.
                let failure = CrawlFailure {
                    resource_id: job.resource_id.clone(),
                    cause,
                };
                if result_tx.send(CrawlResult::Failure(failure)).await.is_err() {
                    inflight.fetch_sub(1, Ordering::SeqCst);
                    break;
                }
            }
        }

        inflight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One synchronous fetch-parse-discover cycle.
async fn crawl_job(
    fetcher: &dyn PageFetcher,
    job: &CrawlJob,
    walk: &WalkConfig,
) -> Result<(Vec<Item>, Vec<String>), CrawlError> {
    match job.kind {
        JobKind::Video => {
            let fetched = fetcher
                .fetch(&PageRequest::VideoPage {
                    video_id: job.resource_id.clone(),
                })
                .await?;
            let page = protocol::parse_video_page(
                &fetched.document,
                &job.resource_id,
                fetched.session.as_ref(),
            )?;
            let refs = page.video.related_video_ids.clone();
            Ok((vec![Item::Video(page.video)], refs))
        }
        JobKind::Channel => {
            let items = collect_channel_videos(fetcher, &job.resource_id, walk).await?;
            let refs = items.iter().flat_map(Item::discovered_video_ids).collect();
            Ok((items, refs))
        }
    }
}

/// Page through a channel's video listing until end-of-data.
pub async fn collect_channel_videos(
    fetcher: &dyn PageFetcher,
    channel_id: &str,
    walk: &WalkConfig,
) -> Result<Vec<Item>, CrawlError> {
    let start = Continuation::top_level(
        channel_page_token(channel_id, 1),
        channel_id,
        SortMode::Top,
    );

    let mut items = Vec::new();
    let mut pages = 0usize;
    let mut current = Some(start);

    while let Some(continuation) = current.take() {
        if pages >= walk.continuation_limit {
            warn!(channel = channel_id, pages, "continuation limit reached on channel listing");
            break;
        }
        let fetched = fetcher
            .fetch(&PageRequest::Browse {
                continuation: continuation.clone(),
            })
            .await?;
        let page = protocol::parse_browse_page(&fetched.document, &continuation)?;
        pages += 1;

        if page.items.is_empty() {
            break;
        }
        items.extend(page.items);
        current = page.next;
    }

    Ok(items)
}
