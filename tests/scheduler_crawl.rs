//! Crawl scheduler behavior: dedup across discovery cycles, depth bounds,
//! and the sink's systemic-failure circuit breaker.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};

use vidacquire::config::{CrawlConfig, FailurePolicy, SinkConfig, WalkConfig};
use vidacquire::error::CrawlError;
use vidacquire::fetch::{FetchedPage, PageFetcher, PageRequest};
use vidacquire::models::{CrawlJob, CrawlResult, Item, JobKind};
use vidacquire::scheduler::{MemoryQueue, Scheduler, WorkQueue};
use vidacquire::sink::{BatchSink, MemoryStore};

fn video_doc(id: &str, related: &[&str]) -> Value {
    json!({
        "playerResponse": {
            "playabilityStatus": {"status": "OK"},
            "videoDetails": {"videoId": id, "title": format!("video {id}")}
        },
        "response": {"contents": {"twoColumnWatchNextResults": {
            "secondaryResults": {"secondaryResults": {"results":
                related.iter()
                    .map(|r| json!({"compactVideoRenderer": {"videoId": r}}))
                    .collect::<Vec<_>>()
            }}
        }}}
    })
}

struct GraphFetcher {
    docs: HashMap<String, Value>,
}

impl GraphFetcher {
    fn new(edges: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            docs: edges
                .iter()
                .map(|(id, related)| (id.to_string(), video_doc(id, related)))
                .collect(),
        })
    }
}

#[async_trait]
impl PageFetcher for GraphFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, CrawlError> {
        let PageRequest::VideoPage { video_id } = request else {
            return Err(CrawlError::mismatch("?", "unexpected request shape"));
        };
        let document = self
            .docs
            .get(video_id)
            .cloned()
            .ok_or_else(|| CrawlError::ResourceUnavailable(video_id.clone()))?;
        Ok(FetchedPage {
            document,
            session: None,
        })
    }
}

/// Every fetch fails as if a challenge page came back.
struct RateLimitedFetcher;

#[async_trait]
impl PageFetcher for RateLimitedFetcher {
    async fn fetch(&self, _request: &PageRequest) -> Result<FetchedPage, CrawlError> {
        Err(CrawlError::RateLimited)
    }
}

fn scheduler_with(fetcher: Arc<dyn PageFetcher>, config: CrawlConfig) -> Scheduler {
    let queue: Arc<dyn WorkQueue> = Arc::new(MemoryQueue::new(config.queue_cap));
    Scheduler::new(fetcher, queue, config, WalkConfig::default())
}

async fn drain_items(mut rx: mpsc::Receiver<CrawlResult>) -> (Vec<Item>, usize) {
    let mut items = Vec::new();
    let mut failures = 0;
    while let Some(result) = rx.recv().await {
        match result {
            CrawlResult::Items(batch) => items.extend(batch.items),
            CrawlResult::Failure(_) => failures += 1,
        }
    }
    (items, failures)
}

#[tokio::test]
async fn test_discovery_cycle_visits_each_resource_once() {
    // A <-> B cycle plus one leaf each; dedup must break the loop.
    let fetcher = GraphFetcher::new(&[
        ("A", &["B", "C"]),
        ("B", &["A", "D"]),
        ("C", &[]),
        ("D", &[]),
    ]);
    let config = CrawlConfig {
        workers: 3,
        ..CrawlConfig::default()
    };
    let scheduler = scheduler_with(fetcher, config);
    assert_eq!(
        scheduler.seed([CrawlJob::seed("A", JobKind::Video)]).await,
        1
    );

    let (tx, rx) = mpsc::channel(16);
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let drain = tokio::spawn(drain_items(rx));
    let stats = scheduler.run(tx, cancel_rx).await;
    let (items, failures) = drain.await.unwrap();

    assert_eq!(stats.visited, 4);
    assert_eq!(stats.succeeded, 4);
    assert_eq!(failures, 0);

    let ids: Vec<&str> = items.iter().map(Item::id).collect();
    let unique: HashSet<&&str> = ids.iter().collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(unique.len(), 4, "resource crawled twice: {ids:?}");
    // A was discovered again from B but never requeued.
    assert_eq!(stats.discovered, 3);
}

#[tokio::test]
async fn test_max_depth_bounds_discovery() {
    let fetcher = GraphFetcher::new(&[("A", &["B"]), ("B", &["C"]), ("C", &["D"]), ("D", &[])]);
    let config = CrawlConfig {
        workers: 2,
        max_depth: 1,
        ..CrawlConfig::default()
    };
    let scheduler = scheduler_with(fetcher, config);
    scheduler.seed([CrawlJob::seed("A", JobKind::Video)]).await;

    let (tx, rx) = mpsc::channel(16);
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let drain = tokio::spawn(drain_items(rx));
    let stats = scheduler.run(tx, cancel_rx).await;
    let (items, _) = drain.await.unwrap();

    // Seed at depth 0 discovers B at depth 1; B's own edges stay unexplored.
    assert_eq!(stats.visited, 2);
    let ids: HashSet<&str> = items.iter().map(Item::id).collect();
    assert_eq!(ids, ["A", "B"].into_iter().collect());
}

#[tokio::test]
async fn test_seed_dedup_collapses_duplicates() {
    let fetcher = GraphFetcher::new(&[("A", &[])]);
    let scheduler = scheduler_with(fetcher, CrawlConfig::default());
    let accepted = scheduler
        .seed([
            CrawlJob::seed("A", JobKind::Video),
            CrawlJob::seed("A", JobKind::Video),
        ])
        .await;
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn test_terminal_failures_are_not_requeued() {
    // B is missing from the graph; unavailable is terminal, so it fails
    // exactly once with no retries.
    let fetcher = GraphFetcher::new(&[("A", &["B"])]);
    let config = CrawlConfig {
        workers: 2,
        max_retries: 3,
        ..CrawlConfig::default()
    };
    let scheduler = scheduler_with(fetcher, config);
    scheduler.seed([CrawlJob::seed("A", JobKind::Video)]).await;

    let (tx, rx) = mpsc::channel(16);
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let drain = tokio::spawn(drain_items(rx));
    let stats = scheduler.run(tx, cancel_rx).await;
    let (_, failures) = drain.await.unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.requeued, 0);
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn test_systemic_failures_trip_breaker_and_cancel_crawl() {
    let config = CrawlConfig {
        workers: 2,
        max_retries: 0,
        ..CrawlConfig::default()
    };
    let scheduler = scheduler_with(Arc::new(RateLimitedFetcher), config);
    scheduler
        .seed((0..5).map(|i| CrawlJob::seed(format!("v{i}"), JobKind::Video)))
        .await;

    let store = Arc::new(MemoryStore::new());
    let sink_config = SinkConfig {
        failure: FailurePolicy {
            threshold: 3,
            window_secs: 60,
        },
        ..SinkConfig::default()
    };
    let sink = BatchSink::new(sink_config, config.workers, store);

    let (tx, rx) = mpsc::channel(16);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let sink_handle = tokio::spawn(async move { sink.run(rx, cancel_tx).await });

    let stats = scheduler.run(tx, cancel_rx).await;
    let report = sink_handle.await.unwrap();

    assert!(report.fatal, "failure threshold should have tripped");
    assert_eq!(stats.succeeded, 0);
    assert!(report.failures >= 3);
}
