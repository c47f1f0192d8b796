//! Batch persistence sink.
//!
//! Single consumer of the crawl result stream. Items accumulate into
//! batches flushed on size or idle interval; failures feed a sliding
//! time window that trips a fatal abort when systemic failures (rate
//! limiting, repeated server errors) pile up faster than the crawl is
//! worth continuing.

mod store;

pub use store::{JsonlStore, MemoryStore, ResultStore};

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::SinkConfig;
use crate::models::{CrawlResult, Item};

/// Outcome of a completed sink run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub flushed_items: usize,
    pub flushes: usize,
    pub failures: usize,
    /// True when the failure threshold tripped and the crawl was aborted.
    pub fatal: bool,
}

pub struct BatchSink {
    config: SinkConfig,
    /// Worker count of the producing scheduler, for threshold derivation.
    workers: usize,
    store: Arc<dyn ResultStore>,
}

impl BatchSink {
    pub fn new(config: SinkConfig, workers: usize, store: Arc<dyn ResultStore>) -> Self {
        Self {
            config,
            workers,
            store,
        }
    }

    /// Consume results until the channel closes. On a tripped failure
    /// threshold, signals `cancel_tx` and keeps draining so in-flight
    /// batches still land.
    pub async fn run(
        &self,
        mut rx: mpsc::Receiver<CrawlResult>,
        cancel_tx: watch::Sender<bool>,
    ) -> SinkReport {
        let threshold = self.config.failure.effective_threshold(self.workers);
        let window = self.config.failure.window();

        let mut report = SinkReport::default();
        let mut batch: Vec<Item> = Vec::with_capacity(self.config.batch_size);
        let mut failure_times: VecDeque<Instant> = VecDeque::new();
        let mut ticker = tokio::time::interval(self.config.flush_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = rx.recv() => {
                    let Some(result) = result else {
                        break;
                    };
                    match result {
                        CrawlResult::Items(item_batch) => {
                            batch.extend(item_batch.items);
                            if batch.len() >= self.config.batch_size {
                                self.flush(&mut batch, &mut report).await;
                            }
                        }
                        CrawlResult::Failure(failure) => {
                            report.failures += 1;
                            if !failure.cause.is_systemic() {
                                continue;
                            }
                            let now = Instant::now();
                            failure_times.push_back(now);
                            while failure_times
                                .front()
                                .is_some_and(|t| now.duration_since(*t) > window)
                            {
                                failure_times.pop_front();
                            }
                            if !report.fatal && failure_times.len() >= threshold {
                                report.fatal = true;
                                error!(
                                    count = failure_times.len(),
                                    threshold,
                                    window_secs = self.config.failure.window_secs,
                                    "systemic failure threshold tripped, aborting crawl"
                                );
                                let _ = cancel_tx.send(true);
                            }
                        }
                    }
                }
                _ = ticker.tick() => {
                    if !batch.is_empty() {
                        debug!(pending = batch.len(), "idle flush");
                        self.flush(&mut batch, &mut report).await;
                    }
                }
            }
        }

        // Final flush of whatever is left when producers hang up.
        if !batch.is_empty() {
            self.flush(&mut batch, &mut report).await;
        }
        info!(
            items = report.flushed_items,
            flushes = report.flushes,
            failures = report.failures,
            "sink drained"
        );
        report
    }

    async fn flush(&self, batch: &mut Vec<Item>, report: &mut SinkReport) {
        match self.store.write(batch).await {
            Ok(()) => {
                report.flushed_items += batch.len();
                report.flushes += 1;
            }
            Err(e) => {
                // Dropping the batch keeps the crawl alive; losing a page of
                // items beats wedging every worker behind a broken store.
                warn!(error = %e, dropped = batch.len(), "flush failed, dropping batch");
            }
        }
        batch.clear();
    }
}
