//! `vida crawl` - bounded-concurrency crawl from seed resources.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::config::Settings;
use crate::models::{CrawlJob, JobKind};
use crate::scheduler::{MemoryQueue, Scheduler, WorkQueue};
use crate::sink::{BatchSink, JsonlStore};

pub async fn cmd_crawl(
    settings: &Settings,
    seeds: Vec<String>,
    channels: bool,
    output: &Path,
) -> anyhow::Result<()> {
    let fetcher = super::build_fetcher(settings)?;
    let queue: Arc<dyn WorkQueue> = Arc::new(MemoryQueue::new(settings.crawl.queue_cap));
    let scheduler = Scheduler::new(fetcher, queue, settings.crawl, settings.walk);

    let kind = if channels {
        JobKind::Channel
    } else {
        JobKind::Video
    };
    let accepted = scheduler
        .seed(seeds.iter().map(|id| CrawlJob::seed(id.clone(), kind)))
        .await;
    if accepted == 0 {
        bail!("no seeds accepted");
    }

    let store = Arc::new(JsonlStore::new(output));
    let sink = BatchSink::new(settings.sink, settings.crawl.workers, store);

    let (result_tx, result_rx) = mpsc::channel(settings.crawl.workers.max(1) * 4);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    // Ctrl-C flips the same cancel signal the failure breaker uses; workers
    // finish their in-flight jobs and the sink flushes what it has.
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cancel_tx = cancel_tx.clone();
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupted.store(true, Ordering::SeqCst);
                warn!("interrupt received, finishing in-flight work");
                let _ = cancel_tx.send(true);
            }
        });
    }

    let sink_handle = tokio::spawn(async move { sink.run(result_rx, cancel_tx).await });

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    let progress_handle = {
        let pb = pb.clone();
        let counters = scheduler.counters();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(500));
            loop {
                ticker.tick().await;
                let stats = counters.snapshot();
                pb.set_message(format!(
                    "crawled {} ({} failed, {} discovered, {} requeued)",
                    stats.succeeded, stats.failed, stats.discovered, stats.requeued
                ));
            }
        })
    };

    let stats = scheduler.run(result_tx, cancel_rx).await;
    let report = sink_handle.await?;
    progress_handle.abort();
    pb.finish_and_clear();

    println!(
        "{} crawled {} resources: {} items written to {} ({} failed)",
        style("✓").green(),
        stats.succeeded,
        report.flushed_items,
        output.display(),
        stats.failed
    );

    if report.fatal {
        bail!("crawl aborted: systemic failure threshold tripped");
    }
    if interrupted.load(Ordering::SeqCst) {
        std::process::exit(130);
    }
    Ok(())
}
