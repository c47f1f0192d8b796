//! Recursive thread walking.
//!
//! The comment walker drives one continuation stream and forks a concurrent
//! sub-walk per reply-bearing comment, merging every emission into a single
//! outgoing item stream. The parent walk never waits for children before
//! fetching its own next page; it only joins them at the end so the stream
//! closes exactly once everything has been emitted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::WalkConfig;
use crate::error::CrawlError;
use crate::fetch::{PageFetcher, PageRequest};
use crate::models::{Continuation, Item, SortMode};
use crate::protocol;

/// Fallback poll delay when a live slice arrives without a timeout.
const DEFAULT_LIVE_POLL: Duration = Duration::from_secs(1);

/// Summary of one completed comment walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub comments: usize,
    pub pages: usize,
    pub reply_threads: usize,
    /// True when the continuation-count limit cut the walk short. Soft
    /// stop; whatever was collected is kept.
    pub limit_hit: bool,
}

/// Walks a comment section, fanning out reply threads.
pub struct CommentWalker {
    fetcher: Arc<dyn PageFetcher>,
    config: WalkConfig,
}

impl CommentWalker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: WalkConfig) -> Self {
        Self { fetcher, config }
    }

    /// Walk from `start`, following the requested sort order, emitting every
    /// comment exactly once into `tx`. Returns once the top-level stream and
    /// all forked reply sub-walks have finished.
    pub async fn run(
        &self,
        start: Continuation,
        sort: SortMode,
        tx: mpsc::Sender<Item>,
    ) -> Result<WalkSummary, CrawlError> {
        let mut summary = WalkSummary::default();
        let permits = Arc::new(Semaphore::new(self.config.max_reply_forks.max(1)));
        let mut handles: Vec<JoinHandle<Result<(usize, usize), CrawlError>>> = Vec::new();

        // Emission guard: live re-polling can serve overlapping pages.
        let mut seen: HashSet<String> = HashSet::new();
        // One sub-walk per thread, even if the thread reappears.
        let mut forked: HashSet<String> = HashSet::new();
        let mut used_tokens: HashSet<String> = HashSet::new();

        // Freshest Newest continuation, for live re-polling.
        let mut live_resume: Option<Continuation> = None;
        let mut sort_pinned = start.sort == sort && sort != SortMode::Live;

        let mut current = Some(start);
        'walk: while let Some(continuation) = current.take() {
            if summary.pages >= self.config.continuation_limit {
                warn!(
                    resource = %continuation.resource_id,
                    pages = summary.pages,
                    "continuation limit reached, stopping comment walk early"
                );
                summary.limit_hit = true;
                break;
            }

            used_tokens.insert(continuation.token.clone());
            let fetched = self
                .fetcher
                .fetch(&PageRequest::Comments {
                    continuation: continuation.clone(),
                })
                .await?;
            let page = protocol::parse_comment_page(&fetched.document, &continuation)?;
            summary.pages += 1;

            if sort == SortMode::Live {
                if let Some(newest) = page
                    .extra
                    .iter()
                    .find(|c| !c.is_reply() && c.sort == SortMode::Newest)
                {
                    live_resume = Some(newest.clone());
                }
            }

            // Choose the requested sort order once, on the first page that
            // exposes it. The pre-switch page belongs to the wrong ordering
            // and is not emitted.
            if !sort_pinned {
                sort_pinned = true;
                let wanted = match sort {
                    SortMode::Live => SortMode::Newest,
                    other => other,
                };
                if continuation.sort != wanted {
                    if let Some(alt) = page.extra.iter().find(|c| !c.is_reply() && c.sort == wanted)
                    {
                        debug!(sort = wanted.as_str(), "switching comment sort order");
                        current = Some(alt.clone());
                        continue;
                    }
                }
            }

            for item in page.items {
                if !seen.insert(item.id().to_string()) {
                    continue;
                }
                summary.comments += 1;
                if tx.send(item).await.is_err() {
                    // Receiver dropped; stop producing.
                    break 'walk;
                }
            }

            for reply in page.extra.into_iter().filter(Continuation::is_reply) {
                let parent = reply.parent_id.clone().unwrap_or_default();
                if !forked.insert(parent) {
                    continue;
                }
                summary.reply_threads += 1;
                handles.push(self.fork_replies(reply, tx.clone(), permits.clone()));
            }

            current = page.next;

            // Live mode: once the stream drains, resume from the freshest
            // Newest continuation so threads appearing mid-poll get walked.
            if current.is_none() && sort == SortMode::Live {
                if let Some(resume) = live_resume.clone() {
                    if !used_tokens.contains(&resume.token) {
                        current = Some(resume);
                    }
                }
            }
        }

        drop(tx);
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(Ok((comments, pages))) => {
                    summary.comments += comments;
                    summary.pages += pages;
                }
                Ok(Err(e)) => warn!(error = %e, "reply sub-walk failed"),
                Err(e) => warn!(error = %e, "reply sub-walk panicked"),
            }
        }
        Ok(summary)
    }

    /// Spawn a concurrent sub-walk over one reply thread. The task exists
    /// immediately; the semaphore caps how many fetch at once.
    fn fork_replies(
        &self,
        start: Continuation,
        tx: mpsc::Sender<Item>,
        permits: Arc<Semaphore>,
    ) -> JoinHandle<Result<(usize, usize), CrawlError>> {
        let fetcher = self.fetcher.clone();
        let limit = self.config.continuation_limit;

        tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .expect("reply fork semaphore closed");

            let mut comments = 0usize;
            let mut pages = 0usize;
            let mut current = Some(start);

            while let Some(continuation) = current.take() {
                if pages >= limit {
                    warn!(
                        parent = continuation.parent_id.as_deref().unwrap_or(""),
                        "continuation limit reached in reply thread"
                    );
                    break;
                }
                let fetched = fetcher
                    .fetch(&PageRequest::Comments {
                        continuation: continuation.clone(),
                    })
                    .await?;
                let page = protocol::parse_comment_page(&fetched.document, &continuation)?;
                pages += 1;

                for item in page.items {
                    comments += 1;
                    if tx.send(item).await.is_err() {
                        return Ok((comments, pages));
                    }
                }
                current = page.next;
            }
            Ok((comments, pages))
        })
    }
}

/// Summary of one live chat walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub messages: usize,
    pub pages: usize,
    pub limit_hit: bool,
}

/// Polls a live chat stream or drains a replay.
pub struct LiveChatWalker {
    fetcher: Arc<dyn PageFetcher>,
    config: WalkConfig,
}

impl LiveChatWalker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: WalkConfig) -> Self {
        Self { fetcher, config }
    }

    /// Follow the chat continuation chain. Live mode sleeps at least the
    /// server-declared timeout between polls; replay mode requests pages
    /// back-to-back until the continuation runs out.
    pub async fn run(
        &self,
        start: Continuation,
        replay: bool,
        tx: mpsc::Sender<Item>,
    ) -> Result<ChatSummary, CrawlError> {
        let mut summary = ChatSummary::default();
        let mut current = Some(start);

        while let Some(continuation) = current.take() {
            if continuation.is_empty() {
                break;
            }
            if summary.pages >= self.config.continuation_limit {
                warn!(
                    resource = %continuation.resource_id,
                    "continuation limit reached, stopping chat walk"
                );
                summary.limit_hit = true;
                break;
            }

            let fetched = self
                .fetcher
                .fetch(&PageRequest::LiveChat {
                    continuation: continuation.clone(),
                    replay,
                })
                .await?;
            let page = protocol::parse_chat_page(&fetched.document, &continuation)?;
            summary.pages += 1;

            for item in page.items {
                summary.messages += 1;
                if tx.send(item).await.is_err() {
                    return Ok(summary);
                }
            }

            current = page.next;

            // The timeout is a mandatory minimum poll delay, not a hint.
            if !replay && current.is_some() {
                tokio::time::sleep(page.timeout.unwrap_or(DEFAULT_LIVE_POLL)).await;
            }
        }

        Ok(summary)
    }
}
