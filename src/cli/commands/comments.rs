//! `vida comments` - walk a comment section to stdout.

use anyhow::{bail, Context};
use console::style;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::fetch::{PageFetcher, PageRequest};
use crate::models::SortMode;
use crate::protocol;
use crate::walker::CommentWalker;

pub async fn cmd_comments(
    settings: &Settings,
    video_id: &str,
    sort: SortMode,
    limit: usize,
) -> anyhow::Result<()> {
    let fetcher = super::build_fetcher(settings)?;

    let fetched = fetcher
        .fetch(&PageRequest::VideoPage {
            video_id: video_id.to_string(),
        })
        .await
        .with_context(|| format!("fetching video {video_id}"))?;
    let page = protocol::parse_video_page(&fetched.document, video_id, fetched.session.as_ref())?;

    let Some(start) = page.initial_comment_continuation else {
        bail!("video {video_id} has no comment section (disabled, or no session)");
    };

    let walker = CommentWalker::new(fetcher, settings.walk);
    let (tx, mut rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move { walker.run(start, sort, tx).await });

    let mut emitted = 0usize;
    while let Some(item) = rx.recv().await {
        println!("{}", serde_json::to_string(&item)?);
        emitted += 1;
        if limit > 0 && emitted >= limit {
            break;
        }
    }
    // Dropping the receiver stops the walker at its next send.
    drop(rx);

    match handle.await? {
        Ok(summary) => {
            eprintln!(
                "{} {} comments across {} pages ({} reply threads){}",
                style("✓").green(),
                emitted,
                summary.pages,
                summary.reply_threads,
                if summary.limit_hit {
                    " [stopped at continuation limit]"
                } else {
                    ""
                }
            );
        }
        // Walk failures after a truncating limit are expected; anything else
        // surfaces only when nothing was emitted.
        Err(e) if limit > 0 && emitted >= limit => {
            tracing::debug!(error = %e, "walk ended after output limit");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
