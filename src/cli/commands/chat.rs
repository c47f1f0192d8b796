//! `vida chat` - stream live chat messages to stdout.

use anyhow::{bail, Context};
use console::style;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::fetch::{PageFetcher, PageRequest};
use crate::protocol;
use crate::walker::LiveChatWalker;

pub async fn cmd_chat(settings: &Settings, video_id: &str, replay: bool) -> anyhow::Result<()> {
    let fetcher = super::build_fetcher(settings)?;

    let fetched = fetcher
        .fetch(&PageRequest::VideoPage {
            video_id: video_id.to_string(),
        })
        .await
        .with_context(|| format!("fetching video {video_id}"))?;
    let page = protocol::parse_video_page(&fetched.document, video_id, fetched.session.as_ref())?;

    let Some(start) = page.initial_chat_continuation else {
        bail!("video {video_id} has no live chat");
    };

    let walker = LiveChatWalker::new(fetcher, settings.walk);
    let (tx, mut rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move { walker.run(start, replay, tx).await });

    let mut emitted = 0usize;
    while let Some(item) = rx.recv().await {
        println!("{}", serde_json::to_string(&item)?);
        emitted += 1;
    }

    let summary = handle.await??;
    eprintln!(
        "{} {} messages across {} pages",
        style("✓").green(),
        emitted,
        summary.pages
    );
    Ok(())
}
