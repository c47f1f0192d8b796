//! `vida video` - fetch one video's metadata.

use anyhow::Context;
use console::style;

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::fetch::{PageFetcher, PageRequest};
use crate::protocol;

pub async fn cmd_video(
    settings: &Settings,
    video_id: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let fetcher = super::build_fetcher(settings)?;

    let fetched = fetcher
        .fetch(&PageRequest::VideoPage {
            video_id: video_id.to_string(),
        })
        .await
        .with_context(|| format!("fetching video {video_id}"))?;
    let page = protocol::parse_video_page(&fetched.document, video_id, fetched.session.as_ref())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.video)?),
        OutputFormat::Jsonl => println!("{}", serde_json::to_string(&page.video)?),
    }

    if page.initial_comment_continuation.is_none() {
        eprintln!(
            "{} comments unavailable for this video",
            style("!").yellow()
        );
    }
    Ok(())
}
