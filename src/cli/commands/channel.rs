//! `vida channel` - list a channel's videos.

use console::style;

use crate::config::Settings;
use crate::scheduler::collect_channel_videos;

pub async fn cmd_channel(settings: &Settings, channel_id: &str) -> anyhow::Result<()> {
    let fetcher = super::build_fetcher(settings)?;

    let items = collect_channel_videos(fetcher.as_ref(), channel_id, &settings.walk).await?;
    for item in &items {
        println!("{}", serde_json::to_string(item)?);
    }
    eprintln!("{} {} videos", style("✓").green(), items.len());
    Ok(())
}
