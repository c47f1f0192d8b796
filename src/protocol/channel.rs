//! Channel and playlist page parsing.
//!
//! Both arrive through the browse endpoint and yield video references plus a
//! next-page continuation. An empty item list with no error is the defined
//! end-of-data signal, not an error condition.

use serde_json::Value;

use crate::error::CrawlError;
use crate::models::{ChannelVideoRef, Continuation, Item, PlaylistVideoRef};

use super::{first_continuation_token, path, text, ParsedPage};

pub fn parse_browse_page(
    document: &Value,
    continuation: &Continuation,
) -> Result<ParsedPage, CrawlError> {
    let resource_id = &continuation.resource_id;
    let contents = path(document, &["response", "continuationContents"])
        .ok_or_else(|| CrawlError::mismatch(resource_id, "missing continuationContents"))?;

    let mut page = ParsedPage::default();

    if let Some(grid) = contents.get("gridContinuation") {
        if let Some(entries) = grid.get("items").and_then(Value::as_array) {
            for entry in entries {
                let Some(renderer) = entry.get("gridVideoRenderer") else {
                    continue;
                };
                let Some(video_id) = renderer.get("videoId").and_then(Value::as_str) else {
                    continue;
                };
                page.items.push(Item::ChannelVideoRef(ChannelVideoRef {
                    video_id: video_id.to_string(),
                    channel_id: resource_id.clone(),
                    title: renderer.get("title").and_then(text).unwrap_or_default(),
                }));
            }
        }
        page.next = next_from(grid, continuation);
    } else if let Some(list) = contents.get("playlistVideoListContinuation") {
        if let Some(entries) = list.get("contents").and_then(Value::as_array) {
            for entry in entries {
                let Some(renderer) = entry.get("playlistVideoRenderer") else {
                    continue;
                };
                let Some(video_id) = renderer.get("videoId").and_then(Value::as_str) else {
                    continue;
                };
                page.items.push(Item::PlaylistVideoRef(PlaylistVideoRef {
                    video_id: video_id.to_string(),
                    playlist_id: resource_id.clone(),
                    position: super::u64_field(renderer, "index").unwrap_or(0) as u32,
                    title: renderer.get("title").and_then(text).unwrap_or_default(),
                }));
            }
        }
        page.next = next_from(list, continuation);
    } else {
        return Err(CrawlError::mismatch(
            resource_id,
            "continuationContents without grid or playlist body",
        ));
    }

    // End-of-data: an empty page terminates the stream even if the server
    // still echoed a continuation.
    if page.items.is_empty() {
        page.next = None;
    }

    Ok(page)
}

fn next_from(container: &Value, continuation: &Continuation) -> Option<Continuation> {
    first_continuation_token(container).map(|token| Continuation {
        token,
        resource_id: continuation.resource_id.clone(),
        parent_id: None,
        session: None,
        sort: continuation.sort,
    })
}
