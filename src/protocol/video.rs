//! Video detail page parsing.
//!
//! Single shot; no continuation in. Besides the video metadata, the same
//! document carries the initial comment and live-chat continuation tokens
//! that seed the other walkers. Those are returned explicitly here instead
//! of being threaded through hidden state.

use serde_json::Value;

use crate::error::CrawlError;
use crate::models::{CommentSession, Continuation, SortMode, Video, VideoFormat};

use super::{first_continuation_token, path, u64_field};

/// Everything extracted from one video detail document.
#[derive(Debug)]
pub struct VideoPage {
    pub video: Video,
    /// Seed for the comment walker, with session credentials attached when
    /// available. `None` when comments are disabled or the session could not
    /// be established.
    pub initial_comment_continuation: Option<Continuation>,
    /// Seed for the live-chat walker. `None` for non-live videos.
    pub initial_chat_continuation: Option<Continuation>,
}

/// Parse a video detail document.
///
/// A structured "unavailable" status in the payload is a terminal,
/// non-retryable outcome, distinct from a parse error.
pub fn parse_video_page(
    document: &Value,
    video_id: &str,
    session: Option<&CommentSession>,
) -> Result<VideoPage, CrawlError> {
    let player = path(document, &["playerResponse"])
        .ok_or_else(|| CrawlError::mismatch(video_id, "missing playerResponse"))?;

    let status = path(player, &["playabilityStatus", "status"])
        .and_then(Value::as_str)
        .unwrap_or("OK");
    if status != "OK" {
        let reason = path(player, &["playabilityStatus", "reason"])
            .and_then(Value::as_str)
            .unwrap_or(status);
        return Err(CrawlError::ResourceUnavailable(format!(
            "{video_id}: {reason}"
        )));
    }

    let details = path(player, &["videoDetails"])
        .ok_or_else(|| CrawlError::mismatch(video_id, "missing videoDetails"))?;

    let id = details
        .get("videoId")
        .and_then(Value::as_str)
        .unwrap_or(video_id)
        .to_string();
    let title = details
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| CrawlError::mismatch(video_id, "videoDetails.title missing"))?
        .to_string();
    let uploader_id = details
        .get("channelId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let video = Video {
        id,
        title,
        uploader_id,
        duration_seconds: u64_field(details, "lengthSeconds"),
        view_count: u64_field(details, "viewCount"),
        related_video_ids: related_ids(document),
        formats: formats(player),
    };

    Ok(VideoPage {
        initial_comment_continuation: comment_continuation(document, video_id, session),
        initial_chat_continuation: chat_continuation(document, video_id),
        video,
    })
}

fn formats(player: &Value) -> Vec<VideoFormat> {
    let Some(entries) = path(player, &["streamingData", "formats"]).and_then(Value::as_array)
    else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|f| {
            Some(VideoFormat {
                itag: f.get("itag")?.as_u64()? as u32,
                url: f.get("url")?.as_str()?.to_string(),
                mime_type: f.get("mimeType")?.as_str()?.to_string(),
            })
        })
        .collect()
}

fn related_ids(document: &Value) -> Vec<String> {
    let results = path(
        document,
        &[
            "response",
            "contents",
            "twoColumnWatchNextResults",
            "secondaryResults",
            "secondaryResults",
            "results",
        ],
    )
    .and_then(Value::as_array);

    let Some(results) = results else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|entry| {
            path(entry, &["compactVideoRenderer", "videoId"])
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        })
        .collect()
}

/// The comment section's continuation hides in one of the watch-page result
/// sections. Credentials are attached here so downstream fetches are
/// self-contained.
fn comment_continuation(
    document: &Value,
    video_id: &str,
    session: Option<&CommentSession>,
) -> Option<Continuation> {
    let sections = path(
        document,
        &[
            "response",
            "contents",
            "twoColumnWatchNextResults",
            "results",
            "results",
            "contents",
        ],
    )
    .and_then(Value::as_array)?;

    let token = sections.iter().find_map(|section| {
        section
            .get("itemSectionRenderer")
            .and_then(first_continuation_token)
    })?;

    // Without session credentials the comment endpoints reject the request;
    // skip comment crawling for this video rather than failing later.
    let session = session?;
    Some(Continuation::top_level(token, video_id, SortMode::Top).with_session(Some(session.clone())))
}

fn chat_continuation(document: &Value, video_id: &str) -> Option<Continuation> {
    let bar = path(
        document,
        &[
            "response",
            "contents",
            "twoColumnWatchNextResults",
            "conversationBar",
            "liveChatRenderer",
        ],
    )?;
    let token = first_continuation_token(bar)?;
    Some(Continuation::top_level(token, video_id, SortMode::Live))
}
