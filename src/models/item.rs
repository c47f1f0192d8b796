//! Extracted content items.
//!
//! Each item carries a stable ID and the resource it was found under.
//! Comment creation times are stored as an interval rather than a point:
//! the source only reports a relative phrase ("8 hours ago"), so the honest
//! representation is `created_after <= created_at <= created_before`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A downloadable media format advertised for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub itag: u32,
    pub url: String,
    pub mime_type: String,
}

/// Video metadata extracted from a video detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub uploader_id: String,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
    /// IDs of related videos listed alongside this one. Fed back into the
    /// scheduler as discovered work.
    pub related_video_ids: Vec<String>,
    pub formats: Vec<VideoFormat>,
}

/// A single comment, top-level or reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Video the comment was found under.
    pub source_resource_id: String,
    /// None for top-level comments; the parent comment ID for replies.
    pub parent_id: Option<String>,
    pub author: String,
    pub author_channel_id: Option<String>,
    pub content: String,
    pub like_count: u64,
    pub reply_count: u64,
    /// Lower bound on the creation time.
    pub created_after: DateTime<Utc>,
    /// Upper bound on the creation time.
    pub created_before: DateTime<Utc>,
}

/// One message from a live chat stream or replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatMessage {
    pub id: String,
    pub source_resource_id: String,
    pub author: String,
    pub content: String,
    pub timestamp_usec: i64,
}

/// Reference to a video found on a playlist page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistVideoRef {
    pub video_id: String,
    pub playlist_id: String,
    pub position: u32,
    pub title: String,
}

/// Reference to a video found on a channel page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelVideoRef {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
}

/// The unit of extracted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Video(Video),
    Comment(Comment),
    LiveChatMessage(LiveChatMessage),
    PlaylistVideoRef(PlaylistVideoRef),
    ChannelVideoRef(ChannelVideoRef),
}

impl Item {
    /// Stable identifier of the item itself.
    pub fn id(&self) -> &str {
        match self {
            Self::Video(v) => &v.id,
            Self::Comment(c) => &c.id,
            Self::LiveChatMessage(m) => &m.id,
            Self::PlaylistVideoRef(r) => &r.video_id,
            Self::ChannelVideoRef(r) => &r.video_id,
        }
    }

    /// Resource the item was found under.
    pub fn source_resource_id(&self) -> &str {
        match self {
            Self::Video(v) => &v.id,
            Self::Comment(c) => &c.source_resource_id,
            Self::LiveChatMessage(m) => &m.source_resource_id,
            Self::PlaylistVideoRef(r) => &r.playlist_id,
            Self::ChannelVideoRef(r) => &r.channel_id,
        }
    }

    /// Video IDs discoverable from this item, fed back into the scheduler's
    /// queue after deduplication.
    pub fn discovered_video_ids(&self) -> Vec<String> {
        match self {
            Self::Video(v) => v.related_video_ids.clone(),
            Self::PlaylistVideoRef(r) => vec![r.video_id.clone()],
            Self::ChannelVideoRef(r) => vec![r.video_id.clone()],
            _ => Vec::new(),
        }
    }
}
