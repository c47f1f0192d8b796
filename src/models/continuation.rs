//! Continuation tokens: opaque forward pointers into paginated resources.
//!
//! A continuation is created by parsing a page, consumed exactly once by the
//! next fetch, then discarded or replaced with the continuation embedded in
//! the new page.

use serde::{Deserialize, Serialize};

/// Sort order for comment continuations. Determines which follow-up
/// continuation the server returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Top,
    Newest,
    /// Newest, re-polled over time so comments posted during the walk are
    /// picked up as well.
    Live,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Newest => "newest",
            Self::Live => "live",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Self::Top),
            "newest" => Some(Self::Newest),
            "live" => Some(Self::Live),
            _ => None,
        }
    }
}

/// Session-scoped credentials required for comment continuations only.
///
/// Extracted from the initiating video-page response; absence means comment
/// crawling is skipped for that video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSession {
    /// Cookie header value carrying the session cookie pair.
    pub cookies: String,
    /// XSRF token posted as the `session_token` form field.
    pub xsrf_token: String,
}

/// Opaque forward pointer into a paginated resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    /// Opaque token issued by the server.
    pub token: String,
    /// Video, channel, or playlist identifier this continuation belongs to.
    pub resource_id: String,
    /// Set to a comment ID for reply-thread continuations. A continuation
    /// with `parent_id` set must only be resolved against the reply-fetch
    /// request shape, never the top-level-section shape.
    pub parent_id: Option<String>,
    /// Required for comment continuations only.
    pub session: Option<CommentSession>,
    pub sort: SortMode,
}

impl Continuation {
    /// Top-level continuation for a resource.
    pub fn top_level(token: impl Into<String>, resource_id: impl Into<String>, sort: SortMode) -> Self {
        Self {
            token: token.into(),
            resource_id: resource_id.into(),
            parent_id: None,
            session: None,
            sort,
        }
    }

    /// Reply-thread continuation under a top-level comment.
    pub fn reply(
        token: impl Into<String>,
        resource_id: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            resource_id: resource_id.into(),
            parent_id: Some(parent_id.into()),
            session: None,
            sort: SortMode::default(),
        }
    }

    /// Attach session credentials (comment continuations).
    pub fn with_session(mut self, session: Option<CommentSession>) -> Self {
        self.session = session;
        self
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// An empty token is the terminal state for replay-style streams.
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_round_trip() {
        for mode in [SortMode::Top, SortMode::Newest, SortMode::Live] {
            assert_eq!(SortMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(SortMode::from_str("hottest"), None);
    }

    #[test]
    fn test_reply_continuation_carries_parent() {
        let cont = Continuation::reply("tok", "vid1", "comment9");
        assert!(cont.is_reply());
        assert_eq!(cont.parent_id.as_deref(), Some("comment9"));
    }
}
