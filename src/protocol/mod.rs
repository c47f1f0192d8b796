//! Continuation protocol layer.
//!
//! One state-machine variant per resource family, all sharing the same
//! contract: a parsed document plus the input continuation yield extracted
//! items, an optional same-stream continuation, and zero or more follow-up
//! continuations (alternate sort orders, reply threads).

mod channel;
mod comments;
mod live_chat;
mod timestamp;
mod video;

pub use channel::parse_browse_page;
pub use comments::parse_comment_page;
pub use live_chat::parse_chat_page;
pub use timestamp::parse_relative;
pub use video::{parse_video_page, VideoPage};

use std::time::Duration;

use serde_json::Value;

use crate::models::{Continuation, Item};

/// Result of parsing one page of a paginated resource.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub items: Vec<Item>,
    /// Same-stream continuation, if more pages remain.
    pub next: Option<Continuation>,
    /// Follow-up continuations: alternate sort orders and reply threads.
    /// The layer is order-agnostic; callers pick what to follow.
    pub extra: Vec<Continuation>,
    /// Server-declared minimum poll delay. Live chat only.
    pub timeout: Option<Duration>,
}

/// Navigate nested objects by key path.
pub(crate) fn path<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Text of a renderer field: either `simpleText` or concatenated `runs`.
pub(crate) fn text(value: &Value) -> Option<String> {
    if let Some(simple) = value.get("simpleText").and_then(Value::as_str) {
        return Some(simple.to_string());
    }
    let runs = value.get("runs")?.as_array()?;
    let mut out = String::new();
    for run in runs {
        out.push_str(run.get("text").and_then(Value::as_str)?);
    }
    Some(out)
}

/// First continuation token found in a `continuations` array, regardless of
/// which continuation-data flavor wraps it.
pub(crate) fn first_continuation_token(container: &Value) -> Option<String> {
    let entries = container.get("continuations")?.as_array()?;
    for entry in entries {
        let data = entry.as_object()?.values().next()?;
        if let Some(token) = data.get("continuation").and_then(Value::as_str) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Numbers in these documents arrive either as JSON numbers or as strings.
pub(crate) fn u64_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
