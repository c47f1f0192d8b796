//! Live chat parsing, live and replay flavors.
//!
//! A live slice's continuation carries a server-specified `timeoutMs` the
//! caller must honor as a minimum poll delay. Replay slices have no timeout
//! and are requested back-to-back; an empty continuation token is the
//! terminal state for both.

use std::time::Duration;

use serde_json::Value;

use crate::error::CrawlError;
use crate::models::{Continuation, Item, LiveChatMessage};

use super::{path, text, ParsedPage};

pub fn parse_chat_page(
    document: &Value,
    continuation: &Continuation,
) -> Result<ParsedPage, CrawlError> {
    let resource_id = &continuation.resource_id;
    let chat = path(
        document,
        &["response", "continuationContents", "liveChatContinuation"],
    )
    .ok_or_else(|| CrawlError::mismatch(resource_id, "missing liveChatContinuation"))?;

    let mut page = ParsedPage::default();

    if let Some(actions) = chat.get("actions").and_then(Value::as_array) {
        for action in actions {
            let Some(renderer) = path(
                action,
                &["addChatItemAction", "item", "liveChatTextMessageRenderer"],
            ) else {
                // Other action kinds (tickers, deletions) are not modeled.
                continue;
            };
            page.items.push(Item::LiveChatMessage(parse_message(
                renderer,
                resource_id,
            )?));
        }
    }

    if let Some(entries) = chat.get("continuations").and_then(Value::as_array) {
        for entry in entries {
            let Some(data) = entry.as_object().and_then(|o| o.values().next()) else {
                continue;
            };
            let Some(token) = data.get("continuation").and_then(Value::as_str) else {
                continue;
            };
            // Empty token: stream over.
            if token.is_empty() {
                continue;
            }
            page.next = Some(Continuation {
                token: token.to_string(),
                resource_id: resource_id.clone(),
                parent_id: None,
                session: None,
                sort: continuation.sort,
            });
            page.timeout = data
                .get("timeoutMs")
                .and_then(Value::as_u64)
                .map(Duration::from_millis);
            break;
        }
    }

    Ok(page)
}

fn parse_message(renderer: &Value, resource_id: &str) -> Result<LiveChatMessage, CrawlError> {
    let id = renderer
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CrawlError::mismatch(resource_id, "chat message without id"))?
        .to_string();

    let timestamp_usec = match renderer.get("timestampUsec") {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        _ => 0,
    };

    Ok(LiveChatMessage {
        id,
        source_resource_id: resource_id.to_string(),
        author: renderer
            .get("authorName")
            .and_then(text)
            .unwrap_or_default(),
        content: renderer.get("message").and_then(text).unwrap_or_default(),
        timestamp_usec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortMode;
    use serde_json::json;

    fn chat_doc(continuations: Value) -> Value {
        json!({
            "response": {"continuationContents": {"liveChatContinuation": {
                "actions": [
                    {"addChatItemAction": {"item": {"liveChatTextMessageRenderer": {
                        "id": "m1",
                        "authorName": {"simpleText": "bob"},
                        "message": {"runs": [{"text": "hi"}]},
                        "timestampUsec": "1700000000000000"
                    }}}},
                    {"markChatItemAsDeletedAction": {"targetItemId": "m0"}}
                ],
                "continuations": continuations
            }}}
        })
    }

    fn start() -> Continuation {
        Continuation::top_level("chat-0", "v1", SortMode::Live)
    }

    #[test]
    fn test_live_slice_carries_timeout() {
        let doc = chat_doc(json!([
            {"timedContinuationData": {"timeoutMs": 5000, "continuation": "chat-1"}}
        ]));
        let page = parse_chat_page(&doc, &start()).unwrap();

        assert_eq!(page.items.len(), 1);
        let Item::LiveChatMessage(msg) = &page.items[0] else {
            panic!("expected chat message");
        };
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.timestamp_usec, 1_700_000_000_000_000);

        assert_eq!(page.next.as_ref().unwrap().token, "chat-1");
        assert_eq!(page.timeout, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_replay_slice_has_no_timeout() {
        let doc = chat_doc(json!([
            {"liveChatReplayContinuationData": {"continuation": "replay-1"}}
        ]));
        let page = parse_chat_page(&doc, &start()).unwrap();
        assert_eq!(page.next.as_ref().unwrap().token, "replay-1");
        assert_eq!(page.timeout, None);
    }

    #[test]
    fn test_empty_continuation_is_terminal() {
        let doc = chat_doc(json!([
            {"liveChatReplayContinuationData": {"continuation": ""}}
        ]));
        let page = parse_chat_page(&doc, &start()).unwrap();
        assert!(page.next.is_none());

        let no_list = chat_doc(json!([]));
        assert!(parse_chat_page(&no_list, &start()).unwrap().next.is_none());
    }
}
