//! Comment page parsing, top-level sections and reply threads.
//!
//! A continuation with `parent_id` set is resolved against the reply shape;
//! one without is resolved against the top-level section shape. Top-level
//! pages additionally expose alternate sort-order continuations and one
//! reply continuation per reply-bearing comment, all returned in `extra`.

use chrono::Utc;
use serde_json::Value;

use crate::error::CrawlError;
use crate::models::{Comment, Continuation, Item, SortMode};

use super::{first_continuation_token, path, text, u64_field, ParsedPage};

pub fn parse_comment_page(
    document: &Value,
    continuation: &Continuation,
) -> Result<ParsedPage, CrawlError> {
    if continuation.is_reply() {
        parse_reply_page(document, continuation)
    } else {
        parse_section_page(document, continuation)
    }
}

fn parse_section_page(
    document: &Value,
    continuation: &Continuation,
) -> Result<ParsedPage, CrawlError> {
    let resource_id = &continuation.resource_id;
    let section = path(
        document,
        &["response", "continuationContents", "itemSectionContinuation"],
    )
    .ok_or_else(|| CrawlError::mismatch(resource_id, "missing itemSectionContinuation"))?;

    let mut page = ParsedPage::default();

    if let Some(threads) = section.get("contents").and_then(Value::as_array) {
        for thread in threads {
            let Some(thread) = thread.get("commentThreadRenderer") else {
                continue;
            };
            let renderer = path(thread, &["comment", "commentRenderer"]).ok_or_else(|| {
                CrawlError::mismatch(resource_id, "thread without commentRenderer")
            })?;
            let comment = parse_comment(renderer, resource_id, None)?;

            // Fork point: a reply continuation per reply-bearing comment.
            if let Some(token) = thread
                .get("replies")
                .and_then(|r| r.get("commentRepliesRenderer"))
                .and_then(first_continuation_token)
            {
                page.extra.push(
                    Continuation::reply(token, resource_id.clone(), comment.id.clone())
                        .with_session(continuation.session.clone()),
                );
            }

            page.items.push(Item::Comment(comment));
        }
    }

    // Alternate sort orders from the page header.
    if let Some(menu_items) = path(
        section,
        &[
            "header",
            "commentsHeaderRenderer",
            "sortMenu",
            "sortFilterSubMenuRenderer",
            "subMenuItems",
        ],
    )
    .and_then(Value::as_array)
    {
        for entry in menu_items {
            let Some(sort) = entry
                .get("title")
                .and_then(Value::as_str)
                .and_then(sort_from_title)
            else {
                continue;
            };
            let Some(token) = entry
                .get("continuation")
                .and_then(|c| c.as_object())
                .and_then(|o| o.values().next())
                .and_then(|d| d.get("continuation"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            page.extra.push(
                Continuation::top_level(token, resource_id.clone(), sort)
                    .with_session(continuation.session.clone()),
            );
        }
    }

    // The more-comments flag gates the same-stream continuation.
    let more = section
        .get("moreComments")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if more {
        page.next = first_continuation_token(section).map(|token| {
            Continuation::top_level(token, resource_id.clone(), continuation.sort)
                .with_session(continuation.session.clone())
        });
    }

    Ok(page)
}

fn parse_reply_page(
    document: &Value,
    continuation: &Continuation,
) -> Result<ParsedPage, CrawlError> {
    let resource_id = &continuation.resource_id;
    let replies = path(
        document,
        &["response", "continuationContents", "commentRepliesContinuation"],
    )
    .ok_or_else(|| CrawlError::mismatch(resource_id, "missing commentRepliesContinuation"))?;

    let mut page = ParsedPage::default();

    if let Some(entries) = replies.get("contents").and_then(Value::as_array) {
        for entry in entries {
            let renderer = entry.get("commentRenderer").ok_or_else(|| {
                CrawlError::mismatch(resource_id, "reply without commentRenderer")
            })?;
            let comment = parse_comment(renderer, resource_id, continuation.parent_id.clone())?;
            page.items.push(Item::Comment(comment));
        }
    }

    page.next = first_continuation_token(replies).map(|token| {
        Continuation {
            token,
            resource_id: resource_id.clone(),
            parent_id: continuation.parent_id.clone(),
            session: continuation.session.clone(),
            sort: continuation.sort,
        }
    });

    Ok(page)
}

fn parse_comment(
    renderer: &Value,
    resource_id: &str,
    parent_id: Option<String>,
) -> Result<Comment, CrawlError> {
    let id = renderer
        .get("commentId")
        .and_then(Value::as_str)
        .ok_or_else(|| CrawlError::mismatch(resource_id, "comment without commentId"))?
        .to_string();

    let author = renderer
        .get("authorText")
        .and_then(text)
        .unwrap_or_default();
    let author_channel_id = path(renderer, &["authorEndpoint", "browseEndpoint", "browseId"])
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    let content = renderer
        .get("contentText")
        .and_then(text)
        .ok_or_else(|| CrawlError::mismatch(resource_id, format!("comment {id} without text")))?;

    // Relative age phrase. An unrecognized unit is a hard parse error, not
    // a silently dropped field.
    let published = renderer
        .get("publishedTimeText")
        .and_then(text)
        .ok_or_else(|| {
            CrawlError::mismatch(resource_id, format!("comment {id} without publish time"))
        })?;
    let (created_after, created_before) =
        super::parse_relative(&published, Utc::now()).ok_or_else(|| {
            CrawlError::mismatch(
                resource_id,
                format!("comment {id}: unparsable time phrase {published:?}"),
            )
        })?;

    Ok(Comment {
        id,
        source_resource_id: resource_id.to_string(),
        parent_id,
        author,
        author_channel_id,
        content,
        like_count: u64_field(renderer, "likeCount").unwrap_or(0),
        reply_count: u64_field(renderer, "replyCount").unwrap_or(0),
        created_after,
        created_before,
    })
}

fn sort_from_title(title: &str) -> Option<SortMode> {
    let title = title.to_lowercase();
    if title.starts_with("top") {
        Some(SortMode::Top)
    } else if title.starts_with("newest") {
        Some(SortMode::Newest)
    } else {
        None
    }
}
