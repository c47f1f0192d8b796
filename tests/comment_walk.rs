//! End-to-end comment walking against canned page documents.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use vidacquire::config::WalkConfig;
use vidacquire::error::CrawlError;
use vidacquire::fetch::{FetchedPage, PageFetcher, PageRequest};
use vidacquire::models::{Continuation, Item, SortMode};
use vidacquire::walker::CommentWalker;

/// Serves canned documents keyed by continuation token (or video ID).
struct FixtureFetcher {
    pages: HashMap<String, Value>,
}

impl FixtureFetcher {
    fn new(pages: Vec<(&str, Value)>) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, CrawlError> {
        let key = match request {
            PageRequest::VideoPage { video_id } => video_id.clone(),
            PageRequest::Comments { continuation }
            | PageRequest::LiveChat { continuation, .. }
            | PageRequest::Browse { continuation } => continuation.token.clone(),
        };
        let document = self
            .pages
            .get(&key)
            .cloned()
            .ok_or_else(|| CrawlError::mismatch(&key, "no fixture for this token"))?;
        Ok(FetchedPage {
            document,
            session: None,
        })
    }
}

fn renderer(id: &str, reply_count: u64) -> Value {
    json!({
        "commentId": id,
        "authorText": {"simpleText": "someone"},
        "contentText": {"simpleText": format!("body of {id}")},
        "replyCount": reply_count,
        "publishedTimeText": {"simpleText": "3 days ago"}
    })
}

fn thread(id: &str, replies_token: Option<&str>) -> Value {
    let mut t = json!({
        "commentThreadRenderer": {
            "comment": {"commentRenderer": renderer(id, if replies_token.is_some() { 1 } else { 0 })}
        }
    });
    if let Some(token) = replies_token {
        t["commentThreadRenderer"]["replies"] = json!({
            "commentRepliesRenderer": {
                "continuations": [{"nextContinuationData": {"continuation": token}}]
            }
        });
    }
    t
}

fn section_page(threads: Vec<Value>, next: Option<&str>) -> Value {
    let continuations = match next {
        Some(token) => json!([{"nextContinuationData": {"continuation": token}}]),
        None => json!([]),
    };
    json!({
        "response": {"continuationContents": {"itemSectionContinuation": {
            "contents": threads,
            "moreComments": next.is_some(),
            "continuations": continuations
        }}}
    })
}

fn reply_page(ids: &[&str], next: Option<&str>) -> Value {
    let continuations = match next {
        Some(token) => json!([{"nextContinuationData": {"continuation": token}}]),
        None => json!([]),
    };
    json!({
        "response": {"continuationContents": {"commentRepliesContinuation": {
            "contents": ids.iter().map(|id| json!({"commentRenderer": renderer(id, 0)})).collect::<Vec<_>>(),
            "continuations": continuations
        }}}
    })
}

async fn collect(
    fetcher: Arc<FixtureFetcher>,
    start: Continuation,
    sort: SortMode,
    config: WalkConfig,
) -> (Vec<Item>, vidacquire::walker::WalkSummary) {
    let walker = CommentWalker::new(fetcher, config);
    let (tx, mut rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move { walker.run(start, sort, tx).await });

    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    (items, handle.await.unwrap().unwrap())
}

#[tokio::test]
async fn test_walks_pages_and_reply_threads_exactly_once() {
    let fetcher = FixtureFetcher::new(vec![
        (
            "top-1",
            section_page(
                vec![thread("c1", Some("c1-replies-1")), thread("c2", None)],
                Some("top-2"),
            ),
        ),
        ("top-2", section_page(vec![thread("c3", None)], None)),
        ("c1-replies-1", reply_page(&["c1.r1", "c1.r2"], Some("c1-replies-2"))),
        ("c1-replies-2", reply_page(&["c1.r3"], None)),
    ]);

    let start = Continuation::top_level("top-1", "v1", SortMode::Top);
    let (items, summary) = collect(fetcher, start, SortMode::Top, WalkConfig::default()).await;

    let ids: Vec<&str> = items.iter().map(Item::id).collect();
    let unique: HashSet<&&str> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len(), "duplicate emission: {ids:?}");
    assert_eq!(
        ids.iter().copied().collect::<HashSet<_>>(),
        ["c1", "c2", "c3", "c1.r1", "c1.r2", "c1.r3"]
            .into_iter()
            .collect::<HashSet<_>>()
    );

    assert_eq!(summary.comments, 6);
    assert_eq!(summary.pages, 4);
    assert_eq!(summary.reply_threads, 1);
    assert!(!summary.limit_hit);

    // Replies point at their parent; top-level comments do not.
    for item in &items {
        let Item::Comment(comment) = item else {
            panic!("expected comment");
        };
        if comment.id.starts_with("c1.") {
            assert_eq!(comment.parent_id.as_deref(), Some("c1"));
        } else {
            assert_eq!(comment.parent_id, None);
        }
    }
}

#[tokio::test]
async fn test_sort_switch_discards_wrong_order_page() {
    // The first page arrives in the default Top order and exposes the
    // Newest continuation in its sort menu; its own comments must not leak.
    let mut first = section_page(vec![thread("top-only", None)], None);
    first["response"]["continuationContents"]["itemSectionContinuation"]["header"] = json!({
        "commentsHeaderRenderer": {"sortMenu": {"sortFilterSubMenuRenderer": {"subMenuItems": [
            {"title": "Top comments",
             "continuation": {"reloadContinuationData": {"continuation": "top-1"}}},
            {"title": "Newest first",
             "continuation": {"reloadContinuationData": {"continuation": "new-1"}}}
        ]}}}
    });

    let fetcher = FixtureFetcher::new(vec![
        ("top-1", first),
        ("new-1", section_page(vec![thread("newest-c1", None)], None)),
    ]);

    let start = Continuation::top_level("top-1", "v1", SortMode::Top);
    let (items, summary) = collect(fetcher, start, SortMode::Newest, WalkConfig::default()).await;

    let ids: Vec<&str> = items.iter().map(Item::id).collect();
    assert_eq!(ids, vec!["newest-c1"]);
    assert_eq!(summary.pages, 2);
}

#[tokio::test]
async fn test_continuation_limit_is_soft_stop() {
    // An endless chain of pages; the limit cuts it off but keeps output.
    let mut pages = Vec::new();
    for i in 0..10 {
        pages.push((
            format!("p{i}"),
            section_page(
                vec![thread(&format!("c{i}"), None)],
                Some(&format!("p{}", i + 1)),
            ),
        ));
    }
    let fetcher = FixtureFetcher::new(
        pages
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect(),
    );

    let config = WalkConfig {
        continuation_limit: 3,
        ..WalkConfig::default()
    };
    let start = Continuation::top_level("p0", "v1", SortMode::Top);
    let (items, summary) = collect(fetcher, start, SortMode::Top, config).await;

    assert!(summary.limit_hit);
    assert_eq!(summary.pages, 3);
    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn test_fetch_error_propagates() {
    // Second page is missing from the fixtures.
    let fetcher = FixtureFetcher::new(vec![(
        "top-1",
        section_page(vec![thread("c1", None)], Some("gone")),
    )]);

    let walker = CommentWalker::new(fetcher, WalkConfig::default());
    let (tx, mut rx) = mpsc::channel(64);
    let start = Continuation::top_level("top-1", "v1", SortMode::Top);
    let handle = tokio::spawn(async move { walker.run(start, SortMode::Top, tx).await });

    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    assert_eq!(items.len(), 1);
    assert!(matches!(
        handle.await.unwrap().unwrap_err(),
        CrawlError::ProtocolMismatch { .. }
    ));
}
