//! Resource fetching over the site's internal JSON endpoints.
//!
//! One request per call, classified before parsing. Retry policy belongs to
//! the caller; the fetcher only paces requests and reports typed outcomes.

mod outcome;
mod session;
mod token;

pub use outcome::{classify, FetchOutcome};
pub use session::extract_session;
pub use token::channel_page_token;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::error::CrawlError;
use crate::models::{CommentSession, Continuation};

/// One page request against an internal endpoint.
#[derive(Debug, Clone)]
pub enum PageRequest {
    /// Video detail page. Single shot; seeds the comment and chat walkers.
    VideoPage { video_id: String },
    /// Comment section or reply page. The request shape is chosen by
    /// `continuation.parent_id`.
    Comments { continuation: Continuation },
    /// Live chat slice, live or replay.
    LiveChat { continuation: Continuation, replay: bool },
    /// Channel or playlist page keyed by a browse ctoken.
    Browse { continuation: Continuation },
}

impl PageRequest {
    /// Resource the request is about, for logging and error attribution.
    pub fn resource_id(&self) -> &str {
        match self {
            Self::VideoPage { video_id } => video_id,
            Self::Comments { continuation }
            | Self::LiveChat { continuation, .. }
            | Self::Browse { continuation } => &continuation.resource_id,
        }
    }
}

/// A fetched, classified, parsed page.
#[derive(Debug)]
pub struct FetchedPage {
    pub document: Value,
    /// Session credentials captured from a video page response. `None` for
    /// every other request shape.
    pub session: Option<CommentSession>,
}

/// Boundary between the crawl layers and the HTTP transport.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, CrawlError>;
}

/// reqwest-backed page fetcher.
pub struct HttpClient {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpClient {
    pub fn new(config: FetchConfig) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, CrawlError> {
        let mut url = Url::parse(&self.config.base_url)
            .and_then(|u| u.join(path))
            .map_err(|e| CrawlError::InvalidInput(format!("bad base URL: {e}")))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    /// Build the reqwest request for a page, including the fixed header set
    /// and, for comment continuations, the session cookie and POST body.
    fn build(&self, request: &PageRequest) -> Result<reqwest::RequestBuilder, CrawlError> {
        let builder = match request {
            PageRequest::VideoPage { video_id } => {
                let url = self.endpoint("/watch", &[("v", video_id), ("pbj", "1")])?;
                self.client.get(url)
            }
            PageRequest::Comments { continuation } => {
                let session = continuation.session.as_ref().ok_or_else(|| {
                    CrawlError::InvalidInput(format!(
                        "comment continuation for {} has no session credentials",
                        continuation.resource_id
                    ))
                })?;
                // Reply continuations use the reply-fetch shape; top-level
                // continuations use the section shape. Never mixed.
                let action = if continuation.is_reply() {
                    "action_get_comment_replies"
                } else {
                    "action_get_comments"
                };
                let url = self.endpoint(
                    "/comment_service_ajax",
                    &[
                        (action, "1"),
                        ("ctoken", &continuation.token),
                        ("type", "next"),
                        ("pbj", "1"),
                    ],
                )?;
                let body = format!(
                    "session_token={}",
                    urlencoding::encode(&session.xsrf_token)
                );
                self.client
                    .post(url)
                    .header(COOKIE, &session.cookies)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(body)
            }
            PageRequest::LiveChat {
                continuation,
                replay,
            } => {
                let path = if *replay {
                    "/live_chat_replay/get_live_chat_replay"
                } else {
                    "/live_chat/get_live_chat"
                };
                let url = self.endpoint(
                    path,
                    &[("continuation", continuation.token.as_str()), ("pbj", "1")],
                )?;
                self.client.get(url)
            }
            PageRequest::Browse { continuation } => {
                let url = self.endpoint("/browse_ajax", &[("ctoken", &continuation.token)])?;
                self.client.get(url)
            }
        };

        Ok(builder
            .header("Accept-Language", &self.config.accept_language)
            .header("X-Client-Name", &self.config.client_name)
            .header("X-Client-Version", &self.config.client_version))
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, CrawlError> {
        let response = self.build(request)?.send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Session cookies only come with the video page response; capture
        // them before the body consumes it.
        let set_cookie: Vec<String> = if matches!(request, PageRequest::VideoPage { .. }) {
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
                .collect()
        } else {
            Vec::new()
        };

        // Classify before any JSON parsing.
        match classify(status, content_type.as_deref()) {
            FetchOutcome::Ok => {}
            FetchOutcome::RateLimited => return Err(CrawlError::RateLimited),
            FetchOutcome::HttpError(status) => return Err(CrawlError::Http(status)),
        }

        let text = response.text().await?;
        let document: Value = serde_json::from_str(&text).map_err(|e| {
            CrawlError::mismatch(request.resource_id(), format!("invalid JSON body: {e}"))
        })?;

        let session = if matches!(request, PageRequest::VideoPage { .. }) {
            extract_session(&set_cookie, &document)
        } else {
            None
        };

        debug!(
            resource = request.resource_id(),
            bytes = text.len(),
            "fetched page"
        );

        // Base pacing delay between requests.
        tokio::time::sleep(self.config.request_delay()).await;

        Ok(FetchedPage { document, session })
    }
}
