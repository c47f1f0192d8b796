//! Raw response classification.
//!
//! Classification happens before any JSON parsing is attempted: the site
//! serves an HTML challenge page in place of JSON when it suspects
//! automation, and those pages must never surface as parse errors.

/// Synthetic status reported for unexpected content types on a 200 response.
const SYNTHETIC_STATUS: u16 = 599;

/// Outcome of classifying a raw HTTP response.
///
/// Network-level failures never reach classification; they surface as
/// `CrawlError::TransientNetwork` from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    /// An HTML page was served where JSON was expected.
    RateLimited,
    HttpError(u16),
}

/// Classify a response from its status and declared content type.
///
/// HTML means a challenge page regardless of status. Otherwise a non-200
/// status is an HTTP error, JSON is success, and anything else gets a
/// synthetic status.
pub fn classify(status: u16, content_type: Option<&str>) -> FetchOutcome {
    let content_type = content_type.unwrap_or("");
    if content_type.starts_with("text/html") {
        return FetchOutcome::RateLimited;
    }
    if status != 200 {
        return FetchOutcome::HttpError(status);
    }
    if content_type.starts_with("application/json") {
        return FetchOutcome::Ok;
    }
    FetchOutcome::HttpError(SYNTHETIC_STATUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_200_is_ok() {
        assert_eq!(
            classify(200, Some("application/json; charset=utf-8")),
            FetchOutcome::Ok
        );
    }

    #[test]
    fn test_json_200_is_never_rate_limited() {
        assert_ne!(
            classify(200, Some("application/json")),
            FetchOutcome::RateLimited
        );
    }

    #[test]
    fn test_html_is_rate_limited_regardless_of_status() {
        for status in [200, 403, 429, 500] {
            assert_eq!(
                classify(status, Some("text/html; charset=utf-8")),
                FetchOutcome::RateLimited,
                "status {status}"
            );
        }
    }

    #[test]
    fn test_non_200_is_http_error() {
        assert_eq!(classify(404, Some("application/json")), FetchOutcome::HttpError(404));
        assert_eq!(classify(500, None), FetchOutcome::HttpError(500));
    }

    #[test]
    fn test_unexpected_content_type_gets_synthetic_status() {
        assert_eq!(
            classify(200, Some("text/plain")),
            FetchOutcome::HttpError(599)
        );
        assert_eq!(classify(200, None), FetchOutcome::HttpError(599));
    }
}
