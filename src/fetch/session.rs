//! Session credential extraction from the initiating video-page response.
//!
//! Comment continuations require a session cookie pair plus an XSRF token,
//! both issued alongside the video page. Extraction is explicitly optional:
//! `None` means comment crawling is skipped for that video.

use serde_json::Value;

use crate::models::CommentSession;

/// Cookie names forming the session pair required by comment endpoints.
const SESSION_COOKIES: [&str; 2] = ["YSC", "VISITOR_INFO1_LIVE"];

/// Extract comment-session credentials from a video page response.
///
/// `set_cookie` holds the raw `Set-Cookie` header values; the XSRF token is
/// embedded in the page document itself.
pub fn extract_session(set_cookie: &[String], document: &Value) -> Option<CommentSession> {
    let xsrf = document.get("xsrfToken").and_then(Value::as_str)?;
    if xsrf.is_empty() {
        return None;
    }

    let mut pairs = Vec::with_capacity(SESSION_COOKIES.len());
    for name in SESSION_COOKIES {
        let value = set_cookie.iter().find_map(|header| cookie_value(header, name))?;
        pairs.push(format!("{name}={value}"));
    }

    Some(CommentSession {
        cookies: pairs.join("; "),
        xsrf_token: xsrf.to_string(),
    })
}

/// Pull the value of a named cookie out of one `Set-Cookie` header value.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    let (key, rest) = header.split_once('=')?;
    if key.trim() != name {
        return None;
    }
    let value = rest.split(';').next()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers() -> Vec<String> {
        vec![
            "YSC=abc123; path=/; HttpOnly".to_string(),
            "VISITOR_INFO1_LIVE=xyz789; expires=Sat, 01 Jan 2028 00:00:00 GMT".to_string(),
            "PREF=f1=5000; path=/".to_string(),
        ]
    }

    #[test]
    fn test_extracts_pair_and_token() {
        let doc = json!({"xsrfToken": "tok=="});
        let session = extract_session(&headers(), &doc).unwrap();
        assert_eq!(session.cookies, "YSC=abc123; VISITOR_INFO1_LIVE=xyz789");
        assert_eq!(session.xsrf_token, "tok==");
    }

    #[test]
    fn test_missing_cookie_yields_none() {
        let doc = json!({"xsrfToken": "tok"});
        let partial = vec!["YSC=abc123; path=/".to_string()];
        assert!(extract_session(&partial, &doc).is_none());
    }

    #[test]
    fn test_missing_token_yields_none() {
        let doc = json!({"response": {}});
        assert!(extract_session(&headers(), &doc).is_none());
        let empty = json!({"xsrfToken": ""});
        assert!(extract_session(&headers(), &empty).is_none());
    }
}
