//! Transport abstraction layer for Tourney.
//!
//! Provides the [`HttpTransport`] trait that abstracts over how a request
//! actually reaches the tournament service, plus the plain request and
//! response values that cross it.
//!
//! # Feature Flags
//!
//! - `reqwest` (default): real HTTPS transport via `reqwest`
//! - `test-utils`: [`MockTransport`], a scripted in-process transport

mod error;
#[cfg(any(test, feature = "test-utils"))]
mod mock;
#[cfg(feature = "reqwest")]
mod http;

pub use error::TransportError;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockTransport;
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one outbound request, used to correlate logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocates the next process-unique ID.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The HTTP verbs the tournament service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpRequest / HttpResponse
// ---------------------------------------------------------------------------

/// One outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub id: RequestId,
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: String,
    /// Header name/value pairs in insertion order.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::next(),
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// In-place form of [`header`](Self::header).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Looks up a header value (names compare case-insensitively).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body as UTF-8, if there is one and it decodes.
    pub fn body_str(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// The URL path without scheme, host, or query string.
    pub fn path(&self) -> &str {
        let rest = match self.url.find("://") {
            Some(i) => {
                let after = &self.url[i + 3..];
                after.find('/').map_or("", |j| &after[j..])
            }
            None => self.url.as_str(),
        };
        rest.split('?').next().unwrap_or(rest)
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, q)| q)
    }
}

/// The raw answer to an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200 OK` with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Delivers requests to the tournament service.
///
/// The returned future must be `Send`: the session layer runs
/// registration and authentication on spawned tasks.
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends the request and waits for the full response.
    ///
    /// Any status code is a successful send; only failures to get a
    /// response at all are errors.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_display() {
        let id = RequestId(7);
        assert_eq!(id.to_string(), "req-7");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Put.to_string(), "PUT");
    }

    #[test]
    fn test_header_replaces_case_insensitively() {
        let req = HttpRequest::new(Method::Get, "https://h/x")
            .header("Session-Id", "old")
            .header("session-id", "new");

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_value("SESSION-ID"), Some("new"));
    }

    #[test]
    fn test_path_strips_scheme_host_and_query() {
        let req = HttpRequest::new(
            Method::Get,
            "https://api.example.com/v1/matches/m1/leaderboard?currentPlayerNeighbors=1",
        );
        assert_eq!(req.path(), "/v1/matches/m1/leaderboard");
        assert_eq!(req.query(), Some("currentPlayerNeighbors=1"));
    }

    #[test]
    fn test_path_without_path_component() {
        let req = HttpRequest::new(Method::Get, "https://api.example.com");
        assert_eq!(req.path(), "");
        assert_eq!(req.query(), None);
    }

    #[test]
    fn test_body_str() {
        let req = HttpRequest::new(Method::Post, "https://h/x").body("{}");
        assert_eq!(req.body_str(), Some("{}"));
    }

    #[test]
    fn test_response_is_success_range() {
        assert!(HttpResponse::ok("").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
