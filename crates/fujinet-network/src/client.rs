//! The HTTP collaborator contract.
//!
//! The device layer never talks to an HTTP library directly. It builds an
//! [`HttpRequest`], hands it to an [`HttpClient`], and translates whatever
//! comes back.

#![allow(async_fn_in_trait)]

use std::fmt;

use bytes::Bytes;

use crate::error::{ClientError, Result};

/// Request methods the device layer issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Head,
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Sent in order; duplicates are kept.
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Largest response body accepted. A longer body fails the request with
    /// [`ClientError::Body`](crate::ClientError::Body) instead of being read.
    pub max_body: Option<usize>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            max_body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, url)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_max_body(mut self, limit: usize) -> Self {
        self.max_body = Some(limit);
        self
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A completed exchange, whatever its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Empty `200 OK`.
    pub fn ok() -> Self {
        Self::new(200, Bytes::new())
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Check the body length against a request's `max_body`.
    ///
    /// # Errors
    /// Returns `ClientError::Body` when the body is longer than `limit`.
    pub fn check_body_limit(&self, limit: Option<usize>) -> Result<()> {
        match limit {
            Some(limit) if self.body.len() > limit => Err(body_too_large(limit)),
            _ => Ok(()),
        }
    }

    /// Status 400 and above.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

pub(crate) fn body_too_large(limit: usize) -> ClientError {
    ClientError::Body(format!("response body exceeds {limit} bytes"))
}

/// HTTP client used by the network device.
///
/// Implementations must not retry; the device reports the first outcome.
///
/// This trait uses native `async fn` and is not object-safe. Use a generic
/// parameter or [`AnyHttpClient`](crate::AnyHttpClient).
pub trait HttpClient: Send + Sync {
    /// Perform one request.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`](crate::ClientError) when no response was
    /// received. Error statuses are returned as `Ok` responses.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Check that `url` is reachable.
    ///
    /// Any response, including an error status, counts as reachable.
    ///
    /// # Errors
    ///
    /// Returns the transport failure that prevented a response.
    async fn probe(&self, url: &str) -> Result<()> {
        self.execute(HttpRequest::head(url)).await.map(|_| ())
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::new(HttpMethod::Post, "http://x/")
            .with_header("Content-Type", "text/plain")
            .with_body("hello");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("Accept"), None);
        assert_eq!(request.body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_response_status() {
        assert!(!HttpResponse::ok().is_error());
        assert!(!HttpResponse::new(302, "").is_error());
        assert!(HttpResponse::new(404, "").is_error());
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_body_limit() {
        let response = HttpResponse::new(200, vec![0u8; 10]);
        assert!(response.check_body_limit(None).is_ok());
        assert!(response.check_body_limit(Some(10)).is_ok());
        assert!(matches!(
            response.check_body_limit(Some(9)),
            Err(ClientError::Body(_))
        ));
        assert_eq!(HttpRequest::get("http://x/").with_max_body(9).max_body, Some(9));
    }
}
