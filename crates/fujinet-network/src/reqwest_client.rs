//! [`HttpClient`] backed by `reqwest`.

use std::error::Error as StdError;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use fujinet_core::HttpSettings;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, trace};
use url::Url;

use crate::{
    client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, body_too_large},
    error::{ClientError, Result},
};

/// Production HTTP client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client from the `[http]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the TLS backend cannot be initialised.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .user_agent(settings.user_agent.clone());

        if settings.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder> {
        let url = Url::parse(&request.url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", request.url)))?;

        let method = match request.method {
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Unsupported(format!("header name {name:?}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Unsupported(format!("header value for {name}")))?;
            builder = builder.header(header_name, header_value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder)
    }
}

/// Sort a `reqwest` failure into the collaborator's error vocabulary.
fn classify(err: &reqwest::Error) -> ClientError {
    let message = err.to_string();
    if err.is_timeout() {
        ClientError::Timeout(message)
    } else if err.is_connect() {
        if is_refused(err) {
            ClientError::ConnectionRefused(message)
        } else {
            ClientError::Transport(message)
        }
    } else if err.is_builder() {
        ClientError::InvalidUrl(message)
    } else if err.is_body() || err.is_decode() {
        ClientError::Body(message)
    } else {
        ClientError::Transport(message)
    }
}

fn is_refused(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Read a body chunk by chunk, giving up as soon as it passes `limit`.
async fn read_limited(mut response: reqwest::Response, limit: usize) -> Result<Bytes> {
    if let Some(length) = response.content_length()
        && length > u64::try_from(limit).unwrap_or(u64::MAX)
    {
        debug!(length, limit, "Declared response body over limit");
        return Err(body_too_large(limit));
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| classify(&e))? {
        if body.len() + chunk.len() > limit {
            debug!(read = body.len() + chunk.len(), limit, "Response body over limit");
            return Err(body_too_large(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "HTTP request");
        let builder = self.build(&request)?;

        let response = builder.send().await.map_err(|e| {
            let err = classify(&e);
            debug!(url = %request.url, error = %err, "HTTP request failed");
            err
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = match request.max_body {
            Some(limit) => read_limited(response, limit).await?,
            None => response.bytes().await.map_err(|e| classify(&e))?,
        };
        trace!(status, bytes = body.len(), "HTTP response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
