//! Scripted HTTP client for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::{
    client::{HttpClient, HttpRequest, HttpResponse},
    error::{ClientError, Result},
};

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<Result<HttpResponse>>,
    probe: Option<ClientError>,
    requests: Vec<HttpRequest>,
}

/// In-memory [`HttpClient`].
///
/// `execute` pops scripted outcomes in order and answers an empty `200` once
/// the script runs out. A scripted body longer than the request's `max_body`
/// fails the way the real client does. `probe` succeeds unless a probe failure was set; it
/// never consumes scripted outcomes. Every request, including probes, is
/// recorded. Clones share state, so a test can keep one clone to inspect what
/// the device sent.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // Poisoning only happens when a test already panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a response.
    pub fn push_response(&self, response: HttpResponse) -> &Self {
        self.lock().responses.push_back(Ok(response));
        self
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: ClientError) -> &Self {
        self.lock().responses.push_back(Err(error));
        self
    }

    /// Make every subsequent probe fail with `error`.
    pub fn fail_probe(&self, error: ClientError) {
        self.lock().probe = Some(error);
    }

    pub fn clear_probe_failure(&self) {
        self.lock().probe = None;
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }
}

impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        trace!(method = %request.method, url = %request.url, "Mock HTTP request");
        let limit = request.max_body;
        let mut state = self.lock();
        state.requests.push(request);
        let response = state
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::ok()))?;
        response.check_body_limit(limit)?;
        Ok(response)
    }

    async fn probe(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.requests.push(HttpRequest::head(url));
        match &state.probe {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
