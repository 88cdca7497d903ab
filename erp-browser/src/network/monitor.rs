//! Capturing backend responses via CDP network events.
//!
//! Listeners must be registered before navigation: a response that arrives
//! before [`ResponseCapture::register`] is never seen.

use std::time::Duration;

use base64::Engine;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;

use crate::error::BrowserError;

/// Which responses to capture.
#[derive(Debug, Clone)]
pub struct CaptureFilter {
    /// Every pattern must appear in the response URL
    url_patterns: Vec<String>,
    /// Every needle must appear in the response body
    body_needles: Vec<String>,
    status: i64,
}

impl CaptureFilter {
    /// Match HTTP 200 responses whose URL contains `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            url_patterns: vec![pattern.into()],
            body_needles: Vec::new(),
            status: 200,
        }
    }

    /// Require an additional URL substring.
    pub fn and_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url_patterns.push(pattern.into());
        self
    }

    /// Require a substring in the response body. Checked once the body has
    /// loaded; a response that fails it is skipped and the wait goes on.
    pub fn and_body_contains(mut self, needle: impl Into<String>) -> Self {
        self.body_needles.push(needle.into());
        self
    }

    /// Check if a response should be captured.
    pub fn matches(&self, url: &str, status: i64) -> bool {
        status == self.status && self.url_patterns.iter().all(|p| url.contains(p.as_str()))
    }

    /// Check a loaded body against the body needles.
    pub fn accepts_body(&self, body: &[u8]) -> bool {
        self.body_needles.iter().all(|needle| {
            let needle = needle.as_bytes();
            needle.is_empty() || body.windows(needle.len()).any(|w| w == needle)
        })
    }
}

/// A captured response body.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub status: i64,
    pub body: Vec<u8>,
}

impl CapturedResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Response listener bound to one page.
pub struct ResponseCapture {
    filter: CaptureFilter,
    responses: EventStream<EventResponseReceived>,
    finished: EventStream<EventLoadingFinished>,
}

impl std::fmt::Debug for ResponseCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCapture")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl ResponseCapture {
    /// Subscribe to network events on `page`.
    pub async fn register(page: &Page, filter: CaptureFilter) -> Result<Self, BrowserError> {
        let responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| BrowserError::NetworkError(e.to_string()))?;
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|e| BrowserError::NetworkError(e.to_string()))?;

        Ok(Self {
            filter,
            responses,
            finished,
        })
    }

    /// Wait up to `wait` for the first matching response whose body loads.
    ///
    /// Returns `None` on timeout or when the page goes away.
    pub async fn next_match(&mut self, page: &Page, wait: Duration) -> Option<CapturedResponse> {
        let Self {
            filter,
            responses,
            finished,
        } = self;
        let deadline = tokio::time::Instant::now() + wait;
        // Matched but still loading, and loaded before their response event.
        let mut pending: Vec<(RequestId, String, i64)> = Vec::new();
        let mut finished_early: Vec<RequestId> = Vec::new();

        loop {
            let ready = tokio::time::timeout_at(deadline, async {
                tokio::select! {
                    Some(event) = responses.next() => {
                        let response = &event.response;
                        if !filter.matches(&response.url, response.status) {
                            return Some(None);
                        }
                        tracing::debug!(url = %response.url, "Matching response received");
                        let entry = (event.request_id.clone(), response.url.clone(), response.status);
                        match finished_early.iter().position(|id| *id == event.request_id) {
                            Some(idx) => {
                                finished_early.swap_remove(idx);
                                Some(Some(entry))
                            }
                            None => {
                                pending.push(entry);
                                Some(None)
                            }
                        }
                    }
                    Some(event) = finished.next() => {
                        match pending.iter().position(|(id, _, _)| *id == event.request_id) {
                            Some(idx) => Some(Some(pending.swap_remove(idx))),
                            None => {
                                finished_early.push(event.request_id.clone());
                                Some(None)
                            }
                        }
                    }
                    else => None,
                }
            })
            .await;

            let (request_id, url, status) = match ready {
                Ok(Some(Some(done))) => done,
                Ok(Some(None)) => continue,
                Ok(None) => return None,
                Err(_) => {
                    tracing::debug!(
                        waited_ms = wait.as_millis() as u64,
                        "No matching response before timeout"
                    );
                    return None;
                }
            };

            match fetch_body(page, request_id).await {
                Ok(body) if filter.accepts_body(&body) => {
                    return Some(CapturedResponse { url, status, body })
                }
                Ok(_) => {
                    tracing::debug!(%url, "Matching response is for another resource, still waiting");
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Failed to read captured response body");
                }
            }
        }
    }
}

async fn fetch_body(page: &Page, request_id: RequestId) -> Result<Vec<u8>, BrowserError> {
    let response = page
        .execute(GetResponseBodyParams::new(request_id))
        .await
        .map_err(|e| BrowserError::NetworkError(e.to_string()))?;

    decode_body(&response.result.body, response.result.base64_encoded)
}

fn decode_body(body: &str, base64_encoded: bool) -> Result<Vec<u8>, BrowserError> {
    if base64_encoded {
        base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| BrowserError::NetworkError(format!("invalid base64 body: {e}")))
    } else {
        Ok(body.as_bytes().to_vec())
    }
}
