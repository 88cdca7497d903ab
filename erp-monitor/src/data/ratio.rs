//! Index P/E scraper.
//!
//! The data site only serves valuations to logged-in users, so the fetch runs
//! in a headless browser restored from a saved session. The ratio is read
//! from the backend JSON response the page requests; when that response
//! never shows up, or carries nothing believable, the rendered page text is
//! searched instead.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use erp_browser::{
    with_browser, CaptureFilter, CapturedResponse, Page, ResponseCapture, SessionConfig,
    StorageState,
};
use erp_common::config::{IndexConfig, RatioConfig};

use super::provider::{RatioProvider, Sourced};
use super::strategy::{select_ratio, RatioStrategy};

/// How long a response may still arrive after navigation has finished.
const RESPONSE_GRACE: Duration = Duration::from_secs(3);

/// Browser-driven ratio fetcher.
#[derive(Debug, Clone)]
pub struct RatioFetcher {
    session: SessionConfig,
    storage_state_path: PathBuf,
    detail_url: String,
    api_pattern: String,
    index_code: String,
    capture_timeout: Duration,
    settle: Duration,
}

impl RatioFetcher {
    /// Create a fetcher for the configured index.
    pub fn new(index: &IndexConfig, config: &RatioConfig) -> Self {
        let session = SessionConfig {
            headless: config.headless,
            executable: config.chrome_executable.clone(),
            request_timeout_secs: config.navigation_timeout_secs,
            ..Default::default()
        };

        Self {
            session,
            storage_state_path: config.storage_state_path.clone(),
            detail_url: index.detail_url.clone(),
            api_pattern: index.api_pattern.clone(),
            index_code: index.code.clone(),
            capture_timeout: Duration::from_secs(config.capture_timeout_secs),
            settle: Duration::from_secs(config.settle_secs),
        }
    }

    /// Site name used in the report's source column.
    fn site_label(&self) -> String {
        url::Url::parse(&self.detail_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| "index page".to_string())
    }

    /// Fetch the ratio using an explicit session state.
    pub async fn fetch_with_state(&self, state: &StorageState) -> Sourced {
        let fetcher = self.clone();
        let state = state.clone();

        let outcome = with_browser(&self.session, move |page| async move {
            fetcher.scrape(&page, &state).await
        })
        .await;

        match outcome {
            Ok(Some((strategy, ratio))) => {
                tracing::info!(ratio, strategy = strategy.name(), "Index ratio fetched");
                Sourced::live(ratio, format!("{} ({})", self.site_label(), strategy.name()))
            }
            Ok(None) => {
                tracing::warn!(url = %self.detail_url, "No valid ratio from response or page text");
                Sourced::missing()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Browser unavailable, ratio not fetched");
                Sourced::missing()
            }
        }
    }

    /// Responses for this index: the API path in the URL, the index code in
    /// the body.
    fn capture_filter(&self) -> CaptureFilter {
        CaptureFilter::new(self.api_pattern.clone()).and_body_contains(self.index_code.clone())
    }

    /// Drive one page: capture first, page text second.
    async fn scrape(&self, page: &Page, state: &StorageState) -> Option<(RatioStrategy, f64)> {
        if let Err(e) = state.apply(page).await {
            tracing::warn!(error = %e, "Failed to restore session state");
        }

        // Listen before navigating so an early response is not missed.
        let mut capture = match ResponseCapture::register(page, self.capture_filter()).await {
            Ok(capture) => Some(capture),
            Err(e) => {
                tracing::warn!(error = %e, "Response listener unavailable");
                None
            }
        };

        let captured = match capture.as_mut() {
            Some(capture) => self.navigate_and_capture(page, capture).await,
            None => {
                if let Err(e) = page.goto(self.detail_url.as_str()).await {
                    tracing::warn!(url = %self.detail_url, error = %e, "Navigation did not complete");
                }
                None
            }
        };

        let body = captured.and_then(|response| match response.json() {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(url = %response.url, error = %e, "Captured response is not JSON");
                None
            }
        });

        select_ratio(body.as_ref(), || async move {
            tokio::time::sleep(self.settle).await;
            page_text(page).await
        })
        .await
    }

    /// Navigate while waiting for the backend response.
    async fn navigate_and_capture(
        &self,
        page: &Page,
        capture: &mut ResponseCapture,
    ) -> Option<CapturedResponse> {
        let navigation = async {
            if let Err(e) = page.goto(self.detail_url.as_str()).await {
                tracing::warn!(url = %self.detail_url, error = %e, "Navigation did not complete");
            }
        };
        let response = capture.next_match(page, self.capture_timeout);
        response_within_grace(navigation, response, self.capture_timeout.min(RESPONSE_GRACE)).await
    }
}

/// Take `response` as soon as it resolves; once `navigation` is done, wait
/// at most `grace` more for it.
async fn response_within_grace<T>(
    navigation: impl Future<Output = ()>,
    response: impl Future<Output = Option<T>>,
    grace: Duration,
) -> Option<T> {
    tokio::pin!(navigation, response);

    tokio::select! {
        captured = &mut response => captured,
        () = &mut navigation => tokio::time::timeout(grace, &mut response).await.ok().flatten(),
    }
}

async fn page_text(page: &Page) -> Option<String> {
    match page.evaluate("document.body ? document.body.innerText : ''").await {
        Ok(result) => match result.into_value::<String>() {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "Page text was not a string");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read page text");
            None
        }
    }
}

#[async_trait]
impl RatioProvider for RatioFetcher {
    async fn fetch_ratio_sourced(&self) -> Sourced {
        let state = match StorageState::load(&self.storage_state_path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Session state unavailable, skipping ratio scrape");
                return Sourced::missing();
            }
        };
        self.fetch_with_state(&state).await
    }
}
