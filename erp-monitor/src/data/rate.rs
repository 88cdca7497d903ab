//! China 10-year government bond yield scraper.
//!
//! Two pages, tried in order. The primary page is matched with a pattern
//! anchored on the "China ... 10-Year ... x.xx%" phrasing; the secondary page
//! simply yields its first percentage. Transport errors never leave this
//! module: they are logged and treated as "no match".

use async_trait::async_trait;
use erp_common::config::RateConfig;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use std::sync::LazyLock;
use std::time::Duration;

use super::provider::{RateProvider, Sourced};
use super::text::visible_text;

/// "China", then "10-year" within 80 characters, then a yield figure
/// followed by "%" within 40 characters.
static ANCHORED_YIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)China.{0,80}?10[\s-]?Y(?:ea)?r.{0,40}?(-?\d{1,2}\.\d+)\s*%").unwrap()
});

static ANY_PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d{1,2}\.\d+)\s*%").unwrap());

/// Parse the primary page.
pub fn parse_primary(html: &str) -> Option<f64> {
    let text = visible_text(html);
    ANCHORED_YIELD
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|pct| pct / 100.0)
}

/// Parse the secondary page: first percentage-formatted number.
pub fn parse_first_percentage(html: &str) -> Option<f64> {
    let text = visible_text(html);
    ANY_PERCENTAGE
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|pct| pct / 100.0)
}

/// Risk-free rate fetcher.
pub struct RateFetcher {
    client: reqwest::Client,
    primary_url: String,
    secondary_url: String,
}

impl RateFetcher {
    /// Create a fetcher from the rate source configuration.
    pub fn new(config: &RateConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Ok(referer) = HeaderValue::from_str(&config.referer) {
            headers.insert(REFERER, referer);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            primary_url: config.primary_url.clone(),
            secondary_url: config.secondary_url.clone(),
        }
    }

    /// GET a page body; any failure becomes `None`.
    async fn get_page(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%url, error = %e, "Rate page request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Rate page returned error status");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(%url, error = %e, "Failed to read rate page body");
                None
            }
        }
    }
}

#[async_trait]
impl RateProvider for RateFetcher {
    async fn fetch_rate(&self) -> Sourced {
        if let Some(rate) = self
            .get_page(&self.primary_url)
            .await
            .as_deref()
            .and_then(parse_primary)
        {
            tracing::info!(rate, source = "primary", "Risk-free rate fetched");
            return Sourced::live(rate, source_label(&self.primary_url));
        }
        tracing::warn!(url = %self.primary_url, "Primary rate source gave no match, trying secondary");

        if let Some(rate) = self
            .get_page(&self.secondary_url)
            .await
            .as_deref()
            .and_then(parse_first_percentage)
        {
            tracing::info!(rate, source = "secondary", "Risk-free rate fetched");
            return Sourced::live(rate, source_label(&self.secondary_url));
        }

        tracing::warn!("No risk-free rate source matched");
        Sourced::missing()
    }
}

/// Host of a source URL, falling back to the URL itself.
fn source_label(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}
