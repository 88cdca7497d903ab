//! Input provider abstraction.
//!
//! The pipeline talks to the fetchers through these traits so the live
//! scrapers can be swapped for fixed values in tests.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use super::{RateValue, RatioValue};

/// Where a value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum DataSource {
    /// Fetched live; the label names the site and method
    Live(String),
    /// Taken from a configured override after the live fetch failed
    ManualOverride,
    /// Nothing available
    Unavailable,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(label) => write!(f, "{}", label),
            Self::ManualOverride => write!(f, "manual override"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A value plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced {
    pub value: Option<f64>,
    pub source: DataSource,
}

impl Sourced {
    /// A live value.
    pub fn live(value: f64, label: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            source: DataSource::Live(label.into()),
        }
    }

    /// No value.
    pub fn missing() -> Self {
        Self {
            value: None,
            source: DataSource::Unavailable,
        }
    }

    /// Fill an absent value from `fallback` if it passes `accept`.
    ///
    /// A present live value is never replaced.
    pub fn or_override<F>(self, fallback: Option<f64>, accept: F) -> Self
    where
        F: Fn(f64) -> bool,
    {
        if self.value.is_some() {
            return self;
        }
        match fallback {
            Some(v) if accept(v) => Self {
                value: Some(v),
                source: DataSource::ManualOverride,
            },
            Some(v) => {
                tracing::warn!(value = v, "Override rejected by sanity check");
                self
            }
            None => self,
        }
    }
}

/// Source of the risk-free rate.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch the rate with provenance. Never fails.
    async fn fetch_rate(&self) -> Sourced;

    /// Fetch the bare rate.
    async fn fetch_risk_free_rate(&self) -> RateValue {
        self.fetch_rate().await.value
    }
}

/// Source of the index P/E ratio.
#[async_trait]
pub trait RatioProvider: Send + Sync {
    /// Fetch the ratio with provenance. Never fails.
    async fn fetch_ratio_sourced(&self) -> Sourced;

    /// Fetch the bare ratio.
    async fn fetch_ratio(&self) -> RatioValue {
        self.fetch_ratio_sourced().await.value
    }
}
