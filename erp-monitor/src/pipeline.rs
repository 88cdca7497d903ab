//! One monitor run: fetch both inputs, compute the report, publish it.

use erp_common::config::{Config, OverrideConfig};
use erp_common::error::{Error, ResultExt};

use crate::data::{is_valid_ratio, RateFetcher, RateProvider, RatioFetcher, RatioProvider};
use crate::sheets::{ReportPublisher, SheetHandle, SheetWriter, SheetsError};
use crate::valuation::{Provenance, ValuationCalculator, ValuationReport};

impl From<SheetsError> for Error {
    fn from(e: SheetsError) -> Self {
        if e.is_remote() {
            Error::External(e.to_string())
        } else {
            Error::Config(e.to_string())
        }
    }
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ValuationReport,
    /// `None` on a dry run
    pub handle: Option<SheetHandle>,
}

/// The fetch → compute → publish pipeline.
pub struct Pipeline {
    rate: Box<dyn RateProvider>,
    ratio: Box<dyn RatioProvider>,
    calculator: ValuationCalculator,
    publisher: Option<Box<dyn ReportPublisher>>,
    overrides: OverrideConfig,
    index_name: String,
}

impl Pipeline {
    /// Assemble a pipeline from explicit parts.
    pub fn new(
        rate: Box<dyn RateProvider>,
        ratio: Box<dyn RatioProvider>,
        calculator: ValuationCalculator,
        publisher: Option<Box<dyn ReportPublisher>>,
    ) -> Self {
        Self {
            rate,
            ratio,
            calculator,
            publisher,
            overrides: OverrideConfig::default(),
            index_name: String::new(),
        }
    }

    /// Values used when a live fetch comes back empty.
    pub fn with_overrides(mut self, overrides: OverrideConfig) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Build the live pipeline. No publisher on a dry run.
    pub fn from_config(config: &Config) -> erp_common::Result<Self> {
        let publisher: Option<Box<dyn ReportPublisher>> = if config.dry_run {
            None
        } else {
            let writer = SheetWriter::from_config(&config.sheets).context("sheet writer setup")?;
            Some(Box::new(writer))
        };

        Ok(Self::new(
            Box::new(RateFetcher::new(&config.rate)),
            Box::new(RatioFetcher::new(&config.index, &config.ratio)),
            ValuationCalculator::with_config(config.valuation.into()),
            publisher,
        )
        .with_overrides(config.overrides)
        .with_index_name(config.index.name.clone()))
    }

    /// Run once. Only publishing can fail.
    pub async fn run(&self) -> anyhow::Result<RunOutcome> {
        let rate = self
            .rate
            .fetch_rate()
            .await
            .or_override(self.overrides.rate, f64::is_finite);
        let ratio = self
            .ratio
            .fetch_ratio_sourced()
            .await
            .or_override(self.overrides.ratio, is_valid_ratio);

        if rate.value.is_none() {
            tracing::warn!("Risk-free rate unavailable; report needs manual update");
        }
        if ratio.value.is_none() {
            tracing::warn!("Index P/E unavailable; report needs manual update");
        }

        let report = self
            .calculator
            .compute(ratio.value, rate.value)
            .with_provenance(Provenance {
                index_name: self.index_name.clone(),
                ratio_source: ratio.source,
                rate_source: rate.source,
            });

        tracing::info!(
            ratio = ?report.ratio,
            rate = ?report.rate,
            implied_premium = ?report.implied_premium,
            classification = %report.classification,
            "Valuation computed"
        );

        let handle = match &self.publisher {
            Some(publisher) => Some(publisher.publish_report(&report).await?),
            None => {
                tracing::info!("Dry run, report not published");
                None
            }
        };

        Ok(RunOutcome { report, handle })
    }
}
