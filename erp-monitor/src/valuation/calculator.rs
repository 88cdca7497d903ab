//! Equity risk premium calculator.
//!
//! Pure and total: every combination of present/absent inputs yields a
//! report, and identical inputs yield identical reports.

use erp_common::config::ValuationSettings;

use super::types::{Classification, Provenance, ValuationReport};
use crate::data::{RateValue, RatioValue};

/// Calculator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationConfig {
    /// Target equity risk premium (decimal fraction)
    pub target_premium: f64,
    /// Symmetric band around the target
    pub tolerance: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationSettings::default().into()
    }
}

impl From<ValuationSettings> for ValuationConfig {
    fn from(settings: ValuationSettings) -> Self {
        Self {
            target_premium: settings.target_premium,
            tolerance: settings.tolerance,
        }
    }
}

/// ERP calculator bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct ValuationCalculator {
    config: ValuationConfig,
}

impl ValuationCalculator {
    /// Create with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom thresholds.
    pub fn with_config(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Compute the report for the configured thresholds.
    pub fn compute(&self, ratio: RatioValue, rate: RateValue) -> ValuationReport {
        compute_report(ratio, rate, self.config.target_premium, self.config.tolerance)
    }
}

/// Compute a valuation report.
pub fn compute_report(
    ratio: RatioValue,
    rate: RateValue,
    target_premium: f64,
    tolerance: f64,
) -> ValuationReport {
    let ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
    let rate = rate.filter(|r| r.is_finite());

    let earnings_yield = ratio.map(|r| 1.0 / r);
    let implied_premium = match (earnings_yield, rate) {
        (Some(ey), Some(rf)) => Some(ey - rf),
        _ => None,
    };
    let ratio_ceiling = rate
        .map(|rf| rf + target_premium)
        .filter(|denominator| *denominator > 0.0)
        .map(|denominator| 1.0 / denominator);

    let classification = classify(implied_premium, target_premium, tolerance);

    ValuationReport {
        ratio,
        earnings_yield,
        rate,
        implied_premium,
        target_premium,
        tolerance,
        ratio_ceiling,
        classification,
        icon: classification.icon(),
        provenance: Provenance::default(),
    }
}

/// Three-way signal against the tolerance band.
pub fn classify(implied_premium: Option<f64>, target_premium: f64, tolerance: f64) -> Classification {
    match implied_premium {
        None => Classification::NeedsManualUpdate,
        Some(p) if p >= target_premium + tolerance => Classification::Buy,
        Some(p) if p <= target_premium - tolerance => Classification::Sell,
        Some(_) => Classification::Hold,
    }
}
