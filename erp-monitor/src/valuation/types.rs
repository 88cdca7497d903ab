//! Valuation report types.

use serde::{Deserialize, Serialize};

use crate::data::DataSource;

// ============================================================================
// Classification
// ============================================================================

/// Signal derived from the implied equity risk premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Premium at or above target + tolerance
    Buy,
    /// Premium inside the tolerance band
    Hold,
    /// Premium at or below target - tolerance
    Sell,
    /// Premium could not be computed
    NeedsManualUpdate,
}

impl Classification {
    /// Marker shown next to the label. Derived from the classification only.
    pub const fn icon(&self) -> Icon {
        match self {
            Self::Buy => Icon::Green,
            Self::Sell => Icon::Red,
            Self::NeedsManualUpdate => Icon::Neutral,
            Self::Hold => Icon::Yellow,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy (undervalued)"),
            Self::Hold => write!(f, "hold (fair)"),
            Self::Sell => write!(f, "sell (overvalued)"),
            Self::NeedsManualUpdate => write!(f, "needs manual update"),
        }
    }
}

/// Display marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Green,
    Red,
    Yellow,
    Neutral,
}

impl Icon {
    /// Emoji rendering.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Green => "🟢",
            Self::Red => "🔴",
            Self::Yellow => "🟡",
            Self::Neutral => "⚪",
        }
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Report
// ============================================================================

/// Where the report's inputs came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub index_name: String,
    pub ratio_source: DataSource,
    pub rate_source: DataSource,
}

impl Default for Provenance {
    fn default() -> Self {
        Self {
            index_name: String::new(),
            ratio_source: DataSource::Unavailable,
            rate_source: DataSource::Unavailable,
        }
    }
}

/// Derived valuation record for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationReport {
    /// Index P/E (TTM)
    pub ratio: Option<f64>,
    /// 1 / ratio
    pub earnings_yield: Option<f64>,
    /// Risk-free rate
    pub rate: Option<f64>,
    /// Earnings yield minus rate
    pub implied_premium: Option<f64>,
    pub target_premium: f64,
    pub tolerance: f64,
    /// Highest P/E still meeting the target premium: 1 / (rate + target)
    pub ratio_ceiling: Option<f64>,
    pub classification: Classification,
    pub icon: Icon,
    pub provenance: Provenance,
}

impl ValuationReport {
    /// Attach input provenance.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Whether any input was missing.
    pub fn is_incomplete(&self) -> bool {
        self.ratio.is_none() || self.rate.is_none()
    }

    /// One-line summary for logs and stdout.
    pub fn summary(&self) -> String {
        format!(
            "{} P/E={} rate={} ERP={} → {} {}",
            if self.provenance.index_name.is_empty() {
                "index"
            } else {
                self.provenance.index_name.as_str()
            },
            fmt_decimal(self.ratio),
            fmt_percent(self.rate),
            fmt_percent(self.implied_premium),
            self.icon,
            self.classification
        )
    }
}

/// `12.34` or `n/a`.
pub fn fmt_decimal(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// `1.78%` or `n/a`.
pub fn fmt_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}
