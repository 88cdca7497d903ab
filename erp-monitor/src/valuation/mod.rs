//! Valuation module.
//!
//! Turns the index P/E and the risk-free rate into an implied equity risk
//! premium and a buy/hold/sell signal.
//!
//! # Usage
//!
//! ```
//! use erp_monitor::valuation::{Classification, ValuationCalculator};
//!
//! let calculator = ValuationCalculator::new();
//! let report = calculator.compute(Some(15.0), Some(0.03));
//!
//! assert_eq!(report.classification, Classification::Sell);
//! println!("{}", report.summary());
//! ```

pub mod calculator;
pub mod types;

pub use calculator::{classify, compute_report, ValuationCalculator, ValuationConfig};
pub use types::{fmt_decimal, fmt_percent, Classification, Icon, Provenance, ValuationReport};
