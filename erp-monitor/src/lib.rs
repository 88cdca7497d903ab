//! ERP Monitor Library
//!
//! Daily equity risk premium monitor for a Chinese equity index. Each run
//! fetches the index P/E and the China 10-year government bond yield,
//! derives the implied equity risk premium, classifies it against a target
//! band and publishes the result as a new spreadsheet.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ Rate Fetcher │   │ Ratio Fetcher│  (HTTP scrape / headless browser)
//! └──────┬───────┘   └──────┬───────┘
//!        └────────┬─────────┘
//!                 ▼
//!       ┌───────────────────┐
//!       │ Valuation         │  (pure: ERP, ceiling, signal)
//!       │ Calculator        │
//!       └─────────┬─────────┘
//!                 ▼
//!       ┌───────────────────┐
//!       │ Sheet Writer      │  (create, move, write, format)
//!       └───────────────────┘
//! ```
//!
//! Missing inputs never abort a run: the report is published with blank
//! cells and a "needs manual update" signal. Only spreadsheet failures are
//! fatal.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod pipeline;
pub mod sheets;
pub mod valuation;

pub use data::{DataSource, RateFetcher, RateProvider, RatioFetcher, RatioProvider, Sourced};
pub use pipeline::{Pipeline, RunOutcome};
pub use sheets::{ReportPublisher, SheetHandle, SheetWriter, SheetsError};
pub use valuation::{Classification, Icon, ValuationCalculator, ValuationConfig, ValuationReport};
