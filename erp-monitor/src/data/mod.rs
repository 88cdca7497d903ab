//! Market inputs: the risk-free rate and the index P/E ratio.
//!
//! Every fetch degrades to an absent value instead of failing the run; the
//! report shows a placeholder for anything that could not be fetched.

pub mod provider;
pub mod rate;
pub mod ratio;
pub mod strategy;
mod text;

pub use provider::{DataSource, RateProvider, RatioProvider, Sourced};
pub use rate::RateFetcher;
pub use ratio::RatioFetcher;
pub use strategy::{
    is_valid_ratio, select_ratio, RatioInput, RatioStrategy, JSON_STRATEGIES, RATIO_UPPER_BOUND,
};

/// Risk-free rate as a decimal fraction (0.0178 = 1.78%).
pub type RateValue = Option<f64>;

/// Price-to-earnings ratio, always inside (0, 1000) when present.
pub type RatioValue = Option<f64>;
