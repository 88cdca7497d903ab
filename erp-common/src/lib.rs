//! ERP Common - Shared configuration, logging and error types for the ERP monitor.
//!
//! This crate provides:
//! - The run configuration record and its environment overrides
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    Config, IndexConfig, ObservabilityConfig, OverrideConfig, RateConfig, RatioConfig,
    SheetsConfig, ValuationSettings,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

