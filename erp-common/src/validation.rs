//! Configuration validation.
//!
//! Checks that thresholds are usable and that required credentials are
//! present before the pipeline touches the network.

use std::str::FromStr;
use thiserror::Error;

use crate::config::{Config, ObservabilityConfig, SheetsConfig, ValuationSettings};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    ///
    /// Spreadsheet credentials are only required when the report is
    /// actually published.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.valuation.validate() {
            errors.push(e);
        }
        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }
        if let Err(e) = validate_timezone(&self.sheets.timezone) {
            errors.push(e);
        }
        if !self.dry_run {
            if let Err(e) = self.sheets.validate() {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for ValuationSettings {
    fn validate(&self) -> ValidationResult<()> {
        if !self.target_premium.is_finite() || self.target_premium <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "valuation.target_premium".into(),
                reason: format!("must be a positive number, got {}", self.target_premium),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "valuation.tolerance".into(),
                reason: format!("must be non-negative, got {}", self.tolerance),
            });
        }
        Ok(())
    }
}

impl Validate for SheetsConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.service_account_email.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError::MissingField {
                field: "sheets.service_account_email".into(),
            });
        }
        if self.private_key.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError::MissingField {
                field: "sheets.private_key".into(),
            });
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

fn validate_timezone(name: &str) -> ValidationResult<()> {
    chrono_tz::Tz::from_str(name)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidValue {
            field: "sheets.timezone".into(),
            reason: format!("unknown IANA timezone '{name}'"),
        })
}
