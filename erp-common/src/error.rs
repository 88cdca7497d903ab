//! Shared error type.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using the shared error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the ERP monitor crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// External service error
    #[error("External service error: {0}")]
    External(String),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::External("token endpoint returned 500".into());
        let with_ctx = err.with_context("publishing report");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert_eq!(
            with_ctx.to_string(),
            "publishing report: External service error: token endpoint returned 500"
        );
    }

    #[test]
    fn test_result_ext_context() {
        let res: std::result::Result<(), ValidationError> = Err(ValidationError::MissingField {
            field: "sheets.service_account_email".into(),
        });
        let err = res.context("checking credentials").unwrap_err();
        assert!(matches!(err, Error::WithContext { ref source, .. } if matches!(**source, Error::Validation(_))));
        assert_eq!(
            err.to_string(),
            "checking credentials: Missing required field: sheets.service_account_email"
        );
    }

    #[test]
    fn test_validation_error_transparent() {
        let err: Error = ValidationError::MissingField {
            field: "sheets.private_key".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Missing required field: sheets.private_key");
    }
}
