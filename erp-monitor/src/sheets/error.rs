//! Spreadsheet client errors.

use thiserror::Error;

/// Errors from the token exchange and the spreadsheet/drive APIs.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Service-account email or key not configured
    #[error("Missing service-account credentials: {0}")]
    MissingCredentials(&'static str),

    /// Private key could not be parsed as an RSA PEM key
    #[error("Invalid service-account key: {0}")]
    InvalidKey(String),

    /// Token signing or exchange failed
    #[error("Token exchange failed: {0}")]
    Auth(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from an API call
    #[error("{operation} failed with status {status}: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Success status but a body without the expected fields
    #[error("Unexpected response from {0}")]
    UnexpectedResponse(&'static str),

    /// Unknown IANA timezone name
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

impl SheetsError {
    /// Whether this error came from the remote side rather than local setup.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::Http(_) | Self::Api { .. } | Self::UnexpectedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = SheetsError::Api {
            operation: "create spreadsheet",
            status: 403,
            body: "PERMISSION_DENIED".into(),
        };
        assert_eq!(
            err.to_string(),
            "create spreadsheet failed with status 403: PERMISSION_DENIED"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn test_local_errors() {
        assert!(!SheetsError::MissingCredentials("private key").is_remote());
        assert!(!SheetsError::InvalidTimezone("Mars/Base".into()).is_remote());
        assert_eq!(
            SheetsError::MissingCredentials("private key").to_string(),
            "Missing service-account credentials: private key"
        );
    }
}
