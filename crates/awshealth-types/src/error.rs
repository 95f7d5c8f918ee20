//! Error types for the AWS Health exporter.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for upstream query operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures reaching or parsing the upstream Health API.
///
/// Always recoverable: the poller records the failure and tries again
/// on the next scheduled cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("health api error in {operation}: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("pagination stalled in {operation}: next token {token:?} repeated")]
    Pagination {
        operation: &'static str,
        token: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Build an `Api` error from any displayable upstream error.
    pub fn api(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Api {
            operation,
            message: err.to_string(),
        }
    }
}

/// Invalid or unusable process setup. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no usable AWS credentials: {0}")]
    Credentials(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_names_operation() {
        let err = TransportError::api("DescribeEvents", "access denied");
        assert_eq!(
            err.to_string(),
            "health api error in DescribeEvents: access denied"
        );
    }

    #[test]
    fn timeout_display() {
        let err = TransportError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "fetch timed out after 30s");
    }
}
