//! Error types for the forecast-lab library.

use thiserror::Error;

/// Result type alias for forecast-lab operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while splitting, fitting, evaluating or plotting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Model estimation did not produce usable parameters.
    #[error("estimation failed: {0}")]
    EstimationFailed(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// A plot could not be rendered or written.
    #[error("render error: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = ForecastError::InvalidParameter("train_fraction must be in (0, 1)".to_string());
        assert_eq!(
            err.to_string(),
            "invalid parameter: train_fraction must be in (0, 1)"
        );

        let err = ForecastError::DimensionMismatch {
            expected: 20,
            got: 19,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 20, got 19");

        let err = ForecastError::EstimationFailed("optimizer did not converge".to_string());
        assert_eq!(
            err.to_string(),
            "estimation failed: optimizer did not converge"
        );

        let err = ForecastError::Render("disk full".to_string());
        assert_eq!(err.to_string(), "render error: disk full");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::MissingValues;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
        assert_ne!(err1, ForecastError::EmptyData);
    }
}
