//! Error types for touchline-core

use thiserror::Error;

/// Error type for attribution operations
///
/// Absence of data (empty journeys, journeys without conversions) is never
/// an error; those paths return empty results instead.
#[derive(Debug, Error)]
pub enum AttributionError {
    /// Model name outside the closed set of attribution models
    #[error("Unsupported attribution model: {0}")]
    UnsupportedModel(String),

    /// Configuration is invalid or could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for attribution operations
pub type Result<T> = std::result::Result<T, AttributionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AttributionError::UnsupportedModel("markov_chain".into());
        assert_eq!(
            err.to_string(),
            "Unsupported attribution model: markov_chain"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AttributionError = io_err.into();
        assert!(matches!(err, AttributionError::Io(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = AttributionError::Config("half_life_days must be positive".into());
        assert!(err.to_string().contains("half_life_days"));
    }
}
