//! Unified error hierarchy for RecoveryRS
//!
//! Library operations return [`EngineError`]. Input problems are rejected before
//! any computation, provider failures pass through untouched, and computation
//! errors signal a broken bound that must never be masked with a guessed value.

use crate::models::Domain;
use thiserror::Error;

/// Top-level error type for all engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller supplied missing or out-of-range input
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// A metric sample provider failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A derived value broke its documented bounds
    #[error("Computation error: {0}")]
    Computation(#[from] ComputationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid caller input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Required feature absent from the request
    #[error("Missing required feature: {feature}")]
    MissingFeature { feature: String },

    /// Feature present but outside its valid range
    #[error("Invalid value for {field}: {value} (expected {expected})")]
    OutOfRange {
        field: String,
        value: f64,
        expected: String,
    },

    /// Lookback window of zero or beyond the configured maximum
    #[error("Invalid timeframe: {days} days (expected 1-{max})")]
    InvalidTimeframe { days: u32, max: u32 },

    /// Projection horizon of zero or beyond the configured maximum
    #[error("Invalid horizon: {periods} periods (expected 1-{max})")]
    InvalidHorizon { periods: u32, max: u32 },

    /// Athlete not part of the supplied peer group
    #[error("Athlete {athlete_id} not found in peer group")]
    UnknownAthlete { athlete_id: String },

    /// Peer group without any athletes
    #[error("Peer group is empty")]
    EmptyPeerGroup,
}

impl InputError {
    pub fn missing(feature: &str) -> Self {
        InputError::MissingFeature {
            feature: feature.to_string(),
        }
    }

    pub fn out_of_range(field: &str, value: f64, expected: &str) -> Self {
        InputError::OutOfRange {
            field: field.to_string(),
            value,
            expected: expected.to_string(),
        }
    }
}

/// Metric sample provider failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Provider could not be reached or failed mid-request
    #[error("{domain} samples unavailable for athlete {athlete_id}: {reason}")]
    Unavailable {
        domain: Domain,
        athlete_id: String,
        reason: String,
    },

    /// Provider has no record of the athlete
    #[error("Athlete not found: {athlete_id}")]
    AthleteNotFound { athlete_id: String },
}

/// Invariant violations in derived values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    /// Value outside its documented closed interval
    #[error("{quantity} out of bounds: {value} not in [{min}, {max}]")]
    OutOfBounds {
        quantity: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value
    #[error("{quantity} is not finite")]
    NonFinite { quantity: String },
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Fail loudly if `value` is non-finite or outside `[min, max]`
pub fn ensure_bounded(quantity: &str, value: f64, min: f64, max: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(ComputationError::NonFinite {
            quantity: quantity.to_string(),
        }
        .into());
    }
    if value < min || value > max {
        return Err(ComputationError::OutOfBounds {
            quantity: quantity.to_string(),
            value,
            min,
            max,
        }
        .into());
    }
    Ok(value)
}

impl EngineError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Provider(ProviderError::Unavailable { .. }) | EngineError::Io(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::Input(_) => ErrorSeverity::Warning,
            EngineError::Provider(ProviderError::AthleteNotFound { .. }) => ErrorSeverity::Warning,
            EngineError::Provider(_) => ErrorSeverity::Error,
            EngineError::Computation(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Input(InputError::MissingFeature { feature }) => {
                format!("The request is missing the required field '{}'.", feature)
            }
            EngineError::Provider(ProviderError::Unavailable { domain, .. }) => {
                format!(
                    "{} data is temporarily unavailable. Please try again later.",
                    domain
                )
            }
            EngineError::Provider(ProviderError::AthleteNotFound { athlete_id }) => {
                format!("No recovery data found for athlete {}.", athlete_id)
            }
            EngineError::Computation(_) => {
                "An internal scoring error occurred. The result was discarded.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Broken invariant requiring immediate attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Caller-side problem
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err: EngineError = InputError::missing("age").into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err: EngineError = ComputationError::NonFinite {
            quantity: "score".to_string(),
        }
        .into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        let err: EngineError = ProviderError::Unavailable {
            domain: Domain::Sleep,
            athlete_id: "a1".to_string(),
            reason: "timeout".to_string(),
        }
        .into();
        assert!(err.is_retryable());

        let err: EngineError = InputError::EmptyPeerGroup.into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err: EngineError = InputError::missing("recovery_score").into();
        assert!(err.user_message().contains("recovery_score"));

        let err: EngineError = ProviderError::Unavailable {
            domain: Domain::Nutrition,
            athlete_id: "a1".to_string(),
            reason: "503".to_string(),
        }
        .into();
        assert!(err.user_message().starts_with("nutrition data"));
    }

    #[test]
    fn test_ensure_bounded() {
        assert_eq!(ensure_bounded("score", 50.0, 0.0, 100.0).unwrap(), 50.0);
        assert!(ensure_bounded("score", 100.5, 0.0, 100.0).is_err());
        assert!(matches!(
            ensure_bounded("score", f64::NAN, 0.0, 100.0),
            Err(EngineError::Computation(ComputationError::NonFinite { .. }))
        ));
    }
}
