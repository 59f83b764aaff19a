//! Unified error hierarchy for vitalrs
//!
//! Configuration mistakes (bad window lengths, bad goals, asking a goal question
//! of a non-counter metric) fail fast before any provider work is issued.
//! Missing days are never errors; only a total provider outage surfaces as
//! [`VitalError::ProviderUnavailable`].

use thiserror::Error;

use crate::models::MetricKind;

/// Top-level error type for all vitalrs operations
#[derive(Debug, Error)]
pub enum VitalError {
    /// Window length was zero or missing
    #[error("Invalid window: {days} days (must be at least 1)")]
    InvalidWindow { days: usize },

    /// Goal threshold was zero or negative
    #[error("Invalid goal for {metric}: {goal} (must be positive)")]
    InvalidGoal { metric: MetricKind, goal: i64 },

    /// Every query against the sample source failed
    #[error("Sample provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Operation does not apply to this metric
    #[error("{operation} is not supported for {metric}")]
    UnsupportedMetric {
        metric: MetricKind,
        operation: &'static str,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for vitalrs operations
pub type Result<T> = std::result::Result<T, VitalError>;

impl VitalError {
    /// Whether the caller should offer a retry
    ///
    /// The engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VitalError::ProviderUnavailable { .. })
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VitalError::InvalidWindow { .. } => ErrorSeverity::Critical,
            VitalError::InvalidGoal { .. } => ErrorSeverity::Error,
            VitalError::UnsupportedMetric { .. } => ErrorSeverity::Critical,
            VitalError::ProviderUnavailable { .. } => ErrorSeverity::Warning,
            VitalError::Configuration(_) => ErrorSeverity::Error,
            VitalError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Emit this error as a tracing event at its severity level
    pub fn log(&self) {
        let retryable = self.is_retryable();
        match self.severity().to_tracing_level() {
            tracing::Level::ERROR => tracing::error!(error = %self, retryable, "Request failed"),
            _ => tracing::warn!(error = %self, retryable, "Request failed"),
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            VitalError::ProviderUnavailable { .. } => {
                "Health data is unavailable right now. Please try again.".to_string()
            }
            VitalError::InvalidGoal { metric, .. } => {
                format!(
                    "Your daily {} goal must be greater than zero.",
                    metric.display_name().to_lowercase()
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Programmer error, the request was malformed
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Transient condition the user can retry
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
