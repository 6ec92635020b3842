//! Error types for the probe engine

use thiserror::Error;

/// Main error type for probe engine operations
#[derive(Debug, Error, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ProbeError {
    #[error("Transport timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Unexpected status {status_code} from {operation}")]
    Status { operation: String, status_code: u16 },

    #[error("Network error: {details}")]
    Network { details: String },

    #[error("Session unavailable: {reason}")]
    SessionUnavailable { reason: String },

    #[error("Notification failed: {reason}")]
    NotifierFailed { reason: String },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Transport mode not supported by this build: {mode}")]
    UnsupportedTransport { mode: String },

    #[error("Serialization error: {error}")]
    SerializationError { error: String },
}

impl ProbeError {
    /// Create a configuration validation error
    pub fn invalid_config(field: &str, reason: &str) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: &str, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
            duration_ms,
        }
    }

    /// Create a network error
    pub fn network(details: impl Into<String>) -> Self {
        Self::Network {
            details: details.into(),
        }
    }

    /// Create a notifier error
    pub fn notifier(reason: impl Into<String>) -> Self {
        Self::NotifierFailed {
            reason: reason.into(),
        }
    }

    /// Errors a worker recovers from locally and keeps looping past
    pub fn is_recoverable(&self) -> bool {
        match self {
            ProbeError::Timeout { .. } => true,
            ProbeError::Status { .. } => true,
            ProbeError::Network { .. } => true,
            ProbeError::SessionUnavailable { .. } => true,
            ProbeError::NotifierFailed { .. } => true,

            ProbeError::InvalidConfig { .. } => false,
            ProbeError::UnsupportedTransport { .. } => false,
            ProbeError::SerializationError { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::Timeout { .. }
            | ProbeError::Status { .. }
            | ProbeError::Network { .. } => ErrorCategory::Transport,
            ProbeError::SessionUnavailable { .. } => ErrorCategory::Session,
            ProbeError::NotifierFailed { .. } => ErrorCategory::Notifier,
            ProbeError::InvalidConfig { .. }
            | ProbeError::UnsupportedTransport { .. }
            | ProbeError::SerializationError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Session => ErrorSeverity::Medium,
            ErrorCategory::Transport => ErrorSeverity::Low,
            ErrorCategory::Notifier => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

/// Error categories for grouping and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Session,
    Notifier,
    Configuration,
}

impl From<serde_json::Error> for ProbeError {
    fn from(error: serde_json::Error) -> Self {
        ProbeError::SerializationError {
            error: error.to_string(),
        }
    }
}

/// Result type for probe engine operations
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_recoverable() {
        assert!(ProbeError::timeout("validate", 700).is_recoverable());
        assert!(ProbeError::network("connection reset").is_recoverable());
        assert!(ProbeError::Status { operation: "validate".into(), status_code: 502 }.is_recoverable());
        assert_eq!(ProbeError::network("x").category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        let err = ProbeError::invalid_config("workers", "must be at least 1");
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: workers - must be at least 1"
        );
    }
}
