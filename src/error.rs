//! Error types for dealflow.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the failing condition. The taxonomy follows the three ways a command can
//! fail: the input was rejected by validation, the referenced record does
//! not exist, or the backing store (local or remote) failed.

use thiserror::Error;

pub use crate::storage::StoreError;

/// Validation errors raised by the input (form) layer.
///
/// The store never produces these; they are detected before a command
/// reaches it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("'{value}' is not a valid email address")]
    InvalidEmail {
        value: String,
    },

    #[error("Field '{field}' value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Field '{field}' must not be negative (got {value})")]
    NegativeValue {
        field: String,
        value: f64,
    },

    #[error("Field '{field}' must be a finite number (got {value})")]
    NonFinite {
        field: String,
        value: f64,
    },

    #[error("'{value}' is not a valid {field}")]
    InvalidChoice {
        field: String,
        value: String,
    },
}

/// Failures talking to the remote record service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Server error (code {code}): {message}")]
    ServerError {
        code: u16,
        message: String,
    },

    #[error("Failed to serialize request: {message}")]
    SerializationFailed {
        message: String,
    },

    #[error("Failed to deserialize response: {message}")]
    DeserializationFailed {
        message: String,
    },

    #[error("Remote {operation} on table '{table}' was rejected: {message}")]
    Rejected {
        table: String,
        operation: String,
        message: String,
    },
}

/// Command runtime failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Command queue is full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Command runtime disconnected")]
    Disconnected,

    #[error("Command timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Configuration errors (environment or command line).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Required setting '{name}' is not set")]
    MissingSetting {
        name: String,
    },

    #[error("Invalid value '{value}' for '{name}': {reason}")]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Backend '{backend}' is not available in this build (enable the '{feature}' feature)")]
    BackendUnavailable {
        backend: String,
        feature: String,
    },
}

/// Top-level error type for dealflow.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl From<RemoteError> for CrmError {
    fn from(err: RemoteError) -> Self {
        Self::Store(StoreError::Remote(err))
    }
}

impl CrmError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if a referenced record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if the remote record service failed.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Store(StoreError::Remote(_)))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for dealflow operations.
pub type CrmResult<T> = Result<T, CrmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactId;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MissingField {
            field: "first_name".to_string(),
        };
        assert!(err.to_string().contains("first_name"));

        let err = ValidationError::OutOfRange {
            field: "probability".to_string(),
            value: 140.0,
            min: 0.0,
            max: 100.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("probability"));
        assert!(msg.contains("140"));
    }

    #[test]
    fn test_remote_error_message() {
        let err = RemoteError::ServerError {
            code: 503,
            message: "unavailable".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("503"));
        assert!(msg.contains("unavailable"));
    }

    #[test]
    fn test_crm_error_from_validation() {
        let err: CrmError = ValidationError::InvalidEmail {
            value: "nope".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());
        assert!(!err.is_remote());
    }

    #[test]
    fn test_crm_error_not_found() {
        let err: CrmError = StoreError::ContactNotFound(ContactId::new(7)).into();
        assert!(err.is_not_found());
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_crm_error_from_remote() {
        let err: CrmError = RemoteError::ConnectionFailed {
            message: "refused".to_string(),
        }
        .into();
        assert!(err.is_remote());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_crm_error_internal() {
        let err = CrmError::internal("unexpected state");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("unexpected state"));
    }
}
