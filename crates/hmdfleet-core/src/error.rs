//! Error types for fleet coordination

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure establishing a session to a single device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Invalid device address: {address}")]
    InvalidAddress { address: String },

    #[error("Authentication failed")]
    AuthFailure,

    #[error("Device unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("A session for {address} is already registered")]
    AlreadyRegistered { address: String },
}

impl ConnectError {
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn already_registered(address: impl Into<String>) -> Self {
        Self::AlreadyRegistered {
            address: address.into(),
        }
    }
}

/// Failure of a single operation against a connected device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("Device unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Device is busy")]
    DeviceBusy,

    #[error("Operation not supported by this device: {operation}")]
    Unsupported { operation: String },

    #[error("Operation timed out")]
    Timeout,
}

impl OpError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Whether retrying later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, OpError::DeviceBusy | OpError::Timeout)
    }
}

/// Precondition violation detected before any device is contacted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("No application is installed on every connected device")]
    NoCommonApps,

    #[error("No application is currently selected")]
    EmptySelection,
}

/// Coordinator error types organized by layer
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection store error: {message}")]
    Store { message: String },

    // ─────────────────────────────────────────────────────────────
    // Domain Errors
    // ─────────────────────────────────────────────────────────────
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Check if this error is a precondition failure (nothing was contacted)
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::Precondition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_display() {
        let err = ConnectError::already_registered("10.0.0.7");
        assert_eq!(
            err.to_string(),
            "A session for 10.0.0.7 is already registered"
        );

        let err = ConnectError::invalid_address("not-an-address");
        assert!(err.to_string().contains("not-an-address"));
    }

    #[test]
    fn test_op_error_display() {
        assert_eq!(OpError::Timeout.to_string(), "Operation timed out");

        let err = OpError::unreachable("connection reset");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_op_error_is_transient() {
        assert!(OpError::Timeout.is_transient());
        assert!(OpError::DeviceBusy.is_transient());
        assert!(!OpError::unreachable("gone").is_transient());
        assert!(!OpError::unsupported("record").is_transient());
    }

    #[test]
    fn test_precondition_error_wraps() {
        let err: Error = PreconditionError::NoCommonApps.into();
        assert!(err.is_precondition());

        let err: Error = ConnectError::AuthFailure.into();
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::config("test");
        let _ = Error::store("test");
    }
}
