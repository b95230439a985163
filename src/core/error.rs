//! Error types for the consensus engine and sync channel.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the consensus pipeline and sync channel.
#[derive(Error, Debug)]
pub enum Error {
    // Input validation
    #[error("Validation failed: {0}")]
    Validation(String),

    // Secure channel
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Replay rejected: {0}")]
    Replay(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    // Consensus lifecycle
    #[error("Session {0} is held for governance review")]
    GovernanceBlocked(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // Broadcast
    #[error("Delivery to {node} failed: {reason}")]
    Delivery { node: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short classification string recorded as `failure_reason` in audit entries.
    pub fn classification(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Authentication(_) => "authentication_error",
            Error::Replay(_) => "replay_error",
            Error::Integrity(_) => "integrity_error",
            Error::GovernanceBlocked(_) => "governance_blocked",
            Error::SessionNotFound(_) => "session_not_found",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::Delivery { .. } => "delivery_error",
            Error::Serialization(_) => "serialization_error",
            Error::Internal(_) => "internal_error",
            Error::Io(_) => "io_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for Error {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        Error::Authentication("signature verification failed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = Error::Replay("timestamp outside tolerance".to_string());
        assert_eq!(err.classification(), "replay_error");

        let err = Error::Integrity("checksum mismatch".to_string());
        assert_eq!(err.classification(), "integrity_error");
    }

    #[test]
    fn test_display() {
        let err = Error::Validation("at least 2 decisions required".to_string());
        assert!(err.to_string().contains("at least 2 decisions"));
    }

    #[test]
    fn test_from_serde_json() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: Error = bad.unwrap_err().into();
        assert_eq!(err.classification(), "serialization_error");
    }
}
