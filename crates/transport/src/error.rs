use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the transport layer ports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A network or connection-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The remote side did not respond within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A payload could not be serialized for the wire.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(TransportError::Connection("reset".into()).is_retryable());
        assert!(TransportError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!TransportError::Serialization("bad frame".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = TransportError::Connection("reset by peer".into());
        assert_eq!(err.to_string(), "connection error: reset by peer");
    }
}
