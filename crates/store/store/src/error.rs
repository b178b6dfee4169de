use thiserror::Error;

/// Errors that can occur during session store operations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// A storage backend error occurred.
    #[error("session store backend error: {0}")]
    Backend(String),

    /// A session record could not be serialized or deserialized.
    #[error("session serialization error: {0}")]
    Serialization(String),
}
