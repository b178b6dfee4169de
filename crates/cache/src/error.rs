use thiserror::Error;

/// Errors that can occur during payload cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache backend error occurred.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A payload could not be serialized or deserialized.
    #[error("payload serialization error: {0}")]
    Serialization(String),
}
