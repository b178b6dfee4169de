use paraph_core::SessionStatus;
use thiserror::Error;

/// Errors that can occur during session orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// An error occurred in the session store.
    #[error("store error: {0}")]
    Store(#[from] paraph_store::SessionStoreError),

    /// An error occurred in the payload cache.
    #[error("cache error: {0}")]
    Cache(#[from] paraph_cache::CacheError),

    /// An error occurred in the artifact pipeline.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] paraph_pipeline::PipelineError),

    /// The target tablet is not registered, belongs to another company,
    /// or is not reachable right now.
    #[error("tablet unavailable: {0}")]
    TabletUnavailable(String),

    /// The tablet was reachable but refused or dropped the signature request.
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    /// No session exists for the given identifier within the caller's company.
    #[error("session not found")]
    SessionNotFound,

    /// The session exists but belongs to a different document than the one
    /// named in the request.
    #[error("session does not belong to the requested document")]
    SessionDocumentMismatch,

    /// The requested transition is not allowed from the session's current state.
    #[error("invalid state for this operation: {0}")]
    InvalidState(SessionStatus),

    /// The signature payload could not be decoded.
    #[error("invalid signature payload: {0}")]
    InvalidSignaturePayload(String),

    /// The orchestrator was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl OrchestratorError {
    /// Whether the operation may succeed if retried against the same session.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Cache(_) | Self::TabletUnavailable(_) | Self::DispatchFailed(_)
        )
    }
}
