use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a stored blob (file attachment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Unique storage identifier assigned by the backend.
    pub storage_id: String,
    /// Original filename.
    pub filename: String,
    /// MIME content type (e.g. `"application/pdf"`).
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// When the blob was stored.
    pub created_at: DateTime<Utc>,
}
