use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;
use crate::types::BlobMetadata;

/// Pluggable blob storage backend for document attachments.
///
/// Implementors provide the actual storage mechanism (e.g. S3, GCS,
/// filesystem). Paraph does not ship a built-in implementation; users bring
/// their own.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob and return its metadata.
    ///
    /// The store assigns a unique storage id.
    async fn store(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobMetadata, BlobError>;

    /// Retrieve a blob's content by storage id.
    ///
    /// Returns `None` if the blob does not exist.
    async fn retrieve(&self, storage_id: &str) -> Result<Option<Bytes>, BlobError>;

    /// Delete a blob by storage id. Returns `true` if the blob existed.
    async fn delete(&self, storage_id: &str) -> Result<bool, BlobError>;
}
