use async_trait::async_trait;

use paraph_core::SessionId;

use crate::data::CachedSignatureData;
use crate::error::CacheError;

/// An update applied to a cached payload inside [`PayloadCache::update_atomic`].
///
/// Updates must be short and CPU-only; the cache may hold a per-entry lock
/// while one runs, so never perform I/O inside.
pub type PayloadUpdate = Box<dyn FnOnce(&mut CachedSignatureData) + Send>;

/// Volatile store for the binary payloads of in-flight sessions.
///
/// All mutation of an existing entry goes through [`update_atomic`], which
/// serializes concurrent writers per key; readers never observe a
/// half-written entry. Implementations must be `Send + Sync`.
///
/// [`update_atomic`]: PayloadCache::update_atomic
#[async_trait]
pub trait PayloadCache: Send + Sync {
    /// Insert a payload, replacing any previous entry for the session.
    async fn put(&self, data: CachedSignatureData) -> Result<(), CacheError>;

    /// Fetch a snapshot of the payload. Returns `None` if absent.
    async fn get(&self, session_id: &SessionId)
        -> Result<Option<CachedSignatureData>, CacheError>;

    /// Apply `update` to the current payload in one indivisible step and
    /// return the updated value, or `None` if no entry exists.
    async fn update_atomic(
        &self,
        session_id: &SessionId,
        update: PayloadUpdate,
    ) -> Result<Option<CachedSignatureData>, CacheError>;

    /// Remove the payload. Returns `true` if an entry existed.
    async fn remove(&self, session_id: &SessionId) -> Result<bool, CacheError>;
}
