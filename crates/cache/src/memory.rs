use async_trait::async_trait;
use dashmap::DashMap;

use paraph_core::SessionId;

use crate::cache::{PayloadCache, PayloadUpdate};
use crate::data::CachedSignatureData;
use crate::error::CacheError;

/// In-memory [`PayloadCache`] backed by a [`DashMap`].
///
/// Per-entry atomicity comes from the map's entry guards: an update holds
/// the guard for the duration of the closure, so concurrent updates to the
/// same session are linearized while different sessions proceed in
/// parallel.
#[derive(Debug, Default)]
pub struct MemoryPayloadCache {
    entries: DashMap<String, CachedSignatureData>,
}

impl MemoryPayloadCache {
    /// Create a new, empty payload cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, for housekeeping metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PayloadCache for MemoryPayloadCache {
    async fn put(&self, data: CachedSignatureData) -> Result<(), CacheError> {
        self.entries.insert(data.session_id.to_string(), data);
        Ok(())
    }

    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<CachedSignatureData>, CacheError> {
        Ok(self
            .entries
            .get(session_id.as_str())
            .map(|entry| entry.clone()))
    }

    async fn update_atomic(
        &self,
        session_id: &SessionId,
        update: PayloadUpdate,
    ) -> Result<Option<CachedSignatureData>, CacheError> {
        match self.entries.get_mut(session_id.as_str()) {
            Some(mut entry) => {
                update(&mut entry);
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, session_id: &SessionId) -> Result<bool, CacheError> {
        Ok(self.entries.remove(session_id.as_str()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use chrono::Utc;
    use paraph_core::{CreateSessionRequest, DocumentRef, SignatureSession};

    use super::*;

    fn payload(id: &str) -> CachedSignatureData {
        let mut session = SignatureSession::new(&CreateSessionRequest::new(
            DocumentRef::invoice(format!("inv-{id}")),
            "tablet-1",
            "company-1",
            "Kim Signer",
        ));
        session.session_id = SessionId::new(id);
        CachedSignatureData::new(&session, Bytes::from_static(b"pdf"), "application/pdf")
    }

    #[tokio::test]
    async fn put_get_remove() {
        let cache = MemoryPayloadCache::new();
        let id = SessionId::new("s1");

        assert!(cache.get(&id).await.unwrap().is_none());

        cache.put(payload("s1")).await.unwrap();
        let found = cache.get(&id).await.unwrap().unwrap();
        assert_eq!(found.session_id, id);
        assert!(!found.has_signature());

        assert!(cache.remove(&id).await.unwrap());
        assert!(!cache.remove(&id).await.unwrap());
        assert!(cache.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_returns_new_value() {
        let cache = MemoryPayloadCache::new();
        let id = SessionId::new("s2");
        cache.put(payload("s2")).await.unwrap();

        let signed_at = Utc::now();
        let updated = cache
            .update_atomic(
                &id,
                Box::new(move |data| {
                    data.apply_signature(Bytes::from_static(b"png"), signed_at);
                }),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(updated.has_signature());
        assert_eq!(updated.signed_at, Some(signed_at));

        // The stored entry reflects the update too.
        let stored = cache.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.signature_image, Bytes::from_static(b"png"));
    }

    #[tokio::test]
    async fn update_on_missing_entry_returns_none() {
        let cache = MemoryPayloadCache::new();
        let touched = cache
            .update_atomic(&SessionId::new("ghost"), Box::new(|_| {}))
            .await
            .unwrap();
        assert!(touched.is_none());
    }

    #[tokio::test]
    async fn duplicate_signatures_keep_the_first() {
        let cache = Arc::new(MemoryPayloadCache::new());
        let id = SessionId::new("s3");
        cache.put(payload("s3")).await.unwrap();

        for image in [&b"first"[..], &b"second"[..]] {
            let image = Bytes::copy_from_slice(image);
            cache
                .update_atomic(
                    &id,
                    Box::new(move |data| {
                        data.apply_signature(image, Utc::now());
                    }),
                )
                .await
                .unwrap();
        }

        let stored = cache.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.signature_image, Bytes::from_static(b"first"));
    }

    #[tokio::test]
    async fn concurrent_updates_both_apply() {
        let cache = Arc::new(MemoryPayloadCache::new());
        let id = SessionId::new("s4");
        cache.put(payload("s4")).await.unwrap();

        let cache_a = Arc::clone(&cache);
        let cache_b = Arc::clone(&cache);
        let id_a = id.clone();
        let id_b = id.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move {
                cache_a
                    .update_atomic(
                        &id_a,
                        Box::new(|data| {
                            data.metadata.insert("a".into(), serde_json::Value::Bool(true));
                        }),
                    )
                    .await
                    .unwrap()
            }),
            tokio::spawn(async move {
                cache_b
                    .update_atomic(
                        &id_b,
                        Box::new(|data| {
                            data.metadata.insert("b".into(), serde_json::Value::Bool(true));
                        }),
                    )
                    .await
                    .unwrap()
            }),
        );
        assert!(a.unwrap().is_some());
        assert!(b.unwrap().is_some());

        let stored = cache.get(&id).await.unwrap().unwrap();
        assert!(stored.metadata.contains_key("a"));
        assert!(stored.metadata.contains_key("b"));
    }
}
