use std::sync::Arc;

use paraph_blob::BlobStore;
use paraph_cache::PayloadCache;
use paraph_pipeline::{ArtifactPipeline, DocumentRenderer, DocumentStore, PdfLayout};
use paraph_store::SessionStore;
use paraph_transport::{TabletGateway, TabletRegistry, WorkstationNotifier};

use crate::error::OrchestratorError;
use crate::metrics::SessionMetrics;
use crate::orchestrator::SessionOrchestrator;

const DEFAULT_EXTERNAL_URL: &str = "http://localhost:8080";

/// Fluent builder for constructing a [`SessionOrchestrator`] instance.
///
/// Every port (store, cache, registry, tablet gateway, notifier, document
/// store, blob store, renderer) must be supplied. The external URL and the
/// PDF layout have defaults.
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn SessionStore>>,
    cache: Option<Arc<dyn PayloadCache>>,
    registry: Option<Arc<dyn TabletRegistry>>,
    tablets: Option<Arc<dyn TabletGateway>>,
    notifier: Option<Arc<dyn WorkstationNotifier>>,
    documents: Option<Arc<dyn DocumentStore>>,
    blobs: Option<Arc<dyn BlobStore>>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    external_url: Option<String>,
    layout: PdfLayout,
}

impl OrchestratorBuilder {
    /// Create a new builder with all fields unset.
    pub fn new() -> Self {
        Self {
            store: None,
            cache: None,
            registry: None,
            tablets: None,
            notifier: None,
            documents: None,
            blobs: None,
            renderer: None,
            external_url: None,
            layout: PdfLayout::default(),
        }
    }

    /// Set the session store implementation.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the payload cache implementation.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn PayloadCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the tablet registry used for company-scoped lookups.
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn TabletRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the gateway that talks to the physical tablets.
    #[must_use]
    pub fn tablets(mut self, tablets: Arc<dyn TabletGateway>) -> Self {
        self.tablets = Some(tablets);
        self
    }

    /// Set the notifier that broadcasts lifecycle events to workstations.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn WorkstationNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the store holding the business documents being signed.
    #[must_use]
    pub fn documents(mut self, documents: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Set the blob store where signed artifacts are published.
    #[must_use]
    pub fn blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Set the renderer that turns documents into PDF renditions.
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Set the public base URL under which retrieval handles are minted.
    ///
    /// Defaults to `http://localhost:8080`; a trailing slash is stripped.
    #[must_use]
    pub fn external_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = Some(url.into());
        self
    }

    /// Set the page layout used when rendering PDF artifacts.
    #[must_use]
    pub fn pdf_layout(mut self, layout: PdfLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Consume the builder and produce a configured [`SessionOrchestrator`].
    ///
    /// Returns an [`OrchestratorError::Configuration`] if a required port
    /// has not been set.
    pub fn build(self) -> Result<SessionOrchestrator, OrchestratorError> {
        let store = self
            .store
            .ok_or_else(|| OrchestratorError::Configuration("session store is required".into()))?;
        let cache = self
            .cache
            .ok_or_else(|| OrchestratorError::Configuration("payload cache is required".into()))?;
        let registry = self
            .registry
            .ok_or_else(|| OrchestratorError::Configuration("tablet registry is required".into()))?;
        let tablets = self
            .tablets
            .ok_or_else(|| OrchestratorError::Configuration("tablet gateway is required".into()))?;
        let notifier = self.notifier.ok_or_else(|| {
            OrchestratorError::Configuration("workstation notifier is required".into())
        })?;
        let documents = self
            .documents
            .ok_or_else(|| OrchestratorError::Configuration("document store is required".into()))?;
        let blobs = self
            .blobs
            .ok_or_else(|| OrchestratorError::Configuration("blob store is required".into()))?;
        let renderer = self.renderer.ok_or_else(|| {
            OrchestratorError::Configuration("document renderer is required".into())
        })?;

        let external_url = self
            .external_url
            .unwrap_or_else(|| DEFAULT_EXTERNAL_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let pipeline = ArtifactPipeline::new(documents, blobs, renderer).with_layout(self.layout);

        Ok(SessionOrchestrator {
            store,
            cache,
            registry,
            tablets,
            notifier,
            pipeline,
            metrics: Arc::new(SessionMetrics::default()),
            external_url,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
