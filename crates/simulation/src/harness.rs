use std::sync::Arc;

use base64::Engine;

use paraph_cache::MemoryPayloadCache;
use paraph_core::{CompanyId, CreateSessionRequest, DocumentRef, SessionId};
use paraph_orchestrator::{OrchestratorBuilder, OrchestratorError, SessionOrchestrator};
use paraph_pipeline::BusinessDocument;
use paraph_store_memory::MemorySessionStore;
use paraph_transport::TabletDevice;

use crate::backends::{SimulatedBlobs, SimulatedDocuments, SimulatedRegistry, SimulatedRenderer};
use crate::notifier::RecordingNotifier;
use crate::tablet::SimulatedTablet;

/// The bytes [`encoded_signature`] encodes.
pub const SIGNATURE_BYTES: &[u8] = b"\x89PNG simulated signature stroke";

/// A small valid base64 signature payload, as a tablet would send it.
#[must_use]
pub fn encoded_signature() -> String {
    base64::engine::general_purpose::STANDARD.encode(SIGNATURE_BYTES)
}

/// A real orchestrator wired to simulated backends, with direct access to
/// every backend for assertions.
///
/// The default world contains one company, one online tablet and one
/// invoice; [`SimulationHarness::builder`] extends it.
pub struct SimulationHarness {
    /// The orchestrator under test.
    pub orchestrator: SessionOrchestrator,
    /// Authoritative session records.
    pub store: Arc<MemorySessionStore>,
    /// In-flight payloads.
    pub cache: Arc<MemoryPayloadCache>,
    /// Registered devices.
    pub registry: Arc<SimulatedRegistry>,
    /// The scripted tablet endpoint.
    pub tablet: Arc<SimulatedTablet>,
    /// Captured workstation broadcasts.
    pub notifier: Arc<RecordingNotifier>,
    /// Business documents being signed.
    pub documents: Arc<SimulatedDocuments>,
    /// Published artifacts.
    pub blobs: Arc<SimulatedBlobs>,
    /// The placeholder renderer.
    pub renderer: Arc<SimulatedRenderer>,
}

impl SimulationHarness {
    /// Company the default world belongs to.
    pub const COMPANY: &'static str = "company-1";
    /// Tablet registered in the default world.
    pub const TABLET: &'static str = "tablet-entrance";
    /// Invoice present in the default world.
    pub const INVOICE: &'static str = "inv-1001";

    /// Start a harness over the default world.
    pub fn start() -> Result<Self, OrchestratorError> {
        Self::builder().build()
    }

    /// Start building a harness with a customized world.
    #[must_use]
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::new()
    }

    /// Company id of the default world.
    #[must_use]
    pub fn company(&self) -> CompanyId {
        CompanyId::new(Self::COMPANY)
    }

    /// Document reference of the default invoice.
    #[must_use]
    pub fn invoice(&self) -> DocumentRef {
        DocumentRef::invoice(Self::INVOICE)
    }

    /// A creation request against the default world.
    #[must_use]
    pub fn default_request(&self) -> CreateSessionRequest {
        CreateSessionRequest::new(self.invoice(), Self::TABLET, Self::COMPANY, "Alex Kunde")
            .with_signature_title("Goods received")
            .with_created_by("clerk-7")
    }

    /// Report a signature for `session_id` the way a tablet would.
    ///
    /// Returns the acknowledgement the tablet would receive.
    pub async fn submit_signature(&self, session_id: &SessionId) -> bool {
        self.orchestrator
            .handle_signature_callback(session_id, &encoded_signature())
            .await
    }
}

/// Builder for a [`SimulationHarness`] with a customized world.
pub struct HarnessBuilder {
    devices: Vec<TabletDevice>,
    documents: Vec<BusinessDocument>,
    external_url: String,
}

impl HarnessBuilder {
    /// A builder preloaded with the default world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: vec![TabletDevice::new(
                SimulationHarness::TABLET,
                SimulationHarness::COMPANY,
                "entrance",
            )],
            documents: vec![BusinessDocument::new(
                DocumentRef::invoice(SimulationHarness::INVOICE),
                "2024-01001",
                1480.0,
                "EUR",
            )],
            external_url: "https://sign.simulated.test".to_owned(),
        }
    }

    /// Register another tablet.
    #[must_use]
    pub fn device(mut self, device: TabletDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Add another business document.
    #[must_use]
    pub fn document(mut self, document: BusinessDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Override the public base URL used for retrieval handles.
    #[must_use]
    pub fn external_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = url.into();
        self
    }

    /// Wire the world together.
    pub fn build(self) -> Result<SimulationHarness, OrchestratorError> {
        let store = Arc::new(MemorySessionStore::new());
        let cache = Arc::new(MemoryPayloadCache::new());
        let registry = Arc::new(SimulatedRegistry::new());
        let tablet = Arc::new(SimulatedTablet::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let documents = Arc::new(SimulatedDocuments::new());
        let blobs = Arc::new(SimulatedBlobs::new());
        let renderer = Arc::new(SimulatedRenderer::new());

        for device in self.devices {
            registry.upsert(device);
        }
        for document in self.documents {
            documents.insert(document);
        }

        let orchestrator = OrchestratorBuilder::new()
            .store(Arc::clone(&store))
            .cache(Arc::clone(&cache))
            .registry(Arc::clone(&registry))
            .tablets(Arc::clone(&tablet))
            .notifier(Arc::clone(&notifier))
            .documents(Arc::clone(&documents))
            .blobs(Arc::clone(&blobs))
            .renderer(Arc::clone(&renderer))
            .external_url(self.external_url)
            .build()?;

        Ok(SimulationHarness {
            orchestrator,
            store,
            cache,
            registry,
            tablet,
            notifier,
            documents,
            blobs,
            renderer,
        })
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_world_dispatches_a_session() {
        let sim = SimulationHarness::start().expect("harness should start");

        let created = sim
            .orchestrator
            .create_session(sim.default_request())
            .await
            .expect("dispatch should succeed");

        assert_eq!(sim.tablet.dispatches().len(), 1);
        assert!(sim.submit_signature(&created.session_id).await);
    }

    #[test]
    fn encoded_signature_is_valid_base64() {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded_signature())
            .unwrap();
        assert_eq!(decoded, SIGNATURE_BYTES);
    }
}
