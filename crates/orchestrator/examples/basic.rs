//! Basic example: a full signature flow over in-memory backends with mock
//! tablet, notifier and rendering ports.
//!
//! Run with: `cargo run -p paraph-orchestrator --example basic`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;

use paraph_blob::{BlobError, BlobMetadata, BlobStore};
use paraph_cache::MemoryPayloadCache;
use paraph_core::{
    CompanyId, CreateSessionRequest, DocumentRef, ProgressEvent, SessionEvent, SessionId,
    SignatureRequest, TabletId,
};
use paraph_orchestrator::OrchestratorBuilder;
use paraph_pipeline::{
    AttachmentRecord, BusinessDocument, DocumentRenderer, DocumentStore, PdfLayout, PipelineError,
    RenderVariant,
};
use paraph_store_memory::MemorySessionStore;
use paraph_transport::{
    TabletDevice, TabletGateway, TabletRegistry, TransportError, WorkstationNotifier,
};

/// Registry with a single tablet at the shop entrance.
struct DemoRegistry;

#[async_trait]
impl TabletRegistry for DemoRegistry {
    async fn find(
        &self,
        tablet_id: &TabletId,
        company_id: &CompanyId,
    ) -> Result<Option<TabletDevice>, TransportError> {
        if tablet_id.as_str() == "tablet-entrance" && company_id.as_str() == "company-1" {
            Ok(Some(TabletDevice::new(
                tablet_id.clone(),
                company_id.clone(),
                "entrance",
            )))
        } else {
            Ok(None)
        }
    }
}

/// Tablet that accepts every request and prints what it receives.
struct DemoTablet;

#[async_trait]
impl TabletGateway for DemoTablet {
    async fn is_reachable(&self, _tablet_id: &TabletId) -> Result<bool, TransportError> {
        Ok(true)
    }

    async fn send_request(
        &self,
        tablet_id: &TabletId,
        request: &SignatureRequest,
        document: Bytes,
    ) -> Result<bool, TransportError> {
        println!(
            "  [tablet {tablet_id}] showing {} ({} bytes) to {}",
            request.document_label,
            document.len(),
            request.signer_name
        );
        Ok(true)
    }

    async fn notify_cancelled(
        &self,
        tablet_id: &TabletId,
        session_id: &SessionId,
    ) -> Result<(), TransportError> {
        println!("  [tablet {tablet_id}] session {session_id} cancelled, clearing screen");
        Ok(())
    }
}

/// Notifier that prints each broadcast to stdout.
struct DemoNotifier;

#[async_trait]
impl WorkstationNotifier for DemoNotifier {
    async fn broadcast(
        &self,
        company_id: &CompanyId,
        event: &SessionEvent,
    ) -> Result<(), TransportError> {
        let label = match event {
            SessionEvent::Started { .. } => "started",
            SessionEvent::Completed { .. } => "completed",
            SessionEvent::Cancelled { .. } => "cancelled",
            SessionEvent::Failed { .. } => "failed",
        };
        println!("  [workstations of {company_id}] session {} {label}", event.session_id());
        Ok(())
    }
}

/// Document store that fabricates an invoice for any reference.
struct DemoDocuments;

#[async_trait]
impl DocumentStore for DemoDocuments {
    async fn fetch(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<BusinessDocument>, PipelineError> {
        Ok(Some(BusinessDocument::new(
            document.clone(),
            document.id(),
            1480.00,
            "EUR",
        )))
    }

    async fn replace_attachment(
        &self,
        document: &DocumentRef,
        attachment: AttachmentRecord,
    ) -> Result<(), PipelineError> {
        println!("  [documents] {document} now carries attachment {}", attachment.storage_id);
        Ok(())
    }
}

#[derive(Default)]
struct DemoBlobs {
    blobs: Mutex<HashMap<String, Bytes>>,
}

#[async_trait]
impl BlobStore for DemoBlobs {
    async fn store(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobMetadata, BlobError> {
        let storage_id = format!("blob-{}", self.blobs.lock().unwrap().len() + 1);
        self.blobs
            .lock()
            .unwrap()
            .insert(storage_id.clone(), data.clone());
        Ok(BlobMetadata {
            storage_id,
            filename: filename.to_owned(),
            content_type: content_type.to_owned(),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        })
    }

    async fn retrieve(&self, storage_id: &str) -> Result<Option<Bytes>, BlobError> {
        Ok(self.blobs.lock().unwrap().get(storage_id).cloned())
    }

    async fn delete(&self, storage_id: &str) -> Result<bool, BlobError> {
        Ok(self.blobs.lock().unwrap().remove(storage_id).is_some())
    }
}

/// Renderer that produces stand-in HTML and PDF bytes.
struct DemoRenderer;

#[async_trait]
impl DocumentRenderer for DemoRenderer {
    async fn render_html(
        &self,
        document: &BusinessDocument,
        variant: &RenderVariant,
    ) -> Result<String, PipelineError> {
        let suffix = match variant {
            RenderVariant::Unsigned => String::new(),
            RenderVariant::Signed { signer_name, .. } => format!(", signed by {signer_name}"),
        };
        Ok(format!(
            "<html>Invoice {} over {} {}{suffix}</html>",
            document.number, document.total_amount, document.currency
        ))
    }

    async fn html_to_pdf(&self, html: &str, _layout: PdfLayout) -> Result<Bytes, PipelineError> {
        Ok(Bytes::from(format!("%PDF-1.4 {html}")))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let orchestrator = OrchestratorBuilder::new()
        .store(Arc::new(MemorySessionStore::new()))
        .cache(Arc::new(MemoryPayloadCache::new()))
        .registry(Arc::new(DemoRegistry))
        .tablets(Arc::new(DemoTablet))
        .notifier(Arc::new(DemoNotifier))
        .documents(Arc::new(DemoDocuments))
        .blobs(Arc::new(DemoBlobs::default()))
        .renderer(Arc::new(DemoRenderer))
        .external_url("https://erp.example.test")
        .build()
        .expect("failed to build orchestrator");

    let company = CompanyId::new("company-1");
    let signature = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG demo signature");

    // Scenario 1: a signature flow from dispatch to artifacts
    println!("=== Scenario 1: Sign an invoice ===");
    let document = DocumentRef::invoice("2024-00017");
    let request = CreateSessionRequest::new(
        document.clone(),
        "tablet-entrance",
        "company-1",
        "Alex Kunde",
    )
    .with_signature_title("Goods received")
    .with_created_by("erp-user-7")
    .with_replace_attachment(true);

    let created = orchestrator
        .create_session(request)
        .await
        .expect("dispatch failed");
    println!("  Session {} expires at {}", created.session_id, created.expires_at);

    // The signer opens the document and starts drawing.
    orchestrator
        .process_progress_event(&created.session_id, ProgressEvent::DocumentOpened)
        .await
        .unwrap();
    orchestrator
        .process_progress_event(&created.session_id, ProgressEvent::SigningStarted)
        .await
        .unwrap();

    let report = orchestrator
        .session_status(&created.session_id, &company, &document)
        .await
        .unwrap();
    println!("  Status while signing: {}", report.status);

    // The tablet reports the finished signature as base64.
    let acknowledged = orchestrator
        .handle_signature_callback(&created.session_id, &signature)
        .await;
    println!("  Callback acknowledged: {acknowledged}");

    let report = orchestrator
        .session_status(&created.session_id, &company, &document)
        .await
        .unwrap();
    println!("  Status after signing: {}", report.status);
    if let Some(handles) = report.handles {
        println!("  Signed document at: {}", handles.signed_document);
        println!("  Signature image at: {}", handles.signature_image);
    }

    let artifact = orchestrator
        .signed_document(&created.session_id, &company, &document)
        .await
        .unwrap()
        .expect("signed document should be available");
    println!("  Downloaded {} ({} bytes)", artifact.filename, artifact.data.len());
    println!();

    // Scenario 2: cancellation wins over a late callback
    println!("=== Scenario 2: Cancel before the customer signs ===");
    let document = DocumentRef::invoice("2024-00018");
    let request = CreateSessionRequest::new(
        document.clone(),
        "tablet-entrance",
        "company-1",
        "Alex Kunde",
    );

    let created = orchestrator
        .create_session(request)
        .await
        .expect("dispatch failed");
    orchestrator
        .cancel_session(
            &created.session_id,
            &company,
            &document,
            "erp-user-7",
            "customer changed their mind",
        )
        .await
        .unwrap();

    let late = orchestrator
        .handle_signature_callback(&created.session_id, &signature)
        .await;
    println!("  Late callback acknowledged: {late}");

    let report = orchestrator
        .session_status(&created.session_id, &company, &document)
        .await
        .unwrap();
    println!("  Final status: {}", report.status);
    println!();

    // Print metrics
    let snap = orchestrator.metrics().snapshot();
    println!("=== Orchestrator Metrics ===");
    println!("  Sessions created:    {}", snap.sessions_created);
    println!("  Callbacks completed: {}", snap.callbacks_completed);
    println!("  Callbacks rejected:  {}", snap.callbacks_rejected);
    println!("  Sessions cancelled:  {}", snap.sessions_cancelled);
    println!("  Artifact failures:   {}", snap.artifact_failures);
}
