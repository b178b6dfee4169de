use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use paraph_core::{SessionId, SignatureRequest, TabletId};
use paraph_transport::{TabletGateway, TransportError};

/// One dispatch captured by a [`SimulatedTablet`].
#[derive(Debug, Clone)]
pub struct CapturedDispatch {
    /// The tablet the request was pushed to.
    pub tablet_id: TabletId,
    /// The wire request as the tablet saw it.
    pub request: SignatureRequest,
    /// Size of the document payload that came with it.
    pub document_bytes: usize,
}

/// Scripted tablet endpoint.
///
/// Records every dispatch and cancellation. Reachability, acceptance and the
/// link itself can be flipped at any point to model devices going away
/// mid-flow.
#[derive(Debug, Default)]
pub struct SimulatedTablet {
    unreachable: AtomicBool,
    refusing: AtomicBool,
    link_down: AtomicBool,
    dispatches: Mutex<Vec<CapturedDispatch>>,
    refusals: Mutex<Vec<SessionId>>,
    cancellations: Mutex<Vec<SessionId>>,
}

impl SimulatedTablet {
    /// A tablet that is reachable and accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reachability probes report the tablet as gone.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make the tablet refuse incoming signature requests.
    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Make every transport call fail with a connection error.
    pub fn set_link_down(&self, down: bool) {
        self.link_down.store(down, Ordering::SeqCst);
    }

    /// All dispatches captured so far, in order.
    #[must_use]
    pub fn dispatches(&self) -> Vec<CapturedDispatch> {
        self.dispatches.lock().clone()
    }

    /// Sessions the tablet turned away while refusing.
    #[must_use]
    pub fn refusals(&self) -> Vec<SessionId> {
        self.refusals.lock().clone()
    }

    /// Sessions the tablet was told to clear from its screen.
    #[must_use]
    pub fn cancellations(&self) -> Vec<SessionId> {
        self.cancellations.lock().clone()
    }

    fn check_link(&self) -> Result<(), TransportError> {
        if self.link_down.load(Ordering::SeqCst) {
            return Err(TransportError::Connection("simulated link failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TabletGateway for SimulatedTablet {
    async fn is_reachable(&self, _tablet_id: &TabletId) -> Result<bool, TransportError> {
        self.check_link()?;
        Ok(!self.unreachable.load(Ordering::SeqCst))
    }

    async fn send_request(
        &self,
        tablet_id: &TabletId,
        request: &SignatureRequest,
        document: Bytes,
    ) -> Result<bool, TransportError> {
        self.check_link()?;
        if self.refusing.load(Ordering::SeqCst) {
            debug!(tablet_id = %tablet_id, session_id = %request.session_id, "refusing dispatch");
            self.refusals.lock().push(request.session_id.clone());
            return Ok(false);
        }
        debug!(
            tablet_id = %tablet_id,
            session_id = %request.session_id,
            bytes = document.len(),
            "dispatch captured"
        );
        self.dispatches.lock().push(CapturedDispatch {
            tablet_id: tablet_id.clone(),
            request: request.clone(),
            document_bytes: document.len(),
        });
        Ok(true)
    }

    async fn notify_cancelled(
        &self,
        _tablet_id: &TabletId,
        session_id: &SessionId,
    ) -> Result<(), TransportError> {
        self.check_link()?;
        debug!(session_id = %session_id, "cancellation received");
        self.cancellations.lock().push(session_id.clone());
        Ok(())
    }
}
