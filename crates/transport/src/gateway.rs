use async_trait::async_trait;
use bytes::Bytes;

use paraph_core::{SessionId, SignatureRequest, TabletId};

use crate::error::TransportError;

/// Thin port over the transport layer that talks to one tablet.
///
/// The core treats dispatch as fire-and-forget with a boolean success
/// signal and performs no retries itself; retry policy, if any, belongs to
/// the transport layer behind this trait.
#[async_trait]
pub trait TabletGateway: Send + Sync {
    /// Whether the tablet currently holds a live connection.
    async fn is_reachable(&self, tablet_id: &TabletId) -> Result<bool, TransportError>;

    /// Push a signature request and the document bytes to a tablet.
    ///
    /// Returns `Ok(true)` when the tablet accepted the request, `Ok(false)`
    /// when it refused or silently dropped it. Transport failures surface
    /// as errors; callers treat both the same way.
    async fn send_request(
        &self,
        tablet_id: &TabletId,
        request: &SignatureRequest,
        document: Bytes,
    ) -> Result<bool, TransportError>;

    /// Tell the tablet an open session was cancelled so it can drop the
    /// signing screen. Best-effort.
    async fn notify_cancelled(
        &self,
        tablet_id: &TabletId,
        session_id: &SessionId,
    ) -> Result<(), TransportError>;
}
