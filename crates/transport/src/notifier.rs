use async_trait::async_trait;

use paraph_core::{CompanyId, SessionEvent};

use crate::error::TransportError;

/// Broadcast port towards the desktop clients of a company.
///
/// Events inform workstations about session lifecycle changes; delivery is
/// best-effort and never blocks a session transition.
#[async_trait]
pub trait WorkstationNotifier: Send + Sync {
    /// Broadcast an event to every workstation of a company.
    async fn broadcast(
        &self,
        company_id: &CompanyId,
        event: &SessionEvent,
    ) -> Result<(), TransportError>;
}
