use serde::{Deserialize, Serialize};

use paraph_core::{CompanyId, TabletId};

/// A registered signature tablet, as known to the tablet registry.
///
/// The registry owns device records; this core only reads them to validate
/// dispatch targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabletDevice {
    /// Device identifier.
    pub tablet_id: TabletId,
    /// Company the device is registered to.
    pub company_id: CompanyId,
    /// Human-readable device label (e.g. `"front desk"`).
    pub label: String,
    /// Whether the registry currently considers the device online.
    pub online: bool,
}

impl TabletDevice {
    /// Create a device record.
    #[must_use]
    pub fn new(
        tablet_id: impl Into<TabletId>,
        company_id: impl Into<CompanyId>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            tablet_id: tablet_id.into(),
            company_id: company_id.into(),
            label: label.into(),
            online: true,
        }
    }

    /// Set the online flag.
    #[must_use]
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }
}
