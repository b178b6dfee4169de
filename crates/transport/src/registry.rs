use async_trait::async_trait;

use paraph_core::{CompanyId, TabletId};

use crate::device::TabletDevice;
use crate::error::TransportError;

/// Read-only view of the tablet registry.
///
/// Lookups are always scoped by company: a tablet registered to another
/// company is reported as missing rather than forbidden.
#[async_trait]
pub trait TabletRegistry: Send + Sync {
    /// Look up a tablet by id within a company. Returns `None` if the
    /// tablet is unknown or belongs to a different company.
    async fn find(
        &self,
        tablet_id: &TabletId,
        company_id: &CompanyId,
    ) -> Result<Option<TabletDevice>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SingleTabletRegistry {
        device: TabletDevice,
    }

    #[async_trait]
    impl TabletRegistry for SingleTabletRegistry {
        async fn find(
            &self,
            tablet_id: &TabletId,
            company_id: &CompanyId,
        ) -> Result<Option<TabletDevice>, TransportError> {
            let device = &self.device;
            let matches =
                &device.tablet_id == tablet_id && &device.company_id == company_id;
            Ok(matches.then(|| device.clone()))
        }
    }

    #[tokio::test]
    async fn lookup_is_company_scoped() {
        let registry = SingleTabletRegistry {
            device: TabletDevice::new("tab-1", "company-1", "front desk"),
        };

        let found = registry
            .find(&TabletId::new("tab-1"), &CompanyId::new("company-1"))
            .await
            .unwrap();
        assert!(found.is_some());

        let found = registry
            .find(&TabletId::new("tab-1"), &CompanyId::new("company-2"))
            .await
            .unwrap();
        assert!(found.is_none(), "foreign company must not see the tablet");
    }
}
