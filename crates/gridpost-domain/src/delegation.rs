use async_trait::async_trait;

use crate::error::DomainResult;
use crate::types::{DelegatedProcess, GridArea, Receiver};

/// Master-data lookup for configured delegation relationships. Implemented
/// outside this crate (master data service client); injected into the
/// enqueue service.
///
/// A lookup failure must surface as an error: falling back silently to the
/// original receiver would misdeliver documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DelegationResolver: Send + Sync {
    /// The actor currently delegated to receive documents of `process` in
    /// `grid_area` on behalf of `delegated_by`, if such a delegation is
    /// active.
    async fn active_delegation(
        &self,
        delegated_by: Receiver,
        process: DelegatedProcess,
        grid_area: Option<GridArea>,
    ) -> DomainResult<Option<Receiver>>;
}
