//! Input collaborators of a pipeline run.

use crate::error::{CatalogError, HelpdeskError};
use crate::shared::{HelpdeskRequest, ServiceCatalog};

/// Provides the initial list of helpdesk requests.
#[async_trait::async_trait]
pub trait RequestSource: Send + Sync {
    async fn fetch_requests(&self) -> Result<Vec<HelpdeskRequest>, HelpdeskError>;
}

/// Provides the validated Service Catalog.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<ServiceCatalog, CatalogError>;
}
