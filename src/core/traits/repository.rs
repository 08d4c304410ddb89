use async_trait::async_trait;
use uuid::Uuid;

use crate::core::Result;

/// Read-only lookup of an entity referenced by a sale
///
/// Sales hold plain foreign keys to customers, subsidiaries and products.
/// Orchestration resolves each key through one of these before touching the
/// aggregate, and fails the whole operation when a lookup returns `None`.
#[async_trait]
pub trait ReferenceLookup<T>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>>;

    /// Check whether an entity with this ID exists
    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}
