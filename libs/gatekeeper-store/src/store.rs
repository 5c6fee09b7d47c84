//! Port to the host's entity store.

use async_trait::async_trait;
use gatekeeper::EntityRef;
use uuid::Uuid;

use crate::include::Include;
use crate::loaded::Loaded;

/// Fetch and write capability the secured store wraps.
///
/// Implementations do no authorization of their own; [`SecureStore`]
/// calls them with checking disabled and applies the policy to what they
/// return.
///
/// [`SecureStore`]: crate::SecureStore
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Store-specific query criteria.
    type Criteria: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches one entity by primary key. `Ok(None)` when absent.
    async fn fetch_by_key(
        &self,
        entity_type: &str,
        key: Uuid,
        include: &Include,
    ) -> Result<Option<Loaded>, Self::Error>;

    /// Fetches several entities by primary key, skipping absent keys.
    async fn fetch_by_keys(
        &self,
        entity_type: &str,
        keys: &[Uuid],
        include: &Include,
    ) -> Result<Vec<Loaded>, Self::Error> {
        let mut found = Vec::with_capacity(keys.len());
        for &key in keys {
            if let Some(loaded) = self.fetch_by_key(entity_type, key, include).await? {
                found.push(loaded);
            }
        }
        Ok(found)
    }

    /// Fetches the first entity matching `criteria`.
    async fn fetch_first(
        &self,
        entity_type: &str,
        criteria: &Self::Criteria,
        include: &Include,
    ) -> Result<Option<Loaded>, Self::Error>;

    /// Fetches every entity matching `criteria`, in store order.
    async fn fetch_all(
        &self,
        entity_type: &str,
        criteria: &Self::Criteria,
        include: &Include,
    ) -> Result<Vec<Loaded>, Self::Error>;

    /// Persists a new entity and returns the stored instance.
    async fn insert(&self, entity: EntityRef) -> Result<EntityRef, Self::Error>;

    /// Saves changes to a stored entity.
    async fn update(&self, entity: EntityRef) -> Result<EntityRef, Self::Error>;

    async fn delete(&self, entity: EntityRef) -> Result<(), Self::Error>;
}
