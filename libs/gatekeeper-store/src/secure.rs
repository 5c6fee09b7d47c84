//! Permission-aware wrapper around an [`EntityStore`].

use gatekeeper::{EntityRef, GateKeeper};
use uuid::Uuid;

use crate::error::SecureStoreError;
use crate::filter::{filter_readable, filter_readable_one};
use crate::include::Include;
use crate::loaded::Loaded;
use crate::store::EntityStore;

/// Wraps an [`EntityStore`] so every read is filtered by the read policy and
/// every write passes its lifecycle checkpoint first.
///
/// The wrapped store always runs with checking disabled.
///
/// | operation       | scoping on                  | scoping off             |
/// |-----------------|-----------------------------|-------------------------|
/// | `find_by_key`   | unreadable → `None`         | unreadable → error      |
/// | `find_first`    | unreadable → `None`         | unreadable → error      |
/// | `find_all`      | unreadable entities dropped | first unreadable errors |
/// | `create` etc.   | denied → error              | denied → error          |
#[derive(Debug, Clone)]
pub struct SecureStore<S> {
    store: S,
    gatekeeper: GateKeeper,
}

type StoreResult<T, S> = Result<T, SecureStoreError<<S as EntityStore>::Error>>;

impl<S: EntityStore> SecureStore<S> {
    #[must_use]
    pub fn new(store: S, gatekeeper: GateKeeper) -> Self {
        Self { store, gatekeeper }
    }

    #[must_use]
    pub fn gatekeeper(&self) -> &GateKeeper {
        &self.gatekeeper
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Fetches by primary key. Absent and (in scoping mode) unreadable both
    /// yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`SecureStoreError::Permission`] when unreadable and scoping is off;
    /// [`SecureStoreError::Store`] when the store fails.
    #[tracing::instrument(skip_all, fields(entity_type = %entity_type, %key))]
    pub async fn find_by_key(
        &self,
        entity_type: &str,
        key: Uuid,
        include: &Include,
    ) -> StoreResult<Option<Loaded>, S> {
        let found = self
            .gatekeeper
            .context()
            .bypass(self.store.fetch_by_key(entity_type, key, include))
            .await
            .map_err(SecureStoreError::Store)?;
        self.readable_one(found)
    }

    /// Fetches several primary keys; a multi-result read.
    ///
    /// # Errors
    ///
    /// See [`find_all`](Self::find_all).
    #[tracing::instrument(skip_all, fields(entity_type = %entity_type, keys = keys.len()))]
    pub async fn find_by_keys(
        &self,
        entity_type: &str,
        keys: &[Uuid],
        include: &Include,
    ) -> StoreResult<Vec<Loaded>, S> {
        let found = self
            .gatekeeper
            .context()
            .bypass(self.store.fetch_by_keys(entity_type, keys, include))
            .await
            .map_err(SecureStoreError::Store)?;
        Ok(filter_readable(&self.gatekeeper, found)?)
    }

    /// Fetches the first match of `criteria`.
    ///
    /// Only scoping mode reports an unreadable first match as `Ok(None)`;
    /// otherwise it raises rather than passing for "no match".
    ///
    /// # Errors
    ///
    /// See [`find_by_key`](Self::find_by_key).
    #[tracing::instrument(skip_all, fields(entity_type = %entity_type))]
    pub async fn find_first(
        &self,
        entity_type: &str,
        criteria: &S::Criteria,
        include: &Include,
    ) -> StoreResult<Option<Loaded>, S> {
        let found = self
            .gatekeeper
            .context()
            .bypass(self.store.fetch_first(entity_type, criteria, include))
            .await
            .map_err(SecureStoreError::Store)?;
        self.readable_one(found)
    }

    /// Fetches every match of `criteria`, keeping store order.
    ///
    /// # Errors
    ///
    /// [`SecureStoreError::Permission`] for the first unreadable entity when
    /// scoping is off; [`SecureStoreError::Store`] when the store fails.
    #[tracing::instrument(skip_all, fields(entity_type = %entity_type))]
    pub async fn find_all(
        &self,
        entity_type: &str,
        criteria: &S::Criteria,
        include: &Include,
    ) -> StoreResult<Vec<Loaded>, S> {
        let found = self
            .gatekeeper
            .context()
            .bypass(self.store.fetch_all(entity_type, criteria, include))
            .await
            .map_err(SecureStoreError::Store)?;
        Ok(filter_readable(&self.gatekeeper, found)?)
    }

    /// Runs the create checkpoint, then inserts.
    ///
    /// # Errors
    ///
    /// [`SecureStoreError::Permission`] when creation is denied;
    /// [`SecureStoreError::Store`] when the store fails.
    #[tracing::instrument(skip_all, fields(entity_type = entity.entity_type()))]
    pub async fn create(&self, entity: EntityRef) -> StoreResult<EntityRef, S> {
        self.gatekeeper.before_create(&entity)?;
        self.gatekeeper
            .context()
            .bypass(self.store.insert(entity))
            .await
            .map_err(SecureStoreError::Store)
    }

    /// Runs the update checkpoint, then saves.
    ///
    /// # Errors
    ///
    /// [`SecureStoreError::Permission`] when the update is denied;
    /// [`SecureStoreError::Store`] when the store fails.
    #[tracing::instrument(skip_all, fields(entity = %entity.describe()))]
    pub async fn update(&self, entity: EntityRef) -> StoreResult<EntityRef, S> {
        self.gatekeeper.before_update(&entity)?;
        self.gatekeeper
            .context()
            .bypass(self.store.update(entity))
            .await
            .map_err(SecureStoreError::Store)
    }

    /// Runs the destroy checkpoint, then deletes.
    ///
    /// # Errors
    ///
    /// [`SecureStoreError::Permission`] when destruction is denied;
    /// [`SecureStoreError::Store`] when the store fails.
    #[tracing::instrument(skip_all, fields(entity = %entity.describe()))]
    pub async fn destroy(&self, entity: EntityRef) -> StoreResult<(), S> {
        self.gatekeeper.before_destroy(&entity)?;
        self.gatekeeper
            .context()
            .bypass(self.store.delete(entity))
            .await
            .map_err(SecureStoreError::Store)
    }

    fn readable_one(&self, found: Option<Loaded>) -> StoreResult<Option<Loaded>, S> {
        match found {
            Some(loaded) => Ok(filter_readable_one(&self.gatekeeper, loaded)?),
            None => Ok(None),
        }
    }
}
