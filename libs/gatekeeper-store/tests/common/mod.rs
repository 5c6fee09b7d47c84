#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use gatekeeper::entity::downcast;
use gatekeeper::test_support::{Database, Row};
use gatekeeper::{Entity, EntityRef, GateKeeper};
use gatekeeper_store::{EntityStore, Include, Loaded};
use parking_lot::Mutex;
use uuid::Uuid;

/// Criteria understood by [`MemoryStore`].
#[derive(Debug, Clone)]
pub enum Criteria {
    All,
    FieldEq(&'static str, String),
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("{0} is not a row of this store")]
    ForeignEntity(String),
    #[error("{0} is already stored")]
    AlreadyStored(String),
    #[error("{0} not found")]
    NotFound(String),
}

/// [`EntityStore`] over the in-memory fixture database.
///
/// Records whether checking was enabled each time it was called.
#[derive(Clone)]
pub struct MemoryStore {
    db: Database,
    gatekeeper: GateKeeper,
    checking_seen: Arc<Mutex<Vec<bool>>>,
}

impl MemoryStore {
    pub fn new(db: Database, gatekeeper: GateKeeper) -> Self {
        Self {
            db,
            gatekeeper,
            checking_seen: Arc::default(),
        }
    }

    pub fn checking_seen(&self) -> Vec<bool> {
        self.checking_seen.lock().clone()
    }

    fn observe(&self) {
        let checking = self.gatekeeper.context().is_checking_enabled();
        self.checking_seen.lock().push(checking);
    }

    fn row(entity: &EntityRef) -> Result<&Row, MemoryError> {
        let row = downcast::<Row>(entity.as_ref());
        row.ok_or_else(|| MemoryError::ForeignEntity(entity.describe()))
    }

    fn matches(entity: &EntityRef, criteria: &Criteria) -> bool {
        match criteria {
            Criteria::All => true,
            Criteria::FieldEq(name, value) => downcast::<Row>(entity.as_ref())
                .and_then(|row| row.field(name))
                .is_some_and(|field| &field == value),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    type Criteria = Criteria;
    type Error = MemoryError;

    async fn fetch_by_key(
        &self,
        entity_type: &str,
        key: Uuid,
        include: &Include,
    ) -> Result<Option<Loaded>, MemoryError> {
        self.observe();
        Ok(self
            .db
            .find(entity_type, key)
            .map(|entity| Loaded::eager(entity, include)))
    }

    async fn fetch_first(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        include: &Include,
    ) -> Result<Option<Loaded>, MemoryError> {
        self.observe();
        Ok(self
            .db
            .all(entity_type)
            .into_iter()
            .find(|entity| Self::matches(entity, criteria))
            .map(|entity| Loaded::eager(entity, include)))
    }

    async fn fetch_all(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        include: &Include,
    ) -> Result<Vec<Loaded>, MemoryError> {
        self.observe();
        Ok(self
            .db
            .all(entity_type)
            .into_iter()
            .filter(|entity| Self::matches(entity, criteria))
            .map(|entity| Loaded::eager(entity, include))
            .collect())
    }

    async fn insert(&self, entity: EntityRef) -> Result<EntityRef, MemoryError> {
        self.observe();
        if entity.id().is_some() {
            return Err(MemoryError::AlreadyStored(entity.describe()));
        }
        let record = Self::row(&entity)?
            .record()
            .ok_or_else(|| MemoryError::NotFound(entity.describe()))?;
        Ok(self.db.insert(record))
    }

    async fn update(&self, entity: EntityRef) -> Result<EntityRef, MemoryError> {
        self.observe();
        let record = Self::row(&entity)?
            .record()
            .ok_or_else(|| MemoryError::NotFound(entity.describe()))?;
        if entity.id().is_none() || !self.db.update(record) {
            return Err(MemoryError::NotFound(entity.describe()));
        }
        Ok(entity)
    }

    async fn delete(&self, entity: EntityRef) -> Result<(), MemoryError> {
        self.observe();
        let id = entity
            .id()
            .ok_or_else(|| MemoryError::NotFound(entity.describe()))?;
        if self.db.delete(entity.entity_type(), id) {
            Ok(())
        } else {
            Err(MemoryError::NotFound(entity.describe()))
        }
    }
}
