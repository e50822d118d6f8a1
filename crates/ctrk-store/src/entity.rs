//! Entity directory.
//!
//! Entities are onboarded elsewhere; the tracker keeps a read-mostly copy
//! so rule evaluation and recommendations can look them up by id.

use ctrk_core::{Entity, EntityId, TrackerError, TrackerResult};

use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct EntityDirectory {
    records: Store<Entity>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. Ids are never reused.
    pub fn register(&self, entity: Entity) -> TrackerResult<Entity> {
        if entity.name.trim().is_empty() {
            return Err(TrackerError::validation("entity name must not be empty"));
        }
        if !self.records.insert_new(entity.clone()) {
            return Err(TrackerError::illegal(format!(
                "entity {} is already registered",
                entity.id
            )));
        }
        tracing::info!(
            entity_id = %entity.id,
            entity_type = %entity.entity_type,
            "entity registered"
        );
        Ok(entity)
    }

    pub fn get(&self, id: &EntityId) -> TrackerResult<Entity> {
        self.records
            .get(id)
            .ok_or_else(|| TrackerError::not_found(EntityId::KIND, id))
    }

    pub fn list(&self) -> Vec<Entity> {
        self.records.list()
    }

    pub fn hydrate(&self, records: Vec<Entity>) {
        self.records.replace_all(records);
    }

    pub fn snapshot(&self) -> Vec<Entity> {
        self.records.list()
    }
}
