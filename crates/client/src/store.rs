//! In-memory entity cache shared by the console views.
//!
//! The store is created once at startup and passed by reference; it is
//! only written after a backend response resolves.

use std::collections::BTreeMap;

use voe_core::entities::{AiSkill, Camera, ComputeDevice, Deployment, Entity};
use voe_core::types::{EntityId, EntityKind, SymphonyId};

/// One entity family keyed by id.
#[derive(Debug, Clone)]
pub struct EntitySlice<T: Entity> {
    items: BTreeMap<EntityId, T>,
}

impl<T: Entity> Default for EntitySlice<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Entity> EntitySlice<T> {
    /// Replace the whole slice with a fresh list.
    pub fn set_all(&mut self, items: Vec<T>) {
        self.items = items.into_iter().map(|item| (item.id(), item)).collect();
    }

    /// Insert a newly created entity. An existing entry with the same id
    /// is kept.
    pub fn add_one(&mut self, item: T) {
        self.items.entry(item.id()).or_insert(item);
    }

    pub fn upsert_one(&mut self, item: T) {
        self.items.insert(item.id(), item);
    }

    pub fn remove_one(&mut self, id: EntityId) -> Option<T> {
        self.items.remove(&id)
    }

    pub fn remove_many(&mut self, ids: &[EntityId]) {
        for id in ids {
            self.items.remove(id);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn by_symphony_id(&self, symphony_id: &str) -> Option<&T> {
        self.items.values().find(|item| item.symphony_id() == symphony_id)
    }

    /// Entities in id order.
    pub fn all(&self) -> Vec<&T> {
        self.items.values().collect()
    }

    /// Owned copies in id order, for the list filters.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.values().map(|item| item.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub cameras: EntitySlice<Camera>,
    pub compute_devices: EntitySlice<ComputeDevice>,
    pub deployments: EntitySlice<Deployment>,
    pub ai_skills: EntitySlice<AiSkill>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names taken within `kind`, for the wizards' uniqueness check.
    pub fn existing_names(&self, kind: EntityKind) -> Vec<String> {
        match kind {
            EntityKind::Camera => self.cameras.names(),
            EntityKind::ComputeDevice => self.compute_devices.names(),
            EntityKind::Deployment => self.deployments.names(),
            EntityKind::AiSkill => self.ai_skills.names(),
        }
    }

    /// Devices whose symphony id is listed, in the order given. Unknown
    /// ids are skipped.
    pub fn devices_by_symphony_ids(&self, ids: &[SymphonyId]) -> Vec<&ComputeDevice> {
        ids.iter()
            .filter_map(|id| self.compute_devices.by_symphony_id(id))
            .collect()
    }

    /// Whether any deployment runs the skill with this symphony id.
    pub fn skill_in_use(&self, skill_id: &str) -> bool {
        self.deployments
            .all()
            .into_iter()
            .any(|d| d.skill_ids().any(|id| id == skill_id))
    }

    pub fn has_any_configured(&self) -> bool {
        !(self.cameras.is_empty()
            && self.compute_devices.is_empty()
            && self.deployments.is_empty()
            && self.ai_skills.is_empty())
    }

    /// Display name for a camera or skill symphony id.
    pub fn name_of(&self, symphony_id: &str) -> Option<String> {
        self.cameras
            .by_symphony_id(symphony_id)
            .map(|c| c.name.clone())
            .or_else(|| {
                self.ai_skills
                    .by_symphony_id(symphony_id)
                    .map(|s| s.name.clone())
            })
    }

    /// Display name of a deployment's device reference, which is either
    /// the device row id or its symphony id.
    pub fn device_name(&self, reference: &str) -> Option<&str> {
        reference
            .parse::<EntityId>()
            .ok()
            .and_then(|id| self.compute_devices.get(id))
            .or_else(|| self.compute_devices.by_symphony_id(reference))
            .map(|d| d.name.as_str())
    }
}
