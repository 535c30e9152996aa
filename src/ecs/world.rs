//! World wrapper around hecs

use hecs::Entity;

use crate::ai::Agent;
use crate::ecs::{AgentId, Pose};

/// Simulation world containing agents, obstacles, and their components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Agent record, if the agent is still live
    pub fn agent(&self, id: AgentId) -> Option<hecs::Ref<'_, Agent>> {
        self.get::<Agent>(id.0).ok()
    }

    /// Mutable agent record, if the agent is still live
    pub fn agent_mut(&self, id: AgentId) -> Option<hecs::RefMut<'_, Agent>> {
        self.get_mut::<Agent>(id.0).ok()
    }

    /// Copy of an entity's pose
    pub fn pose(&self, entity: Entity) -> Option<Pose> {
        self.get::<Pose>(entity).ok().map(|pose| *pose)
    }

    /// Ids of every agent in the world, in a stable order
    pub fn agent_ids(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self
            .inner
            .query::<&Agent>()
            .iter()
            .map(|(entity, _)| AgentId(entity))
            .collect();
        ids.sort();
        ids
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
