//! Spatial query contract consumed by the AI
//!
//! The AI never touches the physics engine directly. It asks a `SpatialQuery`
//! for the nearest thing along a ray or segment and gets back a tagged `Hit`.

use glam::Vec2;

use crate::ecs::{AgentId, ObstacleId};

/// What a ray or segment ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitKind {
    /// The pursuit target (the player)
    Target,
    /// Another agent
    Agent(AgentId),
    /// A destructible obstacle cell
    Obstacle(ObstacleId),
    /// Walls and any other static scenery
    Static,
}

/// Nearest intersection along a cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// What was hit
    pub kind: HitKind,
    /// The point of intersection
    pub point: Vec2,
    /// Distance from the cast origin
    pub distance: f32,
}

impl Hit {
    /// Create a hit
    #[must_use]
    pub fn new(kind: HitKind, point: Vec2, distance: f32) -> Self {
        Self {
            kind,
            point,
            distance,
        }
    }
}

/// Point-in-time spatial queries against the physics world.
///
/// Casts must resolve only the nearest intersection. `exclude` names the
/// casting agent, whose own shape must never be reported. Body bookkeeping
/// hooks default to no-ops for services that track bodies themselves.
pub trait SpatialQuery {
    /// Cast a ray from `origin` along `direction`, up to `max_distance` if given.
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: Option<f32>,
        exclude: Option<AgentId>,
    ) -> Option<Hit>;

    /// Cast a segment from `from` to `to`.
    fn cast_segment(&self, from: Vec2, to: Vec2, exclude: Option<AgentId>) -> Option<Hit> {
        let delta = to - from;
        if segment_is_degenerate(from, to) {
            return None;
        }
        self.cast_ray(from, delta / delta.length(), Some(delta.length()), exclude)
    }

    /// A new agent body exists at `position`.
    fn insert_agent(&mut self, _agent: AgentId, _position: Vec2, _rotation: f32) {}

    /// A new obstacle cell exists at `position`.
    fn insert_obstacle(&mut self, _obstacle: ObstacleId, _position: Vec2, _half_extents: Vec2) {}

    /// An agent moved.
    fn sync_pose(&mut self, _agent: AgentId, _position: Vec2, _rotation: f32) {}

    /// Remove the collision shape of a dead agent or destroyed obstacle.
    fn remove(&mut self, _entity: hecs::Entity) {}
}

/// Check a ray for non-finite or zero-length input.
#[must_use]
pub fn ray_is_degenerate(origin: Vec2, direction: Vec2) -> bool {
    !origin.is_finite() || !direction.is_finite() || direction.length_squared() <= f32::EPSILON
}

/// Check a segment for non-finite or coincident endpoints.
#[must_use]
pub fn segment_is_degenerate(from: Vec2, to: Vec2) -> bool {
    ray_is_degenerate(from, to - from)
}
