//! Common ECS components

use glam::Vec2;
use hecs::Entity;

/// Stable identity of an agent.
///
/// Wraps a generational entity handle, so a reference kept after the agent is
/// despawned can never alias a newer agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub Entity);

impl AgentId {
    /// Get the underlying entity
    #[must_use]
    pub const fn entity(self) -> Entity {
        self.0
    }
}

/// Stable identity of a destructible obstacle cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub Entity);

impl ObstacleId {
    /// Get the underlying entity
    #[must_use]
    pub const fn entity(self) -> Entity {
        self.0
    }
}

/// 2D pose: position plus heading in radians.
///
/// Heading 0 faces +X; positive angles turn counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Position in world space
    pub position: Vec2,
    /// Heading in radians
    pub rotation: f32,
}

impl Pose {
    /// Create a pose from position and heading
    #[must_use]
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Unit vector the agent moves along
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    /// Unit vector to the agent's left
    #[must_use]
    pub fn up(&self) -> Vec2 {
        self.forward().perp()
    }
}

/// Velocity from external impulses (e.g. bullet knockback)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec2,
}

/// A destructible obstacle cell that agents may tear down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Half extents of the cell
    pub half_extents: Vec2,
}
