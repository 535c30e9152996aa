//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod world;

pub use components::{AgentId, Obstacle, ObstacleId, Pose, Velocity};
pub use world::World;
