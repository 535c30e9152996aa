//! Top-down zombie horde AI
//!
//! This crate provides:
//! - A per-agent finite state machine (idle, pursuit, tracking, destruction)
//! - Line-of-sight perception through an injected spatial query service
//! - A leader/follower graph with bounded walks and cascading release
//! - A rapier2d-backed spatial query service
//! - A fixed-step horde coordinator built on hecs

pub mod ai;
pub mod core;
pub mod ecs;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier2d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        Agent, AgentState, Horde, LosClass, PacingController, SpawnPoint, WavePacer,
    };
    pub use crate::core::{ConfigError, EventQueue, GameEvent, HordeConfig, Time};
    pub use crate::ecs::{AgentId, ObstacleId, Pose, Velocity, World};
    pub use crate::physics::{Hit, HitKind, Physics, SpatialQuery};
    pub use glam::Vec2;
}
