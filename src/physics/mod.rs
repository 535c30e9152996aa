//! Physics and spatial query module
//!
//! Built on top of rapier2d

mod query;
mod world;

pub use query::{Hit, HitKind, SpatialQuery, ray_is_degenerate, segment_is_degenerate};
pub use world::Physics;
