//! Scripted collaborators for AI tests

use std::cell::Cell;

use glam::Vec2;

use crate::ai::PacingController;
use crate::ecs::{AgentId, ObstacleId};
use crate::physics::{Hit, SpatialQuery, segment_is_degenerate};

type RayFn = Box<dyn Fn(Vec2, Vec2, Option<f32>, Option<AgentId>) -> Option<Hit>>;
type SegmentFn = Box<dyn Fn(Vec2, Vec2, Option<AgentId>) -> Option<Hit>>;

/// Spatial query service answering from closures.
///
/// Rays miss unless scripted. Segments fall back to the ray script.
pub struct StubSpatial {
    ray: RayFn,
    segment: Option<SegmentFn>,
    ray_calls: Cell<usize>,
    segment_calls: Cell<usize>,
    pub removed: Vec<hecs::Entity>,
    pub inserted_agents: Vec<AgentId>,
    pub inserted_obstacles: Vec<ObstacleId>,
    pub synced: usize,
}

impl StubSpatial {
    pub fn new() -> Self {
        Self {
            ray: Box::new(|_, _, _, _| None),
            segment: None,
            ray_calls: Cell::new(0),
            segment_calls: Cell::new(0),
            removed: Vec::new(),
            inserted_agents: Vec::new(),
            inserted_obstacles: Vec::new(),
            synced: 0,
        }
    }

    pub fn with_ray(
        mut self,
        ray: impl Fn(Vec2, Vec2, Option<f32>, Option<AgentId>) -> Option<Hit> + 'static,
    ) -> Self {
        self.set_ray(ray);
        self
    }

    pub fn with_segment(
        mut self,
        segment: impl Fn(Vec2, Vec2, Option<AgentId>) -> Option<Hit> + 'static,
    ) -> Self {
        self.set_segment(segment);
        self
    }

    pub fn set_ray(
        &mut self,
        ray: impl Fn(Vec2, Vec2, Option<f32>, Option<AgentId>) -> Option<Hit> + 'static,
    ) {
        self.ray = Box::new(ray);
    }

    pub fn set_segment(
        &mut self,
        segment: impl Fn(Vec2, Vec2, Option<AgentId>) -> Option<Hit> + 'static,
    ) {
        self.segment = Some(Box::new(segment));
    }

    pub fn ray_calls(&self) -> usize {
        self.ray_calls.get()
    }

    pub fn segment_calls(&self) -> usize {
        self.segment_calls.get()
    }
}

impl SpatialQuery for StubSpatial {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: Option<f32>,
        exclude: Option<AgentId>,
    ) -> Option<Hit> {
        self.ray_calls.set(self.ray_calls.get() + 1);
        (self.ray)(origin, direction, max_distance, exclude)
    }

    fn cast_segment(&self, from: Vec2, to: Vec2, exclude: Option<AgentId>) -> Option<Hit> {
        self.segment_calls.set(self.segment_calls.get() + 1);
        if segment_is_degenerate(from, to) {
            return None;
        }
        match &self.segment {
            Some(segment) => segment(from, to, exclude),
            None => {
                let delta = to - from;
                (self.ray)(from, delta.normalize(), Some(delta.length()), exclude)
            }
        }
    }

    fn insert_agent(&mut self, agent: AgentId, _position: Vec2, _rotation: f32) {
        self.inserted_agents.push(agent);
    }

    fn insert_obstacle(&mut self, obstacle: ObstacleId, _position: Vec2, _half_extents: Vec2) {
        self.inserted_obstacles.push(obstacle);
    }

    fn sync_pose(&mut self, _agent: AgentId, _position: Vec2, _rotation: f32) {
        self.synced += 1;
    }

    fn remove(&mut self, entity: hecs::Entity) {
        self.removed.push(entity);
    }
}

/// Pacing controller that records every kill notification.
#[derive(Debug, Default)]
pub struct KillLog {
    pub kills: Vec<AgentId>,
}

impl PacingController for KillLog {
    fn notify_agent_killed(&mut self, agent: AgentId) {
        self.kills.push(agent);
    }
}
