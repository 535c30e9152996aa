//! Spatial queries backed by rapier2d

use glam::Vec2;
use rapier2d::prelude::*;
use rustc_hash::FxHashMap;

use crate::ecs::{AgentId, ObstacleId};
use crate::physics::query::{Hit, HitKind, SpatialQuery, ray_is_degenerate};

/// Radius of an agent's collision circle
const AGENT_RADIUS: f32 = 0.25;

/// Radius of the target's collision circle
const TARGET_RADIUS: f32 = 0.3;

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

/// Top-down physics world used as the spatial query service.
///
/// Agents and the target are kinematic bodies moved by the simulation;
/// walls and obstacle cells are fixed colliders. Queries see the world as of
/// the last `step`.
pub struct Physics {
    /// Physics pipeline
    pipeline: PhysicsPipeline,
    /// Island manager
    island_manager: IslandManager,
    /// Broad phase
    broad_phase: DefaultBroadPhase,
    /// Narrow phase
    narrow_phase: NarrowPhase,
    /// Rigid body set
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,
    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,
    /// CCD solver
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasting
    query_pipeline: QueryPipeline,
    /// Integration parameters
    integration_parameters: IntegrationParameters,
    /// What each collider represents to the AI
    kinds: FxHashMap<ColliderHandle, HitKind>,
    /// Bodies of live agents
    agent_bodies: FxHashMap<AgentId, RigidBodyHandle>,
    /// Colliders of live obstacle cells
    obstacle_colliders: FxHashMap<ObstacleId, ColliderHandle>,
    /// The target's body, once placed
    target_body: Option<RigidBodyHandle>,
}

impl Physics {
    /// Create an empty world with no gravity
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            kinds: FxHashMap::default(),
            agent_bodies: FxHashMap::default(),
            obstacle_colliders: FxHashMap::default(),
            target_body: None,
        }
    }

    /// Step the physics simulation and refresh the query pipeline
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &vector![0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Add a static wall
    pub fn add_wall(&mut self, center: Vec2, half_extents: Vec2) {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .translation(to_vector(center))
            .build();
        let handle = self.collider_set.insert(collider);
        self.kinds.insert(handle, HitKind::Static);
    }

    /// Place or move the pursuit target
    pub fn set_target(&mut self, position: Vec2) {
        if let Some(body) = self.target_body {
            if let Some(rb) = self.rigid_body_set.get_mut(body) {
                rb.set_next_kinematic_translation(to_vector(position));
            }
            return;
        }

        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .build();
        let body = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(TARGET_RADIUS).build();
        let handle =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);
        self.kinds.insert(handle, HitKind::Target);
        self.target_body = Some(body);
    }

    /// Number of colliders the AI can hit
    pub fn collider_count(&self) -> usize {
        self.kinds.len()
    }

    fn remove_collider(&mut self, handle: ColliderHandle) {
        self.kinds.remove(&handle);
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialQuery for Physics {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: Option<f32>,
        exclude: Option<AgentId>,
    ) -> Option<Hit> {
        if ray_is_degenerate(origin, direction) {
            return None;
        }
        let direction = direction.normalize();
        let ray = Ray::new(point![origin.x, origin.y], to_vector(direction));

        let mut filter = QueryFilter::default();
        if let Some(body) = exclude.and_then(|agent| self.agent_bodies.get(&agent)) {
            filter = filter.exclude_rigid_body(*body);
        }

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance.unwrap_or(Real::MAX),
                true,
                filter,
            )
            .map(|(handle, distance)| {
                let point = ray.point_at(distance);
                let kind = self.kinds.get(&handle).copied().unwrap_or(HitKind::Static);
                Hit::new(kind, Vec2::new(point.x, point.y), distance)
            })
    }

    fn insert_agent(&mut self, agent: AgentId, position: Vec2, rotation: f32) {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .rotation(rotation)
            .build();
        let body = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(AGENT_RADIUS).build();
        let handle =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);
        self.kinds.insert(handle, HitKind::Agent(agent));
        self.agent_bodies.insert(agent, body);
    }

    fn insert_obstacle(&mut self, obstacle: ObstacleId, position: Vec2, half_extents: Vec2) {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .translation(to_vector(position))
            .build();
        let handle = self.collider_set.insert(collider);
        self.kinds.insert(handle, HitKind::Obstacle(obstacle));
        self.obstacle_colliders.insert(obstacle, handle);
    }

    fn sync_pose(&mut self, agent: AgentId, position: Vec2, rotation: f32) {
        let Some(body) = self.agent_bodies.get(&agent) else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(*body) {
            rb.set_next_kinematic_position(Isometry::new(to_vector(position), rotation));
        }
    }

    fn remove(&mut self, entity: hecs::Entity) {
        if let Some(body) = self.agent_bodies.remove(&AgentId(entity)) {
            if let Some(rb) = self.rigid_body_set.get(body) {
                for handle in rb.colliders().to_vec() {
                    self.kinds.remove(&handle);
                }
            }
            self.rigid_body_set.remove(
                body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            return;
        }

        if let Some(handle) = self.obstacle_colliders.remove(&ObstacleId(entity)) {
            self.remove_collider(handle);
        }
    }
}
