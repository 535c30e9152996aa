//! The horde: every agent, driven from one fixed-step loop
//!
//! `Horde` owns the agent world, the simulation clock, the event queue and
//! the deadline schedule. The embedding game owns the spatial query service
//! and the pacing controller and hands them over at construction.
//!
//! # Example
//!
//! ```ignore
//! let mut horde = Horde::new(HordeConfig::default(), physics, ());
//! let agent = horde.spawn(Vec2::new(5.0, 0.0), 0.0);
//!
//! loop {
//!     horde.spatial_mut().step(dt);
//!     horde.update(dt as f64, player_position);
//! }
//! ```

use glam::Vec2;

use crate::ai::follow;
use crate::ai::fsm::{self, Brain, Transition};
use crate::ai::perception;
use crate::ai::steering;
use crate::ai::{Agent, AgentState};
use crate::core::{Deadlines, EventQueue, GameEvent, HordeConfig, Time};
use crate::ecs::{AgentId, Obstacle, ObstacleId, Pose, Velocity, World};
use crate::physics::SpatialQuery;

/// Receives agent deaths for wave pacing.
pub trait PacingController {
    /// Called exactly once per agent, when it dies.
    fn notify_agent_killed(&mut self, agent: AgentId);
}

/// No pacing.
impl PacingController for () {
    fn notify_agent_killed(&mut self, _agent: AgentId) {}
}

/// Delayed work polled from the fixed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheduled {
    ClearHitEffect(AgentId),
    Despawn(AgentId),
}

/// All agents plus the services they run against.
pub struct Horde<S, P> {
    world: World,
    config: HordeConfig,
    time: Time,
    events: EventQueue,
    deadlines: Deadlines<Scheduled>,
    score: u32,
    spatial: S,
    pacing: P,
}

impl<S: SpatialQuery, P: PacingController> Horde<S, P> {
    /// Create an empty horde
    pub fn new(config: HordeConfig, spatial: S, pacing: P) -> Self {
        let time = Time::new(config.fixed_timestep);
        Self {
            world: World::new(),
            config,
            time,
            events: EventQueue::new(),
            deadlines: Deadlines::new(),
            score: 0,
            spatial,
            pacing,
        }
    }

    /// Spawn an idle agent with full health.
    pub fn spawn(&mut self, position: Vec2, heading: f32) -> AgentId {
        let now = self.time.elapsed();
        let entity = self.world.spawn((
            Agent::new(self.config.max_hp, position, now),
            Pose::new(position, heading),
            Velocity::default(),
        ));
        let id = AgentId(entity);
        self.spatial.insert_agent(id, position, heading);
        self.events.push(GameEvent::AgentSpawned {
            agent: id,
            position,
        });
        log::debug!("Spawned {:?} at {}", id, position);
        id
    }

    /// Add a destructible obstacle cell.
    pub fn add_obstacle(&mut self, position: Vec2, half_extents: Vec2) -> ObstacleId {
        let id = ObstacleId(
            self.world
                .spawn((Obstacle { half_extents }, Pose::new(position, 0.0))),
        );
        self.spatial.insert_obstacle(id, position, half_extents);
        id
    }

    /// Remove an obstacle cell without crediting any agent.
    pub fn remove_obstacle(&mut self, obstacle: ObstacleId) -> bool {
        if self.world.get::<Obstacle>(obstacle.entity()).is_err() {
            return false;
        }
        let _ = self.world.despawn(obstacle.entity());
        self.spatial.remove(obstacle.entity());
        true
    }

    /// Register one hit. Hits on dead or despawned agents are ignored.
    pub fn apply_hit(&mut self, agent: AgentId) {
        let now = self.time.elapsed();
        let hp_left = {
            let Some(mut record) = self.world.agent_mut(agent) else {
                return;
            };
            if record.is_dead() {
                return;
            }
            record.hp = record.hp.saturating_sub(1);
            record.hit_effect = true;
            record.hp
        };

        self.events.push(GameEvent::AgentDamaged { agent, hp_left });
        self.events.push(GameEvent::HitEffect {
            agent,
            active: true,
        });
        self.deadlines.schedule(
            now + self.config.hit_effect_seconds,
            Scheduled::ClearHitEffect(agent),
        );

        if hp_left == 0 {
            self.kill(agent);
        }
    }

    /// Push an agent with an external impulse (knockback).
    pub fn apply_impulse(&mut self, agent: AgentId, impulse: Vec2) {
        let alive = self.world.agent(agent).is_some_and(|record| !record.is_dead());
        if !alive {
            return;
        }
        if let Ok(mut velocity) = self.world.get_mut::<Velocity>(agent.entity()) {
            velocity.linear += impulse;
        }
    }

    fn kill(&mut self, agent: AgentId) {
        let now = self.time.elapsed();
        let Some(from) = self.state(agent) else {
            return;
        };

        for (released, previous) in follow::drop_followers(&self.world, agent) {
            if released != agent && previous != AgentState::Idle {
                self.events.push(GameEvent::StateChanged {
                    agent: released,
                    from: previous,
                    to: AgentState::Idle,
                });
            }
        }

        if let Some(mut record) = self.world.agent_mut(agent) {
            record.state = AgentState::Dead;
            record.tracked_obstacle = None;
            record.tracking_blindly_since = None;
        }
        if let Ok(mut velocity) = self.world.get_mut::<Velocity>(agent.entity()) {
            velocity.linear = Vec2::ZERO;
        }
        let position = self
            .world
            .pose(agent.entity())
            .map_or(Vec2::ZERO, |pose| pose.position);

        self.spatial.remove(agent.entity());
        self.pacing.notify_agent_killed(agent);
        self.score += 1;

        self.events.push(GameEvent::StateChanged {
            agent,
            from,
            to: AgentState::Dead,
        });
        self.events.push(GameEvent::AgentKilled { agent, position });
        self.events.push(GameEvent::ScoreChanged { score: self.score });
        self.deadlines.schedule(
            now + self.config.despawn_delay_seconds,
            Scheduled::Despawn(agent),
        );
        log::info!("{:?} killed at {} (score {})", agent, position, self.score);
    }

    /// Feed a variable frame delta and run every fixed tick that falls due.
    ///
    /// Returns the number of ticks run.
    pub fn update(&mut self, frame_dt: f64, target: Vec2) -> u32 {
        let ticks = self.time.advance(frame_dt);
        for _ in 0..ticks {
            self.step(target);
        }
        ticks
    }

    /// Run one fixed tick with the target at `target`.
    pub fn step(&mut self, target: Vec2) {
        self.time.tick();
        let now = self.time.elapsed();
        let dt = self.time.fixed_dt_f32();

        self.run_deadlines(now);

        for id in self.world.agent_ids() {
            if self.world.agent(id).is_none_or(|record| record.is_dead()) {
                continue;
            }

            let (decision, pose) = {
                let brain = Brain {
                    world: &self.world,
                    spatial: &self.spatial,
                    config: &self.config,
                    now,
                    target,
                };
                let los = perception::refresh_target_los(
                    &self.world,
                    &self.spatial,
                    id,
                    target,
                    now,
                    &self.config,
                );
                let decision = brain.decide(id, los);
                match &decision.transition {
                    Transition::None => {}
                    Transition::To(to) => {
                        if let Some(from) = fsm::enter_state(&self.world, id, *to, now) {
                            self.events.push(GameEvent::StateChanged {
                                agent: id,
                                from,
                                to: *to,
                            });
                        }
                    }
                    Transition::Released(released) => {
                        for &(agent, from) in released {
                            if from != AgentState::Idle {
                                self.events.push(GameEvent::StateChanged {
                                    agent,
                                    from,
                                    to: AgentState::Idle,
                                });
                            }
                        }
                    }
                }
                (decision, brain.act(id, dt))
            };

            if let Some(cell) = decision.destroyed {
                self.destroy_obstacle(cell);
            }

            let Some(mut pose) = pose else {
                continue;
            };
            if let Ok(mut velocity) = self.world.get_mut::<Velocity>(id.entity()) {
                steering::drift_and_damp(&mut pose, &mut velocity, self.config.damping, dt);
            }
            if let Ok(mut stored) = self.world.get_mut::<Pose>(id.entity()) {
                *stored = pose;
            }
            self.spatial.sync_pose(id, pose.position, pose.rotation);
        }

        let healed = follow::heal_links(&self.world);
        debug_assert_eq!(healed, 0, "follow graph lost symmetry during a tick");
    }

    fn run_deadlines(&mut self, now: f64) {
        for item in self.deadlines.drain_due(now) {
            match item {
                Scheduled::ClearHitEffect(agent) => {
                    let cleared = self.world.agent_mut(agent).is_some_and(|mut record| {
                        std::mem::replace(&mut record.hit_effect, false)
                    });
                    if cleared {
                        self.events.push(GameEvent::HitEffect {
                            agent,
                            active: false,
                        });
                    }
                }
                Scheduled::Despawn(agent) => {
                    if self.world.despawn(agent.entity()).is_ok() {
                        self.events.push(GameEvent::AgentDespawned { agent });
                        log::debug!("Despawned {:?}", agent);
                    }
                }
            }
        }
    }

    fn destroy_obstacle(&mut self, obstacle: ObstacleId) {
        let Some(pose) = self.world.pose(obstacle.entity()) else {
            return;
        };
        if self.remove_obstacle(obstacle) {
            self.events.push(GameEvent::ObstacleDestroyed {
                obstacle,
                position: pose.position,
            });
            log::debug!("{:?} destroyed at {}", obstacle, pose.position);
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current state of an agent
    pub fn state(&self, agent: AgentId) -> Option<AgentState> {
        self.world.agent(agent).map(|record| record.state)
    }

    /// Leader of an agent
    pub fn leader(&self, agent: AgentId) -> Option<AgentId> {
        self.world.agent(agent).and_then(|record| record.leader)
    }

    /// Followers of an agent
    pub fn followers(&self, agent: AgentId) -> Vec<AgentId> {
        self.world
            .agent(agent)
            .map(|record| record.followers.to_vec())
            .unwrap_or_default()
    }

    /// Remaining hit points
    pub fn hp(&self, agent: AgentId) -> Option<u32> {
        self.world.agent(agent).map(|record| record.hp)
    }

    /// Whether the hit cue is showing
    pub fn hit_effect(&self, agent: AgentId) -> bool {
        self.world.agent(agent).is_some_and(|record| record.hit_effect)
    }

    /// Current pose of an agent or obstacle
    pub fn pose(&self, agent: AgentId) -> Option<Pose> {
        self.world.pose(agent.entity())
    }

    /// Agents that are not dead, in a stable order
    pub fn live_agents(&self) -> Vec<AgentId> {
        self.world
            .agent_ids()
            .into_iter()
            .filter(|&id| self.world.agent(id).is_some_and(|record| !record.is_dead()))
            .collect()
    }

    /// Number of agents in each state, in `AgentState::ALL` order
    pub fn state_counts(&self) -> [(AgentState, usize); 7] {
        let mut counts = AgentState::ALL.map(|state| (state, 0));
        for (_, record) in self.world.query::<&Agent>().iter() {
            if let Some(slot) = counts.iter_mut().find(|(state, _)| *state == record.state) {
                slot.1 += 1;
            }
        }
        counts
    }

    /// Whether an obstacle cell still stands
    pub fn has_obstacle(&self, obstacle: ObstacleId) -> bool {
        self.world.get::<Obstacle>(obstacle.entity()).is_ok()
    }

    /// Kills so far
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Simulated seconds since start
    pub fn now(&self) -> f64 {
        self.time.elapsed()
    }

    pub fn config(&self) -> &HordeConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn spatial(&self) -> &S {
        &self.spatial
    }

    pub fn spatial_mut(&mut self) -> &mut S {
        &mut self.spatial
    }

    pub fn pacing(&self) -> &P {
        &self.pacing
    }

    pub fn pacing_mut(&mut self) -> &mut P {
        &mut self.pacing
    }
}
