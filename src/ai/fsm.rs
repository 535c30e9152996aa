//! Per-agent finite state machine
//!
//! Each fixed tick an agent gets one `decide` (at most one transition, given
//! its fresh or cached [`LosClass`]) followed by one `act` (the movement of
//! whatever state it ended up in).
//!
//! | From              | To                                        |
//! |-------------------|-------------------------------------------|
//! | Idle              | Pursuing, PursuingBlindly, TrackingBlindly, Destruction |
//! | Pursuing          | PursuingBlindly, Tracking, TrackingBlindly |
//! | PursuingBlindly   | Pursuing, Idle, TrackingBlindly           |
//! | Tracking          | Pursuing, Idle                            |
//! | TrackingBlindly   | Pursuing, PursuingBlindly, Idle (release) |
//! | Destruction       | Pursuing, PursuingBlindly, TrackingBlindly, Idle |

use std::fmt;

use glam::Vec2;

use crate::ai::follow;
use crate::ai::perception::{self, SweepOutcome};
use crate::ai::steering::{self, Steer};
use crate::ai::{Agent, AgentState, LosClass};
use crate::core::HordeConfig;
use crate::ecs::{AgentId, ObstacleId, Pose, World};
use crate::physics::{HitKind, SpatialQuery};

// ============================================================================
// Transition
// ============================================================================

/// Represents a state transition decision.
pub enum Transition {
    /// Stay in the current state.
    None,
    /// Move to a new state.
    To(AgentState),
    /// The agent released itself and its follower subtree back to `Idle`.
    Released(Vec<(AgentId, AgentState)>),
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::None => write!(f, "Transition::None"),
            Transition::To(state) => write!(f, "Transition::To({})", state.name()),
            Transition::Released(agents) => write!(f, "Transition::Released({})", agents.len()),
        }
    }
}

/// Outcome of one `decide` call.
#[derive(Debug)]
pub struct Decision {
    pub transition: Transition,
    /// Obstacle the agent finished tearing down this tick
    pub destroyed: Option<ObstacleId>,
}

impl Decision {
    fn stay() -> Self {
        Self::from(Transition::None)
    }

    fn to(state: AgentState) -> Self {
        Self::from(Transition::To(state))
    }
}

impl From<Transition> for Decision {
    fn from(transition: Transition) -> Self {
        Self {
            transition,
            destroyed: None,
        }
    }
}

// ============================================================================
// Brain
// ============================================================================

/// Everything an agent's state machine reads during one tick.
pub struct Brain<'a, S> {
    pub world: &'a World,
    pub spatial: &'a S,
    pub config: &'a HordeConfig,
    /// Simulation time of this tick
    pub now: f64,
    /// Where the target is this tick
    pub target: Vec2,
}

impl<S: SpatialQuery> Brain<'_, S> {
    /// Evaluate the agent's current state once.
    pub fn decide(&self, id: AgentId, los: LosClass) -> Decision {
        let Some((state, leader)) = self.world.agent(id).map(|a| (a.state, a.leader)) else {
            return Decision::stay();
        };
        // A stale `Tracking` classification without a leader carries nothing.
        let los = if los == LosClass::Tracking && leader.is_none() {
            LosClass::None
        } else {
            los
        };

        match state {
            AgentState::Idle => self.decide_idle(id, los),
            AgentState::Pursuing => match los {
                LosClass::Target => Decision::stay(),
                LosClass::Pursuing => Decision::to(AgentState::PursuingBlindly),
                LosClass::Tracking => Decision::to(AgentState::TrackingBlindly),
                LosClass::None => Decision::to(AgentState::Tracking),
            },
            AgentState::PursuingBlindly => match los {
                LosClass::Target => Decision::to(AgentState::Pursuing),
                LosClass::Pursuing => Decision::stay(),
                LosClass::Tracking => Decision::to(AgentState::TrackingBlindly),
                LosClass::None => Decision::to(AgentState::Idle),
            },
            AgentState::Tracking => self.decide_tracking(id, los),
            AgentState::TrackingBlindly => self.decide_tracking_blindly(id, los),
            AgentState::Destruction => self.decide_destruction(id, los),
            AgentState::Dead => Decision::stay(),
        }
    }

    fn decide_idle(&self, id: AgentId, los: LosClass) -> Decision {
        match los {
            LosClass::Target => return Decision::to(AgentState::Pursuing),
            LosClass::Pursuing => return Decision::to(AgentState::PursuingBlindly),
            LosClass::Tracking => return Decision::to(AgentState::TrackingBlindly),
            LosClass::None => {}
        }

        let last_sweep = self.world.agent(id).and_then(|a| a.last_sweep_at);
        if !Agent::is_due(last_sweep, self.now, self.config.seconds_between_sweeps) {
            return Decision::stay();
        }
        let Some(pose) = self.world.pose(id.entity()) else {
            return Decision::stay();
        };

        let rays = perception::cast_sweep(
            self.spatial,
            id,
            pose.position,
            pose.rotation,
            self.config.sweep_casts,
            self.config.sweep_range,
        );
        let outcome = perception::resolve_sweep(self.world, id, &rays, self.config.max_follow_hops);

        if let Some(mut record) = self.world.agent_mut(id) {
            record.last_sweep_at = Some(self.now);
        }

        match outcome {
            SweepOutcome::Target => {
                if let Some(mut record) = self.world.agent_mut(id) {
                    record.last_seen_target = Some(self.target);
                }
                Decision::to(AgentState::Pursuing)
            }
            SweepOutcome::Follow(leader) => {
                if follow::add_follower(self.world, leader, id) {
                    Decision::to(AgentState::TrackingBlindly)
                } else {
                    Decision::stay()
                }
            }
            SweepOutcome::Obstacle(cell) => {
                if let Some(mut record) = self.world.agent_mut(id) {
                    record.tracked_obstacle = Some(cell);
                }
                Decision::to(AgentState::Destruction)
            }
            SweepOutcome::Wander { heading } => {
                if let Some(mut record) = self.world.agent_mut(id) {
                    record.idle_heading = Some(heading);
                }
                Decision::stay()
            }
        }
    }

    fn decide_tracking(&self, id: AgentId, los: LosClass) -> Decision {
        if matches!(los, LosClass::Target | LosClass::Pursuing) {
            return Decision::to(AgentState::Pursuing);
        }

        let last_seen = self.world.agent(id).and_then(|a| a.last_seen_target);
        let (Some(last_seen), Some(pose)) = (last_seen, self.world.pose(id.entity())) else {
            return Decision::to(AgentState::Idle);
        };

        let blocked = self
            .spatial
            .cast_segment(pose.position, last_seen, Some(id))
            .is_some_and(|hit| hit.kind != HitKind::Target);
        if blocked || pose.position.distance(last_seen) < self.config.arrival_radius {
            return Decision::to(AgentState::Idle);
        }
        Decision::stay()
    }

    fn decide_tracking_blindly(&self, id: AgentId, los: LosClass) -> Decision {
        let Some((leader, since)) = self
            .world
            .agent(id)
            .map(|a| (a.leader, a.tracking_blindly_since))
        else {
            return Decision::stay();
        };

        let leader_state = leader.and_then(|l| self.world.agent(l).map(|a| a.state));
        let (Some(leader), Some(leader_state)) = (leader, leader_state) else {
            return self.release(id, "leader is gone");
        };
        if matches!(leader_state, AgentState::Idle | AgentState::Dead) {
            return self.release(id, "leader gave up");
        }

        let since = match since {
            Some(since) => since,
            None => {
                if let Some(mut record) = self.world.agent_mut(id) {
                    record.tracking_blindly_since = Some(self.now);
                }
                self.now
            }
        };
        if self.now - since >= self.config.max_tracking_blindly_seconds {
            return self.release(id, "followed blindly for too long");
        }

        match los {
            LosClass::Target => {
                self.detach(id, leader);
                return Decision::to(AgentState::Pursuing);
            }
            LosClass::Pursuing => {
                self.detach(id, leader);
                return Decision::to(AgentState::PursuingBlindly);
            }
            LosClass::Tracking | LosClass::None => {}
        }

        let (Some(pose), Some(leader_pose)) = (
            self.world.pose(id.entity()),
            self.world.pose(leader.entity()),
        ) else {
            return self.release(id, "leader has no pose");
        };

        let Some(hit) = self
            .spatial
            .cast_segment(pose.position, leader_pose.position, Some(id))
        else {
            return self.release(id, "lost sight of leader");
        };
        match hit.kind {
            HitKind::Agent(other) if other == leader => Decision::stay(),
            HitKind::Agent(other)
                if other != id
                    && follow::is_worth_following(self.world, other, self.config.max_follow_hops)
                    && follow::add_follower(self.world, other, id) =>
            {
                log::debug!("{:?} switched leader {:?} -> {:?}", id, leader, other);
                Decision::stay()
            }
            _ => self.release(id, "lost sight of leader"),
        }
    }

    fn decide_destruction(&self, id: AgentId, los: LosClass) -> Decision {
        match los {
            LosClass::Target => return Decision::to(AgentState::Pursuing),
            LosClass::Pursuing => return Decision::to(AgentState::PursuingBlindly),
            LosClass::Tracking => return Decision::to(AgentState::TrackingBlindly),
            LosClass::None => {}
        }

        let Some((cell, anchor_time)) = self
            .world
            .agent(id)
            .map(|a| (a.tracked_obstacle, a.last_moved_at))
        else {
            return Decision::stay();
        };
        let cell_pose = cell.and_then(|cell| self.world.pose(cell.entity()));
        let (Some(cell), Some(cell_pose), Some(pose)) =
            (cell, cell_pose, self.world.pose(id.entity()))
        else {
            return Decision::to(AgentState::Idle);
        };

        let stuck = self.now - anchor_time >= self.config.stuck_seconds;
        if stuck || pose.position.distance(cell_pose.position) < self.config.arrival_radius {
            return Decision {
                transition: Transition::To(AgentState::Idle),
                destroyed: Some(cell),
            };
        }
        Decision::stay()
    }

    fn detach(&self, id: AgentId, leader: AgentId) {
        follow::remove_follower(self.world, leader, id);
        if let Some(mut record) = self.world.agent_mut(id) {
            record.tracking_blindly_since = None;
        }
    }

    fn release(&self, id: AgentId, reason: &str) -> Decision {
        log::debug!("{:?} releasing follow subtree: {}", id, reason);
        Decision::from(Transition::Released(follow::drop_followers(self.world, id)))
    }

    /// Move the agent for its current state and return its new pose.
    pub fn act(&self, id: AgentId, dt: f32) -> Option<Pose> {
        let (state, last_seen, leader, cell, idle_heading) = {
            let a = self.world.agent(id)?;
            (
                a.state,
                a.last_seen_target,
                a.leader,
                a.tracked_obstacle,
                a.idle_heading,
            )
        };
        let mut pose = self.world.pose(id.entity())?;

        let fast = |to: Option<Vec2>| {
            to.and_then(|to| {
                Steer::towards(
                    pose.position,
                    to,
                    self.config.pursuit_turn_rate,
                    self.config.fast_speed,
                )
            })
        };
        let steer = match state {
            AgentState::Pursuing | AgentState::PursuingBlindly => fast(Some(self.target)),
            AgentState::Tracking => fast(last_seen),
            AgentState::TrackingBlindly => {
                fast(leader.and_then(|l| self.world.pose(l.entity())).map(|p| p.position))
            }
            AgentState::Destruction => {
                fast(cell.and_then(|c| self.world.pose(c.entity())).map(|p| p.position))
            }
            AgentState::Idle => Some(Steer {
                heading: idle_heading.unwrap_or(pose.rotation),
                turn_rate: self.config.idle_turn_rate,
                speed: self.config.slow_speed,
            }),
            AgentState::Dead => return None,
        };

        match steer {
            Some(steer) => steer.apply(&mut pose, dt),
            None => steering::advance(&mut pose, self.config.fast_speed, dt),
        }

        if let Ok(mut stored) = self.world.get_mut::<Pose>(id.entity()) {
            *stored = pose;
        }
        if let Some(mut record) = self.world.agent_mut(id) {
            if pose.position.distance(record.movement_anchor) > self.config.stuck_distance {
                record.movement_anchor = pose.position;
                record.last_moved_at = self.now;
            }
        }
        Some(pose)
    }
}

/// Apply a state change with its entry and exit bookkeeping.
///
/// Returns the previous state if the state actually changed. `Dead` is
/// terminal and is never left.
pub fn enter_state(world: &World, id: AgentId, to: AgentState, now: f64) -> Option<AgentState> {
    let position = world.pose(id.entity()).map(|pose| pose.position);
    let mut record = world.agent_mut(id)?;
    let from = record.state;
    if from == to || from == AgentState::Dead {
        return None;
    }

    if from == AgentState::TrackingBlindly {
        record.tracking_blindly_since = None;
    }
    if from == AgentState::Destruction {
        record.tracked_obstacle = None;
    }

    match to {
        AgentState::TrackingBlindly => record.tracking_blindly_since = Some(now),
        AgentState::Destruction => {
            if let Some(position) = position {
                record.movement_anchor = position;
            }
            record.last_moved_at = now;
        }
        _ => {}
    }

    record.state = to;
    Some(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::StubSpatial;
    use crate::ecs::Obstacle;
    use crate::physics::Hit;

    fn spawn(world: &mut World, state: AgentState, position: Vec2) -> AgentId {
        let mut agent = Agent::new(2, position, 0.0);
        agent.state = state;
        AgentId(world.spawn((agent, Pose::new(position, 0.0))))
    }

    fn brain<'a>(
        world: &'a World,
        spatial: &'a StubSpatial,
        config: &'a HordeConfig,
        now: f64,
    ) -> Brain<'a, StubSpatial> {
        Brain {
            world,
            spatial,
            config,
            now,
            target: Vec2::new(20.0, 0.0),
        }
    }

    fn decide_to(decision: Decision) -> Option<AgentState> {
        match decision.transition {
            Transition::To(state) => Some(state),
            _ => None,
        }
    }

    /// Classify a target line blocked by `blocker`, adopting it if it tracks.
    fn blocked_by(world: &World, me: AgentId, blocker: AgentId) -> LosClass {
        let point = world.pose(blocker.entity()).unwrap().position;
        let hit = Hit::new(HitKind::Agent(blocker), point, point.length());
        perception::classify_target_hit(world, me, Vec2::new(20.0, 0.0), Some(hit), 16)
    }

    #[test]
    fn test_idle_table() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Idle, Vec2::ZERO);
        let leader = spawn(&mut world, AgentState::Tracking, Vec2::new(2.0, 0.0));

        {
            let b = brain(&world, &stub, &config, 1.0);
            assert_eq!(
                decide_to(b.decide(me, LosClass::Target)),
                Some(AgentState::Pursuing)
            );
            assert_eq!(
                decide_to(b.decide(me, LosClass::Pursuing)),
                Some(AgentState::PursuingBlindly)
            );
        }
        // Line-of-sight answers never fall through to a sweep.
        assert_eq!(stub.ray_calls(), 0);

        assert_eq!(blocked_by(&world, me, leader), LosClass::Tracking);
        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(
            decide_to(b.decide(me, LosClass::Tracking)),
            Some(AgentState::TrackingBlindly)
        );
        assert_eq!(world.agent(me).unwrap().leader, Some(leader));
        assert_eq!(stub.ray_calls(), 0);
    }

    #[test]
    fn test_pursuers_fall_in_behind_tracking_blocker() {
        for state in [AgentState::Pursuing, AgentState::PursuingBlindly] {
            let mut world = World::new();
            let config = HordeConfig::default();
            let stub = StubSpatial::new();
            let me = spawn(&mut world, state, Vec2::ZERO);
            let leader = spawn(&mut world, AgentState::Tracking, Vec2::new(2.0, 0.0));

            let los = blocked_by(&world, me, leader);
            assert_eq!(los, LosClass::Tracking);

            let b = brain(&world, &stub, &config, 1.0);
            assert_eq!(
                decide_to(b.decide(me, los)),
                Some(AgentState::TrackingBlindly),
                "from {state}"
            );
            assert_eq!(world.agent(leader).unwrap().followers.as_slice(), &[me]);
        }
    }

    #[test]
    fn test_pursuing_table() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Pursuing, Vec2::ZERO);
        let b = brain(&world, &stub, &config, 1.0);

        assert_eq!(decide_to(b.decide(me, LosClass::Target)), None);
        assert_eq!(
            decide_to(b.decide(me, LosClass::Pursuing)),
            Some(AgentState::PursuingBlindly)
        );
        assert_eq!(
            decide_to(b.decide(me, LosClass::None)),
            Some(AgentState::Tracking)
        );
    }

    #[test]
    fn test_pursuing_blindly_table() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::PursuingBlindly, Vec2::ZERO);
        let b = brain(&world, &stub, &config, 1.0);

        assert_eq!(
            decide_to(b.decide(me, LosClass::Target)),
            Some(AgentState::Pursuing)
        );
        assert_eq!(decide_to(b.decide(me, LosClass::Pursuing)), None);
        assert_eq!(decide_to(b.decide(me, LosClass::None)), Some(AgentState::Idle));
    }

    #[test]
    fn test_tracking_los_without_leader_is_ignored() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Pursuing, Vec2::ZERO);
        let b = brain(&world, &stub, &config, 1.0);

        assert_eq!(
            decide_to(b.decide(me, LosClass::Tracking)),
            Some(AgentState::Tracking)
        );
    }

    #[test]
    fn test_tracking_gives_up_when_blocked() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new()
            .with_segment(|from, _, _| Some(Hit::new(HitKind::Static, from, 0.5)));
        let me = spawn(&mut world, AgentState::Tracking, Vec2::ZERO);
        world.agent_mut(me).unwrap().last_seen_target = Some(Vec2::new(5.0, 0.0));

        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(decide_to(b.decide(me, LosClass::None)), Some(AgentState::Idle));
    }

    #[test]
    fn test_tracking_continues_then_arrives() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Tracking, Vec2::ZERO);
        world.agent_mut(me).unwrap().last_seen_target = Some(Vec2::new(5.0, 0.0));

        {
            let b = brain(&world, &stub, &config, 1.0);
            assert_eq!(decide_to(b.decide(me, LosClass::None)), None);
        }

        world.get_mut::<Pose>(me.entity()).unwrap().position = Vec2::new(4.8, 0.0);
        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(decide_to(b.decide(me, LosClass::None)), Some(AgentState::Idle));
    }

    #[test]
    fn test_tracking_regains_sight() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Tracking, Vec2::ZERO);
        let b = brain(&world, &stub, &config, 1.0);

        for los in [LosClass::Target, LosClass::Pursuing] {
            assert_eq!(decide_to(b.decide(me, los)), Some(AgentState::Pursuing));
        }
    }

    #[test]
    fn test_tracking_blindly_releases_on_idle_leader() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let leader = spawn(&mut world, AgentState::Idle, Vec2::X);
        let me = spawn(&mut world, AgentState::TrackingBlindly, Vec2::ZERO);
        let tail = spawn(&mut world, AgentState::TrackingBlindly, Vec2::NEG_X);
        // Links made while the leader was engaged.
        world.agent_mut(leader).unwrap().state = AgentState::Pursuing;
        follow::add_follower(&world, leader, me);
        follow::add_follower(&world, me, tail);
        world.agent_mut(leader).unwrap().state = AgentState::Idle;

        let b = brain(&world, &stub, &config, 1.0);
        let decision = b.decide(me, LosClass::None);

        match decision.transition {
            Transition::Released(released) => assert_eq!(released.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(world.agent(me).unwrap().state, AgentState::Idle);
        assert_eq!(world.agent(tail).unwrap().state, AgentState::Idle);
        assert!(world.agent(leader).unwrap().followers.is_empty());
    }

    #[test]
    fn test_tracking_blindly_sees_target_keeps_followers() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let leader = spawn(&mut world, AgentState::Pursuing, Vec2::X);
        let me = spawn(&mut world, AgentState::TrackingBlindly, Vec2::ZERO);
        let tail = spawn(&mut world, AgentState::TrackingBlindly, Vec2::NEG_X);
        follow::add_follower(&world, leader, me);
        follow::add_follower(&world, me, tail);
        world.agent_mut(me).unwrap().tracking_blindly_since = Some(0.5);

        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(
            decide_to(b.decide(me, LosClass::Target)),
            Some(AgentState::Pursuing)
        );

        let record = world.agent(me).unwrap();
        assert!(record.leader.is_none());
        assert!(record.tracking_blindly_since.is_none());
        assert_eq!(record.followers.as_slice(), &[tail]);
        drop(record);
        assert!(world.agent(leader).unwrap().followers.is_empty());
    }

    #[test]
    fn test_tracking_blindly_switches_to_blocking_agent() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let leader = spawn(&mut world, AgentState::Pursuing, Vec2::new(6.0, 0.0));
        let blocker = spawn(&mut world, AgentState::Tracking, Vec2::new(3.0, 0.0));
        let me = spawn(&mut world, AgentState::TrackingBlindly, Vec2::ZERO);
        follow::add_follower(&world, leader, me);
        let stub = StubSpatial::new().with_segment(move |_, _, _| {
            Some(Hit::new(HitKind::Agent(blocker), Vec2::new(2.8, 0.0), 2.8))
        });

        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(decide_to(b.decide(me, LosClass::None)), None);

        assert_eq!(world.agent(me).unwrap().leader, Some(blocker));
        assert!(world.agent(leader).unwrap().followers.is_empty());
        assert_eq!(world.agent(blocker).unwrap().followers.as_slice(), &[me]);
    }

    #[test]
    fn test_tracking_blindly_drops_when_wall_blocks_leader() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let leader = spawn(&mut world, AgentState::Pursuing, Vec2::new(6.0, 0.0));
        let me = spawn(&mut world, AgentState::TrackingBlindly, Vec2::ZERO);
        follow::add_follower(&world, leader, me);
        let stub = StubSpatial::new()
            .with_segment(|_, _, _| Some(Hit::new(HitKind::Static, Vec2::new(2.0, 0.0), 2.0)));

        let b = brain(&world, &stub, &config, 1.0);
        assert!(matches!(
            b.decide(me, LosClass::None).transition,
            Transition::Released(_)
        ));
        assert_eq!(world.agent(me).unwrap().state, AgentState::Idle);
        assert!(world.agent(me).unwrap().leader.is_none());
    }

    #[test]
    fn test_destruction_reaches_obstacle() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Destruction, Vec2::ZERO);
        let cell = ObstacleId(world.spawn((
            Obstacle {
                half_extents: Vec2::splat(0.5),
            },
            Pose::new(Vec2::new(0.3, 0.0), 0.0),
        )));
        world.agent_mut(me).unwrap().tracked_obstacle = Some(cell);
        world.agent_mut(me).unwrap().last_moved_at = 1.0;

        let b = brain(&world, &stub, &config, 1.0);
        let decision = b.decide(me, LosClass::None);
        assert_eq!(decision.destroyed, Some(cell));
        assert!(matches!(
            decision.transition,
            Transition::To(AgentState::Idle)
        ));
    }

    #[test]
    fn test_destruction_gives_up_when_stuck() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Destruction, Vec2::ZERO);
        let cell = ObstacleId(world.spawn((
            Obstacle {
                half_extents: Vec2::splat(0.5),
            },
            Pose::new(Vec2::new(8.0, 0.0), 0.0),
        )));
        world.agent_mut(me).unwrap().tracked_obstacle = Some(cell);
        world.agent_mut(me).unwrap().last_moved_at = 2.0;

        {
            let b = brain(&world, &stub, &config, 2.5);
            assert!(b.decide(me, LosClass::None).destroyed.is_none());
        }
        let b = brain(&world, &stub, &config, 3.0);
        assert_eq!(b.decide(me, LosClass::None).destroyed, Some(cell));
    }

    #[test]
    fn test_destruction_interrupted_by_sight() {
        let cases = [
            (LosClass::Target, AgentState::Pursuing),
            (LosClass::Pursuing, AgentState::PursuingBlindly),
            (LosClass::Tracking, AgentState::TrackingBlindly),
        ];
        for (los, expected) in cases {
            let mut world = World::new();
            let config = HordeConfig::default();
            let stub = StubSpatial::new();
            let me = spawn(&mut world, AgentState::Destruction, Vec2::ZERO);
            let cell = ObstacleId(world.spawn((
                Obstacle {
                    half_extents: Vec2::splat(0.5),
                },
                Pose::new(Vec2::new(6.0, 0.0), 0.0),
            )));
            world.agent_mut(me).unwrap().tracked_obstacle = Some(cell);
            let los = if los == LosClass::Tracking {
                let leader = spawn(&mut world, AgentState::Tracking, Vec2::new(2.0, 0.0));
                blocked_by(&world, me, leader)
            } else {
                los
            };

            let decision = brain(&world, &stub, &config, 1.0).decide(me, los);
            assert!(decision.destroyed.is_none());
            let to = decide_to(decision).unwrap();
            assert_eq!(to, expected);

            assert_eq!(
                enter_state(&world, me, to, 1.0),
                Some(AgentState::Destruction)
            );
            assert!(world.agent(me).unwrap().tracked_obstacle.is_none());
            assert!(world.pose(cell.entity()).is_some());
        }
    }

    #[test]
    fn test_destruction_of_vanished_obstacle_goes_idle() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Destruction, Vec2::ZERO);
        let cell = ObstacleId(world.spawn((Pose::default(),)));
        world.agent_mut(me).unwrap().tracked_obstacle = Some(cell);
        world.despawn(cell.entity()).unwrap();

        let b = brain(&world, &stub, &config, 1.0);
        let decision = b.decide(me, LosClass::None);
        assert!(decision.destroyed.is_none());
        assert!(matches!(
            decision.transition,
            Transition::To(AgentState::Idle)
        ));
    }

    #[test]
    fn test_idle_sweep_follows_pursuer() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let me = spawn(&mut world, AgentState::Idle, Vec2::ZERO);
        let pursuer = spawn(&mut world, AgentState::Pursuing, Vec2::new(4.0, 0.0));
        let stub = StubSpatial::new().with_ray(move |origin, direction, _, _| {
            (direction.x > 0.99).then(|| Hit::new(HitKind::Agent(pursuer), origin + direction * 4.0, 4.0))
        });

        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(
            decide_to(b.decide(me, LosClass::None)),
            Some(AgentState::TrackingBlindly)
        );
        assert_eq!(world.agent(me).unwrap().leader, Some(pursuer));
        assert_eq!(world.agent(me).unwrap().last_sweep_at, Some(1.0));
    }

    #[test]
    fn test_idle_sweep_remembers_target_position() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let me = spawn(&mut world, AgentState::Idle, Vec2::ZERO);
        // The ray stops on the target's surface.
        let stub = StubSpatial::new().with_ray(|origin, direction, _, _| {
            (direction.x > 0.99).then(|| Hit::new(HitKind::Target, origin + direction * 19.7, 19.7))
        });

        let b = brain(&world, &stub, &config, 1.0);
        assert_eq!(
            decide_to(b.decide(me, LosClass::None)),
            Some(AgentState::Pursuing)
        );
        assert_eq!(world.agent(me).unwrap().last_seen_target, Some(b.target));
    }

    #[test]
    fn test_idle_sweep_is_throttled() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Idle, Vec2::ZERO);

        {
            let b = brain(&world, &stub, &config, 1.0);
            b.decide(me, LosClass::None);
        }
        assert_eq!(stub.ray_calls(), config.sweep_casts as usize);
        {
            let b = brain(&world, &stub, &config, 1.2);
            b.decide(me, LosClass::None);
        }
        assert_eq!(stub.ray_calls(), config.sweep_casts as usize);
        assert!(world.agent(me).unwrap().idle_heading.is_some());
    }

    #[test]
    fn test_enter_state_bookkeeping() {
        let mut world = World::new();
        let me = spawn(&mut world, AgentState::Idle, Vec2::ZERO);

        assert_eq!(
            enter_state(&world, me, AgentState::TrackingBlindly, 3.0),
            Some(AgentState::Idle)
        );
        assert_eq!(world.agent(me).unwrap().tracking_blindly_since, Some(3.0));
        assert_eq!(enter_state(&world, me, AgentState::TrackingBlindly, 4.0), None);

        enter_state(&world, me, AgentState::Pursuing, 5.0);
        assert!(world.agent(me).unwrap().tracking_blindly_since.is_none());

        enter_state(&world, me, AgentState::Dead, 6.0);
        assert_eq!(enter_state(&world, me, AgentState::Idle, 7.0), None);
        assert_eq!(world.agent(me).unwrap().state, AgentState::Dead);
    }

    #[test]
    fn test_act_idle_moves_slowly() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Idle, Vec2::ZERO);

        let b = brain(&world, &stub, &config, 1.0);
        let pose = b.act(me, 0.5).unwrap();
        assert!((pose.position - Vec2::new(0.2, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_act_pursuing_turns_gradually() {
        let mut world = World::new();
        let config = HordeConfig::default();
        let stub = StubSpatial::new();
        let me = spawn(&mut world, AgentState::Pursuing, Vec2::ZERO);
        let mut b = brain(&world, &stub, &config, 1.0);
        b.target = Vec2::new(0.0, 10.0);

        let pose = b.act(me, 0.02).unwrap();
        // Turned part of the way toward +Y, not snapped.
        assert!(pose.rotation > 0.0);
        assert!(pose.rotation < std::f32::consts::FRAC_PI_2 * 0.5);
        assert_eq!(world.pose(me.entity()).unwrap(), pose);
    }
}
