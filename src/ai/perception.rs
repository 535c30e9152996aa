//! Line-of-sight perception
//!
//! Two kinds of queries, each on its own per-agent cadence:
//!
//! - a segment cast toward the target, classified into a [`LosClass`]
//! - a fan of rays over the half-plane in front of an idle agent, resolved
//!   into a single [`SweepOutcome`]

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use crate::ai::follow;
use crate::ai::{Agent, AgentState, LosClass};
use crate::core::HordeConfig;
use crate::ecs::{AgentId, ObstacleId, World};
use crate::physics::{Hit, HitKind, SpatialQuery};

/// Classify the nearest hit of a target line cast.
///
/// Side effects: a `Target` hit records `target` as the last seen target
/// position (the hit point lies on the target's surface, not its centre). A hit
/// on a tracking agent adopts that agent as leader, provided the caster has no
/// leader, is in a state that can start following, and the candidate passes
/// the reachability test. Without the adoption the hit counts as `None`.
pub fn classify_target_hit(
    world: &World,
    agent: AgentId,
    target: Vec2,
    hit: Option<Hit>,
    max_hops: usize,
) -> LosClass {
    let Some(hit) = hit else {
        return LosClass::None;
    };

    match hit.kind {
        HitKind::Target => {
            if let Some(mut record) = world.agent_mut(agent) {
                record.last_seen_target = Some(target);
            }
            LosClass::Target
        }
        HitKind::Agent(other) if other != agent => {
            let Some(other_state) = world.agent(other).map(|record| record.state) else {
                return LosClass::None;
            };
            if other_state.is_pursuing() {
                return LosClass::Pursuing;
            }
            if other_state.is_tracking()
                && can_adopt_leader(world, agent)
                && follow::is_worth_following(world, other, max_hops)
                && follow::add_follower(world, other, agent)
            {
                log::debug!("{:?} adopted {:?} as leader from target line", agent, other);
                return LosClass::Tracking;
            }
            LosClass::None
        }
        HitKind::Agent(_) | HitKind::Obstacle(_) | HitKind::Static => LosClass::None,
    }
}

fn can_adopt_leader(world: &World, agent: AgentId) -> bool {
    world.agent(agent).is_some_and(|record| {
        record.leader.is_none()
            && !matches!(
                record.state,
                AgentState::Tracking | AgentState::TrackingBlindly | AgentState::Dead
            )
    })
}

/// Re-cast the target line if the cadence allows and return the current
/// classification (fresh or cached).
pub fn refresh_target_los<S: SpatialQuery>(
    world: &World,
    spatial: &S,
    agent: AgentId,
    target: Vec2,
    now: f64,
    config: &HordeConfig,
) -> LosClass {
    let Some(position) = world.pose(agent.entity()).map(|pose| pose.position) else {
        return LosClass::None;
    };
    let (due, cached) = match world.agent(agent) {
        Some(record) => (
            Agent::is_due(
                record.last_target_cast_at,
                now,
                config.seconds_between_target_casts,
            ),
            record.los,
        ),
        None => return LosClass::None,
    };
    if !due {
        return cached;
    }

    let hit = spatial.cast_segment(position, target, Some(agent));
    let los = classify_target_hit(world, agent, target, hit, config.max_follow_hops);

    if let Some(mut record) = world.agent_mut(agent) {
        record.los = los;
        record.last_target_cast_at = Some(now);
    }
    los
}

/// One ray of an idle sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRay {
    /// Angle from the agent's backward reference direction, in `[0, PI]`
    pub offset: f32,
    /// World heading of the ray
    pub heading: f32,
    /// Nearest hit, if any
    pub hit: Option<Hit>,
    /// Unobstructed length of the ray
    pub clearance: f32,
}

/// What an idle sweep decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepOutcome {
    /// A ray reached the target
    Target,
    /// The nearest agent worth following
    Follow(AgentId),
    /// The nearest destructible obstacle
    Obstacle(ObstacleId),
    /// Nothing of interest; face the most open direction
    Wander { heading: f32 },
}

/// Fire `casts` rays, evenly spaced from the agent's right-hand side
/// (heading minus 90 degrees) through its front to its left-hand side.
pub fn cast_sweep<S: SpatialQuery>(
    spatial: &S,
    agent: AgentId,
    position: Vec2,
    rotation: f32,
    casts: u32,
    range: f32,
) -> Vec<SweepRay> {
    let casts = casts.max(2);
    let step = PI / (casts - 1) as f32;
    let reference = rotation - FRAC_PI_2;

    (0..casts)
        .map(|i| {
            let offset = step * i as f32;
            let heading = reference + offset;
            let hit = spatial.cast_ray(position, Vec2::from_angle(heading), Some(range), Some(agent));
            let clearance = hit.map_or(range, |hit| hit.distance);
            SweepRay {
                offset,
                heading,
                hit,
                clearance,
            }
        })
        .collect()
}

/// Reduce a sweep to one outcome.
///
/// Priority: target, then the nearest agent worth following, then the
/// nearest obstacle, then the ray with the most clearance. An agent always
/// beats an obstacle regardless of which is closer.
pub fn resolve_sweep(
    world: &World,
    agent: AgentId,
    rays: &[SweepRay],
    max_hops: usize,
) -> SweepOutcome {
    let mut target_seen = false;
    let mut leader: Option<(AgentId, f32)> = None;
    let mut obstacle: Option<(ObstacleId, f32)> = None;
    let mut widest: Option<&SweepRay> = None;

    for ray in rays {
        if widest.is_none_or(|best| ray.clearance > best.clearance) {
            widest = Some(ray);
        }

        let Some(hit) = ray.hit else {
            continue;
        };
        match hit.kind {
            HitKind::Target => target_seen = true,
            HitKind::Agent(other) if other != agent => {
                let nearer = leader.is_none_or(|(_, distance)| hit.distance < distance);
                if nearer && follow::is_worth_following(world, other, max_hops) {
                    leader = Some((other, hit.distance));
                }
            }
            HitKind::Obstacle(cell) => {
                if obstacle.is_none_or(|(_, distance)| hit.distance < distance) {
                    obstacle = Some((cell, hit.distance));
                }
            }
            HitKind::Agent(_) | HitKind::Static => {}
        }
    }

    if target_seen {
        SweepOutcome::Target
    } else if let Some((other, _)) = leader {
        SweepOutcome::Follow(other)
    } else if let Some((cell, _)) = obstacle {
        SweepOutcome::Obstacle(cell)
    } else {
        let heading = widest.map_or(0.0, |ray| ray.heading);
        SweepOutcome::Wander { heading }
    }
}
