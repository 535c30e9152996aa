//! Leader/follower links between live agents
//!
//! Each follower holds a non-owning id of its leader and each leader holds
//! the ids of its followers. Neither side owns the other, so cycles in the
//! relation cannot leak anything; walks over it are hop-bounded and releases
//! use an explicit worklist.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::ai::AgentState;
use crate::ecs::{AgentId, World};

/// Link `follower` under `leader`, detaching it from any previous leader.
///
/// Returns false (and changes nothing) if either agent is gone or dead, or
/// if the two are the same agent.
pub fn add_follower(world: &World, leader: AgentId, follower: AgentId) -> bool {
    if leader == follower || !is_live(world, leader) || !is_live(world, follower) {
        return false;
    }

    let previous = world.agent(follower).and_then(|agent| agent.leader);
    if let Some(previous) = previous.filter(|&previous| previous != leader) {
        remove_follower(world, previous, follower);
    }

    if let Some(mut record) = world.agent_mut(leader) {
        if !record.followers.contains(&follower) {
            record.followers.push(follower);
        }
    }
    if let Some(mut record) = world.agent_mut(follower) {
        record.leader = Some(leader);
    }
    true
}

/// Unlink `follower` from `leader`. Removing a non-member is a no-op.
pub fn remove_follower(world: &World, leader: AgentId, follower: AgentId) {
    if let Some(mut record) = world.agent_mut(leader) {
        record.followers.retain(|id| *id != follower);
    }
    if let Some(mut record) = world.agent_mut(follower) {
        if record.leader == Some(leader) {
            record.leader = None;
        }
    }
}

/// Detach `agent` from its leader and send it back to `Idle`.
///
/// Returns the state the agent was in. Dead agents keep their state.
pub fn stop_following(world: &World, agent: AgentId) -> Option<AgentState> {
    let leader = world.agent(agent)?.leader;
    if let Some(leader) = leader {
        remove_follower(world, leader, agent);
    }

    let mut record = world.agent_mut(agent)?;
    let previous = record.state;
    record.leader = None;
    record.tracking_blindly_since = None;
    if !record.is_dead() {
        record.state = AgentState::Idle;
    }
    Some(previous)
}

/// Check whether `candidate` leads, within `max_hops`, to an engaged agent.
///
/// The candidate itself is hop 0. Candidates that are neither engaged nor
/// following blindly are never worth following.
pub fn is_worth_following(world: &World, candidate: AgentId, max_hops: usize) -> bool {
    let Some(state) = world.agent(candidate).map(|agent| agent.state) else {
        return false;
    };
    if !(state.is_engaged() || state == AgentState::TrackingBlindly) {
        return false;
    }

    let mut current = candidate;
    for _ in 0..=max_hops {
        let Some(record) = world.agent(current) else {
            return false;
        };
        if record.state.is_engaged() {
            return true;
        }
        match record.leader {
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}

/// Release `root` from its leader and every agent in its follower subtree.
///
/// Each released agent loses its leader link and its follower list and goes
/// back to `Idle`. Agents that no longer exist are skipped and no agent is
/// visited twice. Returns each released agent with the state it left.
pub fn drop_followers(world: &World, root: AgentId) -> Vec<(AgentId, AgentState)> {
    let mut released = Vec::new();
    let mut visited = FxHashSet::default();
    let mut worklist = VecDeque::from([root]);

    while let Some(agent) = worklist.pop_front() {
        if !visited.insert(agent) {
            continue;
        }
        let Some(previous) = stop_following(world, agent) else {
            continue;
        };
        released.push((agent, previous));

        if let Some(mut record) = world.agent_mut(agent) {
            worklist.extend(record.followers.drain(..));
        }
    }

    released
}

/// Repair half-edges: leader links not mirrored in the leader's follower list,
/// and follower entries whose agent points elsewhere.
///
/// Returns the number of edges cleared.
pub fn heal_links(world: &World) -> usize {
    let ids = world.agent_ids();
    let mut healed = 0;

    for &id in &ids {
        let leader = world.agent(id).and_then(|agent| agent.leader);
        let Some(leader) = leader else {
            continue;
        };
        let mirrored = world
            .agent(leader)
            .is_some_and(|record| record.followers.contains(&id) && !record.is_dead());
        if !mirrored {
            log::warn!("Clearing dangling leader link {:?} -> {:?}", id, leader);
            if let Some(mut record) = world.agent_mut(id) {
                record.leader = None;
            }
            healed += 1;
        }
    }

    for &id in &ids {
        let followers = match world.agent(id) {
            Some(record) => record.followers.clone(),
            None => continue,
        };
        for follower in followers {
            let points_back = follower != id
                && world
                    .agent(follower)
                    .is_some_and(|record| record.leader == Some(id));
            if !points_back {
                log::warn!("Clearing dangling follower entry {:?} -> {:?}", id, follower);
                if let Some(mut record) = world.agent_mut(id) {
                    record.followers.retain(|f| *f != follower);
                }
                healed += 1;
            }
        }
    }

    healed
}

fn is_live(world: &World, agent: AgentId) -> bool {
    world.agent(agent).is_some_and(|record| !record.is_dead())
}
