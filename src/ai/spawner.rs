//! Spawn points and wave pacing

use std::f32::consts::TAU;

use glam::Vec2;

use crate::ai::{Horde, PacingController};
use crate::ecs::AgentId;
use crate::physics::SpatialQuery;

/// A fixed place agents enter the arena from.
#[derive(Debug, Clone)]
pub struct SpawnPoint {
    /// Where agents appear
    pub position: Vec2,
    /// Agents spawned here so far
    pub spawned: u32,
    rng: fastrand::Rng,
}

impl SpawnPoint {
    /// Create a spawn point with a randomly seeded heading source
    pub fn new(position: Vec2) -> Self {
        Self::with_rng(position, fastrand::Rng::new())
    }

    /// Create a spawn point with a deterministic heading source
    pub fn with_seed(position: Vec2, seed: u64) -> Self {
        Self::with_rng(position, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(position: Vec2, rng: fastrand::Rng) -> Self {
        Self {
            position,
            spawned: 0,
            rng,
        }
    }

    /// Spawn one agent facing a uniformly random heading in `[0, TAU)`.
    pub fn spawn<S: SpatialQuery, P: PacingController>(
        &mut self,
        horde: &mut Horde<S, P>,
    ) -> AgentId {
        let heading = self.rng.f32() * TAU;
        self.spawned += 1;
        horde.spawn(self.position, heading)
    }
}

/// Round-based spawn pacing.
///
/// Spawns one agent per interval, round-robin over the spawn points, while
/// fewer than `max_active` are alive and the round's `round_total` has not
/// been spawned. The round ends when all of them are killed.
#[derive(Debug, Clone)]
pub struct WavePacer {
    /// Agents per round
    pub round_total: u32,
    /// Cap on simultaneously live agents
    pub max_active: u32,
    /// Seconds between spawns
    pub spawn_interval: f64,
    /// Current round, starting at 1
    pub round: u32,
    active: u32,
    spawned: u32,
    kills: u32,
    next_point: usize,
    next_spawn_at: f64,
}

impl WavePacer {
    pub fn new(round_total: u32, max_active: u32, spawn_interval: f64) -> Self {
        Self {
            round_total,
            max_active,
            spawn_interval,
            round: 1,
            active: 0,
            spawned: 0,
            kills: 0,
            next_point: 0,
            next_spawn_at: 0.0,
        }
    }

    /// Live agents spawned by this pacer
    pub fn active(&self) -> u32 {
        self.active
    }

    /// Kills in the current round
    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Index of the spawn point due at `now`, if a spawn is allowed.
    ///
    /// Counts the spawn; the caller is expected to perform it.
    pub fn poll(&mut self, now: f64, points: usize) -> Option<usize> {
        if points == 0
            || now < self.next_spawn_at
            || self.active >= self.max_active
            || self.spawned >= self.round_total
        {
            return None;
        }
        let index = self.next_point % points;
        self.next_point = (self.next_point + 1) % points;
        self.next_spawn_at = now + self.spawn_interval;
        self.active += 1;
        self.spawned += 1;
        Some(index)
    }
}

impl PacingController for WavePacer {
    fn notify_agent_killed(&mut self, agent: AgentId) {
        self.active = self.active.saturating_sub(1);
        self.kills += 1;
        if self.kills >= self.round_total {
            log::info!("Round {} cleared ({:?} was the last)", self.round, agent);
            self.round += 1;
            self.kills = 0;
            self.spawned = 0;
        }
    }
}
