//! Per-agent AI record

use std::fmt;

use glam::Vec2;
use smallvec::SmallVec;

use crate::ecs::{AgentId, ObstacleId};

/// Behavior state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AgentState {
    /// Milling about, sweeping for something to do
    #[default]
    Idle,
    /// Moving toward the target with direct line of sight
    Pursuing,
    /// Moving toward the target behind another pursuer
    PursuingBlindly,
    /// Moving toward the target's last seen position
    Tracking,
    /// Following a leader without sight of the target
    TrackingBlindly,
    /// Tearing down a destructible obstacle
    Destruction,
    /// Killed, waiting for removal
    Dead,
}

impl AgentState {
    /// All states, for census output.
    pub const ALL: [Self; 7] = [
        Self::Idle,
        Self::Pursuing,
        Self::PursuingBlindly,
        Self::Tracking,
        Self::TrackingBlindly,
        Self::Destruction,
        Self::Dead,
    ];

    /// State name for debugging and logging.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pursuing => "Pursuing",
            Self::PursuingBlindly => "PursuingBlindly",
            Self::Tracking => "Tracking",
            Self::TrackingBlindly => "TrackingBlindly",
            Self::Destruction => "Destruction",
            Self::Dead => "Dead",
        }
    }

    /// Pursuing the target, directly or behind another pursuer.
    #[must_use]
    pub fn is_pursuing(self) -> bool {
        matches!(self, Self::Pursuing | Self::PursuingBlindly)
    }

    /// Tracking the target, directly or by following a leader.
    #[must_use]
    pub fn is_tracking(self) -> bool {
        matches!(self, Self::Tracking | Self::TrackingBlindly)
    }

    /// Has a real line on the target (terminates a follow chain).
    #[must_use]
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Pursuing | Self::PursuingBlindly | Self::Tracking)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of the latest target line cast, highest rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LosClass {
    /// The segment reached the target
    Target,
    /// The segment was blocked by a pursuing agent
    Pursuing,
    /// The segment was blocked by a tracking agent that was adopted as leader
    Tracking,
    /// Nothing useful in the way
    #[default]
    None,
}

/// AI record attached to every agent entity.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Current behavior state
    pub state: AgentState,
    /// Remaining hit points
    pub hp: u32,
    /// Last position the target was seen at
    pub last_seen_target: Option<Vec2>,
    /// Agents following this one
    pub followers: SmallVec<[AgentId; 4]>,
    /// Agent this one follows
    pub leader: Option<AgentId>,
    /// When the agent entered `TrackingBlindly`
    pub tracking_blindly_since: Option<f64>,
    /// Obstacle being torn down
    pub tracked_obstacle: Option<ObstacleId>,
    /// Heading picked by the last idle sweep
    pub idle_heading: Option<f32>,
    /// Cached result of the last target line cast
    pub los: LosClass,
    /// When the target line was last cast
    pub last_target_cast_at: Option<f64>,
    /// When the last idle sweep ran
    pub last_sweep_at: Option<f64>,
    /// Position the stuck timer measures displacement from
    pub movement_anchor: Vec2,
    /// When the agent last moved beyond the stuck distance
    pub last_moved_at: f64,
    /// Hit cue currently showing
    pub hit_effect: bool,
}

impl Agent {
    /// Fresh idle agent with full health
    #[must_use]
    pub fn new(hp: u32, position: Vec2, now: f64) -> Self {
        Self {
            state: AgentState::Idle,
            hp,
            last_seen_target: None,
            followers: SmallVec::new(),
            leader: None,
            tracking_blindly_since: None,
            tracked_obstacle: None,
            idle_heading: None,
            los: LosClass::None,
            last_target_cast_at: None,
            last_sweep_at: None,
            movement_anchor: position,
            last_moved_at: now,
            hit_effect: false,
        }
    }

    /// Check if the agent has been killed
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == AgentState::Dead
    }

    /// Check if `interval` has passed since `last`.
    #[must_use]
    pub fn is_due(last: Option<f64>, now: f64, interval: f64) -> bool {
        last.is_none_or(|at| now - at >= interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engaged_states() {
        assert!(AgentState::Pursuing.is_engaged());
        assert!(AgentState::PursuingBlindly.is_engaged());
        assert!(AgentState::Tracking.is_engaged());
        assert!(!AgentState::TrackingBlindly.is_engaged());
        assert!(!AgentState::Idle.is_engaged());
        assert!(!AgentState::Destruction.is_engaged());
    }

    #[test]
    fn test_new_agent_is_idle() {
        let agent = Agent::new(2, Vec2::ZERO, 0.0);
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(agent.hp, 2);
        assert!(agent.leader.is_none());
        assert!(agent.followers.is_empty());
        assert!(!agent.is_dead());
    }

    #[test]
    fn test_cadence() {
        assert!(Agent::is_due(None, 0.0, 0.5));
        assert!(!Agent::is_due(Some(1.0), 1.4, 0.5));
        assert!(Agent::is_due(Some(1.0), 1.5, 0.5));
    }
}
