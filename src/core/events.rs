//! Events published by the horde
//!
//! The AI core never talks to rendering, audio, or the HUD directly. It pushes
//! `GameEvent`s into a double-buffered queue; presentation collaborators read
//! them on the following frame.
//!
//! # Example
//!
//! ```ignore
//! horde.apply_hit(agent);
//! horde.events_mut().swap();
//! for event in horde.events_mut().drain() {
//!     if let GameEvent::HitEffect { agent, active: true } = event {
//!         start_blood_particles(agent);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec2;

use crate::ai::AgentState;
use crate::ecs::{AgentId, ObstacleId};

// ============================================================================
// Event Types
// ============================================================================

/// Things that happened in the simulation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Lifecycle Events
    // -------------------------------------------------------------------------
    /// An agent entered the live set.
    AgentSpawned {
        agent: AgentId,
        position: Vec2,
    },

    /// An agent was hit and lost health.
    AgentDamaged {
        agent: AgentId,
        /// Remaining hit points
        hp_left: u32,
    },

    /// The transient hit cue on an agent started or ended.
    HitEffect { agent: AgentId, active: bool },

    /// An agent died. Emitted exactly once per agent.
    AgentKilled { agent: AgentId, position: Vec2 },

    /// A dead agent was removed from the live set.
    AgentDespawned { agent: AgentId },

    // -------------------------------------------------------------------------
    // Behavior Events
    // -------------------------------------------------------------------------
    /// An agent's state machine changed state.
    StateChanged {
        agent: AgentId,
        from: AgentState,
        to: AgentState,
    },

    /// An agent tore down a destructible obstacle cell.
    ObstacleDestroyed {
        obstacle: ObstacleId,
        position: Vec2,
    },

    // -------------------------------------------------------------------------
    // Game State Events
    // -------------------------------------------------------------------------
    /// Kill score changed.
    ScoreChanged {
        /// New score value
        score: u32,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Two-buffer queue of [`GameEvent`]s.
///
/// The horde writes during a tick; consumers see that tick's events only
/// after the next [`swap`](Self::swap), so a reader never observes a
/// half-finished tick.
#[derive(Debug)]
pub struct EventQueue {
    /// Written by the current tick
    pending: VecDeque<GameEvent>,
    /// Readable until the next swap
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        // A busy tick (a wave spawning, a chain release) stays under this.
        const CAPACITY: usize = 64;
        Self {
            pending: VecDeque::with_capacity(CAPACITY),
            processing: VecDeque::with_capacity(CAPACITY),
        }
    }

    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Publish everything pushed since the last swap.
    ///
    /// Events published by the previous swap and not drained are dropped.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Published events, oldest first.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Take the published events, oldest first.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of published events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
