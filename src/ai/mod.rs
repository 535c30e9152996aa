//! Agent AI module
//!
//! Provides the per-agent state machine, line-of-sight perception, the
//! leader/follower graph, steering, and the horde that drives them.

mod agent;
mod follow;
mod fsm;
mod horde;
mod perception;
mod spawner;
mod steering;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{Agent, AgentState, LosClass};
pub use follow::{
    add_follower, drop_followers, heal_links, is_worth_following, remove_follower, stop_following,
};
pub use fsm::{Brain, Decision, Transition, enter_state};
pub use horde::{Horde, PacingController};
pub use perception::{
    SweepOutcome, SweepRay, cast_sweep, classify_target_hit, refresh_target_los, resolve_sweep,
};
pub use spawner::{SpawnPoint, WavePacer};
pub use steering::{Steer, advance, bearing_to, drift_and_damp, turn_towards, wrap_angle};
