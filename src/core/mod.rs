//! Core simulation module
//!
//! Contains configuration, the fixed-step clock, deadlines, and game events

mod config;
mod events;
mod schedule;
mod time;

pub use config::{ConfigError, HordeConfig};
pub use events::{EventQueue, GameEvent};
pub use schedule::Deadlines;
pub use time::Time;
