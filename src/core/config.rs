//! Horde tuning configuration
//!
//! Supports loading configuration from RON (Rusty Object Notation) or JSON files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunables for agent perception, movement, and lifecycle.
///
/// Speeds are world units per second. Turn rates are the fraction of the
/// remaining arc covered per fixed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HordeConfig {
    /// Hits an agent can take before dying
    pub max_hp: u32,
    /// Per-tick velocity damping factor
    pub damping: f32,
    /// Minimum interval between target line casts, per agent
    pub seconds_between_target_casts: f64,
    /// Minimum interval between idle sweeps, per agent
    pub seconds_between_sweeps: f64,
    /// Maximum time an agent may follow blindly before giving up
    pub max_tracking_blindly_seconds: f64,
    /// Number of rays in the 180 degree idle sweep
    pub sweep_casts: u32,
    /// Maximum distance of a sweep ray
    pub sweep_range: f32,
    /// Hop bound for the leader reachability walk
    pub max_follow_hops: usize,
    /// Forward speed while idle
    pub slow_speed: f32,
    /// Forward speed while pursuing, tracking, or destroying
    pub fast_speed: f32,
    /// Turn fraction per tick toward a pursuit bearing
    pub pursuit_turn_rate: f32,
    /// Turn fraction per tick toward the idle heading
    pub idle_turn_rate: f32,
    /// Distance at which a tracked point counts as reached
    pub arrival_radius: f32,
    /// Time without net movement before an agent is stuck
    pub stuck_seconds: f64,
    /// Displacement that counts as net movement
    pub stuck_distance: f32,
    /// Duration of the hit cue
    pub hit_effect_seconds: f64,
    /// Delay between death and removal from the live set
    pub despawn_delay_seconds: f64,
    /// Physics tick length in seconds
    pub fixed_timestep: f64,
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            max_hp: 2,
            damping: 0.9,
            seconds_between_target_casts: 0.5,
            seconds_between_sweeps: 0.5,
            max_tracking_blindly_seconds: 10.0,
            sweep_casts: 9,
            sweep_range: 50.0,
            max_follow_hops: 16,
            slow_speed: 0.4,
            fast_speed: 2.0,
            pursuit_turn_rate: 0.1,
            idle_turn_rate: 0.05,
            arrival_radius: 0.5,
            stuck_seconds: 1.0,
            stuck_distance: 0.5,
            hit_effect_seconds: 0.2,
            despawn_delay_seconds: 1.0,
            fixed_timestep: 1.0 / 50.0,
        }
    }
}

impl HordeConfig {
    /// Parse a configuration from a RON string and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or a value is out of range
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: HordeConfig =
            ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: HordeConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Check every value is usable by the simulation
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("seconds_between_target_casts", self.seconds_between_target_casts),
            ("seconds_between_sweeps", self.seconds_between_sweeps),
            ("max_tracking_blindly_seconds", self.max_tracking_blindly_seconds),
            ("stuck_seconds", self.stuck_seconds),
            ("hit_effect_seconds", self.hit_effect_seconds),
            ("despawn_delay_seconds", self.despawn_delay_seconds),
            ("fixed_timestep", self.fixed_timestep),
            ("sweep_range", f64::from(self.sweep_range)),
            ("slow_speed", f64::from(self.slow_speed)),
            ("fast_speed", f64::from(self.fast_speed)),
            ("arrival_radius", f64::from(self.arrival_radius)),
            ("stuck_distance", f64::from(self.stuck_distance)),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }

        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "damping must be in (0, 1), got {}",
                self.damping
            )));
        }

        for (field, rate) in [
            ("pursuit_turn_rate", self.pursuit_turn_rate),
            ("idle_turn_rate", self.idle_turn_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be in (0, 1], got {rate}"
                )));
            }
        }

        if self.sweep_casts < 2 {
            return Err(ConfigError::Invalid(format!(
                "sweep_casts must be at least 2, got {}",
                self.sweep_casts
            )));
        }

        if self.max_hp == 0 {
            return Err(ConfigError::Invalid("max_hp must be non-zero".to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur while loading a configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// Parse or serialization error
    Parse(String),
    /// A value is out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
