//! Rotate-and-advance kinematics
//!
//! Agents have no pathfinding. Every tick they turn part of the way toward a
//! heading and move forward along whatever heading they end up with.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::ecs::{Pose, Velocity};

/// Wrap an angle into `[-PI, PI)`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Heading from `from` to `to`, or `None` if the points coincide.
#[must_use]
pub fn bearing_to(from: Vec2, to: Vec2) -> Option<f32> {
    let delta = to - from;
    if !delta.is_finite() || delta.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(delta.y.atan2(delta.x))
}

/// Interpolate `current` toward `target` along the shorter arc.
///
/// `fraction` of 1.0 snaps; smaller values ease in over several ticks.
#[must_use]
pub fn turn_towards(current: f32, target: f32, fraction: f32) -> f32 {
    let delta = wrap_angle(target - current);
    wrap_angle(current + delta * fraction.clamp(0.0, 1.0))
}

/// One tick of movement: turn toward `heading`, then advance at `speed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steer {
    /// Desired heading in radians
    pub heading: f32,
    /// Fraction of the remaining arc to turn this tick
    pub turn_rate: f32,
    /// Forward speed in units per second
    pub speed: f32,
}

impl Steer {
    /// Steer toward a point. Returns `None` when already on it.
    #[must_use]
    pub fn towards(from: Vec2, to: Vec2, turn_rate: f32, speed: f32) -> Option<Self> {
        bearing_to(from, to).map(|heading| Self {
            heading,
            turn_rate,
            speed,
        })
    }

    /// Apply to a pose over `dt` seconds.
    pub fn apply(&self, pose: &mut Pose, dt: f32) {
        pose.rotation = turn_towards(pose.rotation, self.heading, self.turn_rate);
        pose.position += pose.forward() * self.speed * dt;
    }
}

/// Move a pose forward along its current heading.
pub fn advance(pose: &mut Pose, speed: f32, dt: f32) {
    pose.position += pose.forward() * speed * dt;
}

/// Integrate external velocity and damp it by `factor`.
pub fn drift_and_damp(pose: &mut Pose, velocity: &mut Velocity, factor: f32, dt: f32) {
    pose.position += velocity.linear * dt;
    velocity.linear *= factor;
}
