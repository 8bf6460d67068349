//! Gravity and floor contact
//!
//! Constant downward acceleration while the entity's bottom edge is above
//! the floor line (y-down coordinates, so "above" means a smaller y). The
//! first update that finds the body at or past the floor while falling
//! snaps it flush, zeroes vertical speed and reports the landing.

use serde::{Deserialize, Serialize};

use crate::command::SimCommand;
use crate::math::Vec2;

/// Slack for resting-on-floor comparisons.
const GROUND_EPS: f32 = 0.5;

/// What a body does the instant it lands; resolved against the owning
/// entity at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandAction {
    ShatterSelf,
}

/// Profile-side gravity constants
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GravityDef {
    /// Species-specific acceleration override; None uses the world setting.
    #[serde(default)]
    pub acceleration: Option<f32>,
    #[serde(default)]
    pub on_land: Option<LandAction>,
}

/// Per-entity gravity state
#[derive(Debug, Clone)]
pub struct Gravity {
    pub acceleration: Option<f32>,
    /// Command queued when the body lands (a flask shatters, for example).
    pub on_land: Option<SimCommand>,
}

impl Gravity {
    pub fn new(acceleration: Option<f32>, on_land: Option<SimCommand>) -> Self {
        Self {
            acceleration,
            on_land,
        }
    }

    pub fn grounded(position: Vec2, dimensions: Vec2, velocity: Vec2, floor_y: f32) -> bool {
        position.y + dimensions.y >= floor_y - GROUND_EPS && velocity.y >= 0.0
    }

    /// Accelerate or land. Returns true when the body touched down this
    /// update.
    pub fn update(
        &mut self,
        position: &mut Vec2,
        velocity: &mut Vec2,
        dimensions: Vec2,
        floor_y: f32,
        world_gravity: f32,
        dt_s: f32,
    ) -> bool {
        let g = self.acceleration.unwrap_or(world_gravity);
        let bottom = position.y + dimensions.y;

        if bottom < floor_y {
            velocity.y += g * dt_s;
            return false;
        }

        if velocity.y > 0.0 {
            // Crossed the floor while falling: snap flush and stop.
            position.y = floor_y - dimensions.y;
            velocity.y = 0.0;
            return true;
        }

        if velocity.y == 0.0 && bottom > floor_y {
            // Placed below the floor (bad spawn data): settle without a
            // landing event.
            position.y = floor_y - dimensions.y;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: f32 = 440.0;
    const G: f32 = 1000.0;

    fn body() -> (Vec2, Vec2, Vec2) {
        // position, velocity, dimensions
        (Vec2::new(0.0, 100.0), Vec2::ZERO, Vec2::new(40.0, 60.0))
    }

    #[test]
    fn test_accelerates_while_airborne() {
        let (mut pos, mut vel, dims) = body();
        let mut gravity = Gravity::new(None, None);

        gravity.update(&mut pos, &mut vel, dims, FLOOR, G, 0.1);
        assert!((vel.y - 100.0).abs() < 0.001);
        gravity.update(&mut pos, &mut vel, dims, FLOOR, G, 0.1);
        assert!((vel.y - 200.0).abs() < 0.001);
    }

    #[test]
    fn test_landing_snaps_and_zeroes() {
        let (mut pos, mut vel, dims) = body();
        let mut gravity = Gravity::new(None, None);
        pos.y = FLOOR - dims.y + 5.0; // just past the floor
        vel.y = 300.0;

        let landed = gravity.update(&mut pos, &mut vel, dims, FLOOR, G, 0.016);
        assert!(landed);
        assert!((pos.y + dims.y - FLOOR).abs() < 0.001);
        assert_eq!(vel.y, 0.0);
        assert!(Gravity::grounded(pos, dims, vel, FLOOR));
    }

    #[test]
    fn test_rising_body_is_not_snapped() {
        let (mut pos, mut vel, dims) = body();
        let mut gravity = Gravity::new(None, None);
        pos.y = FLOOR - dims.y; // standing on the floor
        vel.y = -500.0; // jump just started

        let landed = gravity.update(&mut pos, &mut vel, dims, FLOOR, G, 0.016);
        assert!(!landed);
        assert!((vel.y + 500.0).abs() < 0.001);
        assert!(!Gravity::grounded(pos, dims, vel, FLOOR));
    }

    #[test]
    fn test_acceleration_override() {
        let (mut pos, mut vel, dims) = body();
        let mut gravity = Gravity::new(Some(500.0), None);
        gravity.update(&mut pos, &mut vel, dims, FLOOR, G, 0.1);
        assert!((vel.y - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_buried_spawn_settles_without_landing() {
        let (mut pos, mut vel, dims) = body();
        let mut gravity = Gravity::new(None, None);
        pos.y = FLOOR + 50.0;

        let landed = gravity.update(&mut pos, &mut vel, dims, FLOOR, G, 0.016);
        assert!(!landed);
        assert!((pos.y + dims.y - FLOOR).abs() < 0.001);
    }
}
