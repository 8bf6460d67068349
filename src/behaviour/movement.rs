//! Horizontal movement and jumping
//!
//! Intent flags come from outside (host input for the player, the factory
//! for enemies that march on their own) and resolve to velocity every
//! update: arcade movement, no inertia. Ballistic bodies like a thrown
//! flask skip intent resolution entirely and just integrate.

use serde::{Deserialize, Serialize};

use crate::entity::Facing;
use crate::math::Vec2;
use crate::state::StateKind;

/// Profile-side movement constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementDef {
    /// Horizontal speed while an intent is held (pixels/second)
    pub max_speed: f32,
    /// Initial upward speed of a jump (pixels/second)
    pub jump_speed: f32,
    /// Whether intent flags drive this body; false = ballistic
    pub intent_driven: bool,
    /// Keep x inside [0, world_width - entity_width]
    pub clamp_to_world: bool,
    /// Random spread applied to max_speed at spawn, as a fraction of it.
    /// 0.3 means each instance walks at max_speed plus or minus 30%.
    #[serde(default)]
    pub jitter: f32,
}

/// Per-entity movement state
#[derive(Debug, Clone)]
pub struct Movement {
    pub velocity: Vec2,
    pub max_speed: f32,
    pub jump_speed: f32,
    pub intent_driven: bool,
    pub clamp_to_world: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
}

impl Movement {
    pub fn from_def(def: &MovementDef, max_speed: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            max_speed,
            jump_speed: def.jump_speed,
            intent_driven: def.intent_driven,
            clamp_to_world: def.clamp_to_world,
            move_left: false,
            move_right: false,
            jump: false,
        }
    }

    /// States that own the body's velocity; intents are ignored while the
    /// entity is in one of them.
    fn intents_suppressed(state: Option<StateKind>) -> bool {
        matches!(
            state,
            Some(
                StateKind::Hurt
                    | StateKind::Dead
                    | StateKind::Attack
                    | StateKind::Rotation
                    | StateKind::Alert
            )
        )
    }

    pub fn is_walking(&self) -> bool {
        self.velocity.x != 0.0
    }

    /// Resolve intents, integrate, clamp. Returns whether a jump started
    /// this update.
    pub fn update(
        &mut self,
        position: &mut Vec2,
        facing: &mut Facing,
        dimensions: Vec2,
        state: Option<StateKind>,
        grounded: bool,
        world_width: f32,
        dt_s: f32,
    ) -> bool {
        let mut jumped = false;

        if self.intent_driven && !Self::intents_suppressed(state) {
            match (self.move_left, self.move_right) {
                (true, false) => {
                    self.velocity.x = -self.max_speed;
                    *facing = Facing::Left;
                }
                (false, true) => {
                    self.velocity.x = self.max_speed;
                    *facing = Facing::Right;
                }
                // Neither or both: stop dead, keep facing.
                _ => self.velocity.x = 0.0,
            }

            if self.jump && grounded {
                self.velocity.y = -self.jump_speed;
                jumped = true;
            }
        }

        *position += self.velocity * dt_s;

        if self.clamp_to_world {
            let max_x = (world_width - dimensions.x).max(0.0);
            position.x = position.x.clamp(0.0, max_x);
        }

        jumped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker() -> Movement {
        Movement {
            velocity: Vec2::ZERO,
            max_speed: 200.0,
            jump_speed: 600.0,
            intent_driven: true,
            clamp_to_world: true,
            move_left: false,
            move_right: false,
            jump: false,
        }
    }

    #[test]
    fn test_intent_sets_velocity_and_facing() {
        let mut movement = walker();
        let mut pos = Vec2::new(100.0, 0.0);
        let mut facing = Facing::Right;

        movement.move_left = true;
        movement.update(
            &mut pos,
            &mut facing,
            Vec2::new(50.0, 80.0),
            Some(StateKind::Walk),
            true,
            1000.0,
            0.5,
        );
        assert_eq!(facing, Facing::Left);
        assert!((movement.velocity.x + 200.0).abs() < 0.001);
        assert!((pos.x - 0.0).abs() < 0.001); // 100 - 200*0.5
    }

    #[test]
    fn test_no_intent_stops_dead() {
        let mut movement = walker();
        movement.velocity.x = 200.0;
        let mut pos = Vec2::ZERO;
        let mut facing = Facing::Right;

        movement.update(
            &mut pos,
            &mut facing,
            Vec2::new(50.0, 80.0),
            Some(StateKind::Walk),
            true,
            1000.0,
            0.016,
        );
        assert_eq!(movement.velocity.x, 0.0);
        assert_eq!(facing, Facing::Right);
    }

    #[test]
    fn test_both_intents_cancel() {
        let mut movement = walker();
        movement.move_left = true;
        movement.move_right = true;
        let mut pos = Vec2::ZERO;
        let mut facing = Facing::Left;

        movement.update(
            &mut pos,
            &mut facing,
            Vec2::new(50.0, 80.0),
            Some(StateKind::Idle),
            true,
            1000.0,
            0.016,
        );
        assert_eq!(movement.velocity.x, 0.0);
        assert_eq!(facing, Facing::Left);
    }

    #[test]
    fn test_world_clamp() {
        let mut movement = walker();
        movement.move_right = true;
        let mut pos = Vec2::new(990.0, 0.0);
        let mut facing = Facing::Right;

        movement.update(
            &mut pos,
            &mut facing,
            Vec2::new(50.0, 80.0),
            Some(StateKind::Walk),
            true,
            1000.0,
            1.0,
        );
        assert!((pos.x - 950.0).abs() < 0.001); // world_width - width
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut movement = walker();
        movement.jump = true;
        let mut pos = Vec2::ZERO;
        let mut facing = Facing::Right;
        let dims = Vec2::new(50.0, 80.0);

        let jumped = movement.update(
            &mut pos,
            &mut facing,
            dims,
            Some(StateKind::Idle),
            false,
            1000.0,
            0.016,
        );
        assert!(!jumped);
        assert_eq!(movement.velocity.y, 0.0);

        let jumped =
            movement.update(&mut pos, &mut facing, dims, Some(StateKind::Idle), true, 1000.0, 0.016);
        assert!(jumped);
        assert!((movement.velocity.y + 600.0).abs() < 0.001);
    }

    #[test]
    fn test_intents_suppressed_while_hurt() {
        let mut movement = walker();
        movement.move_right = true;
        movement.velocity.x = -42.0; // whatever the state left there
        let mut pos = Vec2::ZERO;
        let mut facing = Facing::Left;

        movement.update(
            &mut pos,
            &mut facing,
            Vec2::new(50.0, 80.0),
            Some(StateKind::Hurt),
            true,
            1000.0,
            0.016,
        );
        assert!((movement.velocity.x + 42.0).abs() < 0.001);
        assert_eq!(facing, Facing::Left);
    }

    #[test]
    fn test_ballistic_body_keeps_velocity() {
        let mut movement = walker();
        movement.intent_driven = false;
        movement.clamp_to_world = false;
        movement.velocity = Vec2::new(300.0, -100.0);
        let mut pos = Vec2::ZERO;
        let mut facing = Facing::Right;

        movement.update(
            &mut pos,
            &mut facing,
            Vec2::new(20.0, 20.0),
            Some(StateKind::Rotation),
            false,
            1000.0,
            0.1,
        );
        assert!((pos.x - 30.0).abs() < 0.001);
        assert!((pos.y + 10.0).abs() < 0.001);
        assert!((movement.velocity.x - 300.0).abs() < 0.001);
    }
}
