//! Entities
//!
//! One [`GameObject`] type covers the player, enemies, projectiles and
//! pickups: a position, a facing and an optional slot per behaviour.
//! What a species can do is decided by which slots its profile fills,
//! not by a type hierarchy.

pub mod factory;
pub mod profile;

pub use profile::{ProfileSet, SpeciesKind, SpeciesProfile};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::assets::ImageHandle;
use crate::audio::SoundSink;
use crate::behaviour::animation::{AnimKind, Animation};
use crate::behaviour::collision::CollisionBody;
use crate::behaviour::gravity::Gravity;
use crate::behaviour::movement::Movement;
use crate::behaviour::resource::Resources;
use crate::behaviour::sound::{SoundCue, SoundSet};
use crate::collision::CollisionManager;
use crate::command::SimCommand;
use crate::math::Vec2;
use crate::settings::WorldSettings;
use crate::state::{EntityState, StateKind};
use crate::timing::Scheduler;

/// Unique entity id; monotonically assigned, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1 for left, +1 for right; scales speeds into velocities.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// All live entities keyed by id; iteration order is spawn order
pub type EntityMap = BTreeMap<EntityId, GameObject>;

/// The slice of the world a state transition or behaviour update may
/// touch. Borrowing the world field by field keeps entity mutation and
/// registry mutation disjoint, so an entity can arm timers and leave the
/// pair scan while the world still holds it mutably.
pub(crate) struct SimCtx<'a> {
    pub settings: &'a WorldSettings,
    pub scheduler: &'a mut Scheduler<SimCommand>,
    pub colliders: &'a mut CollisionManager,
    pub audio: &'a mut dyn SoundSink,
    /// Deferred effects surfaced during the borrow; the world applies
    /// them afterwards.
    pub commands: &'a mut Vec<SimCommand>,
}

/// One live entity
#[derive(Debug)]
pub struct GameObject {
    pub id: EntityId,
    pub species: SpeciesKind,
    /// Top-left corner of the sprite, y growing downward.
    pub position: Vec2,
    pub dimensions: Vec2,
    pub facing: Facing,
    pub movement: Option<Movement>,
    pub gravity: Option<Gravity>,
    pub animation: Option<Animation>,
    pub collision: Option<CollisionBody>,
    pub resources: Option<Resources>,
    pub sounds: Option<SoundSet>,
    pub state: Option<EntityState>,
    pub allowed_states: BTreeSet<StateKind>,
    pub default_state: Option<StateKind>,
}

impl GameObject {
    /// A bare entity with every behaviour slot empty; the factory fills
    /// the slots the profile asks for.
    pub fn new(id: EntityId, species: SpeciesKind, position: Vec2, dimensions: Vec2) -> Self {
        Self {
            id,
            species,
            position,
            dimensions,
            facing: Facing::Right,
            movement: None,
            gravity: None,
            animation: None,
            collision: None,
            resources: None,
            sounds: None,
            state: None,
            allowed_states: BTreeSet::new(),
            default_state: None,
        }
    }

    pub fn state_kind(&self) -> Option<StateKind> {
        self.state.as_ref().map(EntityState::kind)
    }

    pub fn is_dead(&self) -> bool {
        self.state_kind() == Some(StateKind::Dead)
    }

    /// The image to draw this frame, if the species has strips at all.
    pub fn image(&self) -> Option<ImageHandle> {
        self.animation.as_ref().and_then(Animation::current_image)
    }

    pub(crate) fn set_animation(&mut self, kind: AnimKind) {
        if let Some(animation) = self.animation.as_mut() {
            animation.set(kind);
        }
    }

    pub(crate) fn play_cue(&self, cue: SoundCue, audio: &mut dyn SoundSink) {
        if let Some(sounds) = self.sounds.as_ref() {
            sounds.play(cue, audio);
        }
    }

    /// Zero velocity and drop every held intent.
    pub(crate) fn halt(&mut self) {
        if let Some(movement) = self.movement.as_mut() {
            movement.velocity = Vec2::ZERO;
            movement.move_left = false;
            movement.move_right = false;
            movement.jump = false;
        }
    }

    pub(crate) fn grounded(&self, floor_y: f32) -> bool {
        let velocity = self.movement.as_ref().map_or(Vec2::ZERO, |m| m.velocity);
        Gravity::grounded(self.position, self.dimensions, velocity, floor_y)
    }

    /// Request a transition; `None` selects the profile's default state.
    /// Dead is final, unknown states are dropped with a log, and only
    /// idle may re-enter (to restart its timers).
    pub(crate) fn set_state(&mut self, kind: Option<StateKind>, ctx: &mut SimCtx<'_>) {
        let Some(kind) = kind.or(self.default_state) else {
            debug!(entity = %self.id, "state request with no default; ignored");
            return;
        };
        let current = self.state_kind();
        if current == Some(StateKind::Dead) {
            debug!(entity = %self.id, to = ?kind, "dead is final; transition dropped");
            return;
        }
        if !self.allowed_states.contains(&kind) {
            debug!(entity = %self.id, to = ?kind, "state not in the allowed set; dropped");
            return;
        }
        if current == Some(kind) && kind != StateKind::Idle {
            return;
        }
        debug!(entity = %self.id, from = ?current, to = ?kind, "state transition");
        if let Some(old) = self.state.take() {
            old.exit(self, ctx);
        }
        let next = EntityState::enter(kind, self, ctx);
        self.state = Some(next);
    }

    /// One fixed behaviour step, in a fixed order: animation, gravity,
    /// movement, collider refresh, then state logic. Deferred effects go
    /// on `ctx.commands`.
    pub(crate) fn update(&mut self, ctx: &mut SimCtx<'_>) {
        let dt_ms = ctx.settings.tick_interval_ms;
        let dt_s = (dt_ms / 1000.0) as f32;

        if let Some(animation) = self.animation.as_mut() {
            if let Some(done) = animation.update(dt_ms) {
                ctx.commands.push(done);
            }
        }

        let mut landed = false;
        if let (Some(gravity), Some(movement)) = (self.gravity.as_mut(), self.movement.as_mut()) {
            if gravity.update(
                &mut self.position,
                &mut movement.velocity,
                self.dimensions,
                ctx.settings.floor_y,
                ctx.settings.gravity,
                dt_s,
            ) {
                landed = true;
                if let Some(command) = gravity.on_land.clone() {
                    ctx.commands.push(command);
                }
            }
        }
        if landed && self.state_kind() == Some(StateKind::Jump) {
            self.set_state(Some(StateKind::Idle), ctx);
        }

        let state = self.state_kind();
        let grounded = self.grounded(ctx.settings.floor_y);
        let mut jumped = false;
        if let Some(movement) = self.movement.as_mut() {
            jumped = movement.update(
                &mut self.position,
                &mut self.facing,
                self.dimensions,
                state,
                grounded,
                ctx.settings.world_width,
                dt_s,
            );
        }
        if jumped {
            self.set_state(Some(StateKind::Jump), ctx);
        }

        if let Some(collision) = self.collision.as_mut() {
            collision.update(self.position, self.dimensions);
        }

        let moving = self.movement.as_ref().is_some_and(Movement::is_walking);
        if let Some(kind) = self.state.as_ref().and_then(|state| state.update(moving)) {
            self.set_state(Some(kind), ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::timing::TimerId;

    fn grounded_walker() -> GameObject {
        let settings = WorldSettings::default();
        let mut obj = GameObject::new(
            EntityId(0),
            SpeciesKind::Drifter,
            Vec2::new(100.0, settings.floor_y - 86.0),
            Vec2::new(46.0, 86.0),
        );
        obj.movement = Some(Movement::from_def(
            &crate::behaviour::movement::MovementDef {
                max_speed: 260.0,
                jump_speed: 760.0,
                intent_driven: true,
                clamp_to_world: true,
                jitter: 0.0,
            },
            260.0,
        ));
        obj.gravity = Some(Gravity::new(None, None));
        obj.allowed_states = [
            StateKind::Idle,
            StateKind::Walk,
            StateKind::Jump,
            StateKind::Hurt,
            StateKind::Dead,
        ]
        .into_iter()
        .collect();
        obj.default_state = Some(StateKind::Idle);
        obj
    }

    #[test]
    fn test_no_default_state_request_is_ignored() {
        let settings = WorldSettings::default();
        let mut scheduler = Scheduler::new();
        let mut colliders = CollisionManager::new();
        let mut audio = NullAudio;
        let mut commands = Vec::new();
        let mut obj = GameObject::new(
            EntityId(1),
            SpeciesKind::Coin,
            Vec2::ZERO,
            Vec2::new(28.0, 28.0),
        );

        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.set_state(None, &mut ctx);
        assert_eq!(obj.state_kind(), None);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_disallowed_state_is_dropped() {
        let settings = WorldSettings::default();
        let mut scheduler = Scheduler::new();
        let mut colliders = CollisionManager::new();
        let mut audio = NullAudio;
        let mut commands = Vec::new();
        let mut obj = grounded_walker();

        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.set_state(Some(StateKind::Idle), &mut ctx);
        obj.set_state(Some(StateKind::Rotation), &mut ctx);
        assert_eq!(obj.state_kind(), Some(StateKind::Idle));
    }

    #[test]
    fn test_same_state_request_keeps_walk_untouched() {
        let settings = WorldSettings::default();
        let mut scheduler = Scheduler::new();
        let mut colliders = CollisionManager::new();
        let mut audio = NullAudio;
        let mut commands = Vec::new();
        let mut obj = grounded_walker();
        // bind a step cue so walk arms its footstep loop
        let mut cues = BTreeMap::new();
        cues.insert(SoundCue::Step, "drifter/steps".to_owned());
        obj.sounds = Some(SoundSet::new(cues));

        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.set_state(Some(StateKind::Walk), &mut ctx);
        let footsteps = match obj.state {
            Some(EntityState::Walk { footsteps }) => footsteps,
            ref other => panic!("expected walk, got {other:?}"),
        };
        assert_eq!(footsteps, Some(TimerId(0)));

        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.set_state(Some(StateKind::Walk), &mut ctx);
        match obj.state {
            Some(EntityState::Walk { footsteps: same }) => assert_eq!(same, footsteps),
            ref other => panic!("expected walk, got {other:?}"),
        }
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_update_walks_then_jumps() {
        let settings = WorldSettings::default();
        let mut scheduler = Scheduler::new();
        let mut colliders = CollisionManager::new();
        let mut audio = NullAudio;
        let mut commands = Vec::new();
        let mut obj = grounded_walker();

        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.set_state(Some(StateKind::Idle), &mut ctx);

        let start_x = obj.position.x;
        if let Some(movement) = obj.movement.as_mut() {
            movement.move_right = true;
        }
        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.update(&mut ctx);
        assert!(obj.position.x > start_x);
        assert_eq!(obj.state_kind(), Some(StateKind::Walk));
        assert_eq!(obj.facing, Facing::Right);

        if let Some(movement) = obj.movement.as_mut() {
            movement.jump = true;
        }
        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.update(&mut ctx);
        assert_eq!(obj.state_kind(), Some(StateKind::Jump));
        assert!(obj.movement.as_ref().is_some_and(|m| m.velocity.y < 0.0));
    }

    #[test]
    fn test_landing_returns_jump_to_default() {
        let settings = WorldSettings::default();
        let mut scheduler = Scheduler::new();
        let mut colliders = CollisionManager::new();
        let mut audio = NullAudio;
        let mut commands = Vec::new();
        let mut obj = grounded_walker();
        obj.position.y = settings.floor_y - 86.0 - 200.0;

        let mut ctx = SimCtx {
            settings: &settings,
            scheduler: &mut scheduler,
            colliders: &mut colliders,
            audio: &mut audio,
            commands: &mut commands,
        };
        obj.set_state(Some(StateKind::Jump), &mut ctx);

        for _ in 0..120 {
            let mut ctx = SimCtx {
                settings: &settings,
                scheduler: &mut scheduler,
                colliders: &mut colliders,
                audio: &mut audio,
                commands: &mut commands,
            };
            obj.update(&mut ctx);
            if obj.state_kind() == Some(StateKind::Idle) {
                break;
            }
        }

        assert_eq!(obj.state_kind(), Some(StateKind::Idle));
        assert_eq!(obj.position.y, settings.floor_y - 86.0);
    }
}
