//! Deferred simulation commands
//!
//! Timers, intervals, trigger watchers and contact effects all need to act
//! on the world later, from places that cannot hold a mutable borrow of it.
//! Instead of callbacks they carry values of this closed command set; the
//! world applies them at well-defined points in the tick, one mutable
//! borrow at a time.

use crate::behaviour::resource::ResourceKind;
use crate::entity::{EntityId, SpeciesKind};
use crate::math::Vec2;
use crate::state::StateKind;

/// Everything a deferred action is allowed to do to the world
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    /// Run one fixed step of entity updates, the collision pass and the
    /// trigger pass. Emitted by the primary interval.
    RunUpdates,
    /// Request a state transition; None selects the entity's default state.
    SetState {
        entity: EntityId,
        kind: Option<StateKind>,
    },
    /// An idle entity has been still long enough to drop into its
    /// long-idle pose.
    BeginLongIdle { entity: EntityId },
    /// A contact cooldown elapsed: put the species back in the entity's
    /// target set.
    RestoreTargets {
        entity: EntityId,
        species: Vec<SpeciesKind>,
    },
    /// Bring a new entity into the world.
    Spawn {
        species: SpeciesKind,
        position: Vec2,
    },
    /// Remove an entity from the world and every registry.
    Despawn { entity: EntityId },
    /// Start the shatter sequence of a brittle entity (one-shot animation,
    /// then despawn).
    Shatter { entity: EntityId },
    PlaySound { key: String },
    StopSound { key: String },
    FadeOutSound { key: String, over_ms: f64 },
}

/// World predicates evaluated by the simulation on behalf of interval stop
/// conditions and trigger watchers.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The entity's x position passed this line (moving right).
    PastX { entity: EntityId, x: f32 },
    /// The entity is in its dead state (still present as a corpse).
    Dead(EntityId),
    /// The entity has been removed from the world entirely.
    Gone(EntityId),
    /// A resource counter reached zero.
    Depleted {
        entity: EntityId,
        kind: ResourceKind,
    },
}
