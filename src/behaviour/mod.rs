//! Pluggable entity behaviours
//!
//! An entity is assembled from optional parts instead of a class
//! hierarchy: movement, gravity, animation, collision, resources, sounds
//! and triggers are each a slot a species profile may or may not fill.
//! Each part carries a serde-friendly `*Def` for profiles and a live
//! runtime struct the factory builds from it.

pub mod animation;
pub mod collision;
pub mod gravity;
pub mod movement;
pub mod resource;
pub mod sound;
pub mod trigger;

pub use animation::{AnimKind, Animation, OnComplete, PlayMode, Strip, StripDef};
pub use collision::{CollisionBody, CollisionDef, Insets};
pub use gravity::{Gravity, GravityDef, LandAction};
pub use movement::{Movement, MovementDef};
pub use resource::{Resource, ResourceKind, Resources};
pub use sound::{SoundCue, SoundSet};
pub use trigger::{TriggerAction, TriggerDef, TriggerWhen};
