//! Entity construction
//!
//! The one path from profile to live entity. Frame keys resolve to host
//! handles here, so a missing asset fails the spawn instead of the draw,
//! and enemy walkers pick up their per-instance speed jitter from the
//! world's seeded rng. Construction is pure: the caller registers the
//! result with the world's registries.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::debug;

use crate::assets::AssetProvider;
use crate::behaviour::animation::{Animation, OnComplete, Strip};
use crate::behaviour::collision::CollisionBody;
use crate::behaviour::gravity::{Gravity, LandAction};
use crate::behaviour::movement::Movement;
use crate::behaviour::sound::SoundSet;
use crate::command::SimCommand;
use crate::error::{SimError, SimResult};
use crate::math::Vec2;

use super::profile::{SpeciesKind, SpeciesProfile};
use super::{EntityId, Facing, GameObject};

pub fn build(
    id: EntityId,
    species: SpeciesKind,
    profile: &SpeciesProfile,
    position: Vec2,
    assets: &dyn AssetProvider,
    rng: &mut SmallRng,
) -> SimResult<GameObject> {
    let mut obj = GameObject::new(id, species, position, profile.dimensions);

    if let Some(def) = &profile.movement {
        let mut max_speed = def.max_speed;
        if def.jitter > 0.0 {
            max_speed *= 1.0 + rng.gen_range(-def.jitter..=def.jitter);
        }
        let mut movement = Movement::from_def(def, max_speed);
        if def.intent_driven && species.is_enemy() {
            // enemies march left out of the gate
            movement.move_left = true;
            obj.facing = Facing::Left;
        }
        obj.movement = Some(movement);
    }

    if let Some(def) = &profile.gravity {
        let on_land = def.on_land.map(|action| match action {
            LandAction::ShatterSelf => SimCommand::Shatter { entity: id },
        });
        obj.gravity = Some(Gravity::new(def.acceleration, on_land));
    }

    if !profile.strips.is_empty() {
        let initial = profile
            .initial_anim
            .ok_or_else(|| SimError::config(format!("{species} strips without initial_anim")))?;
        let mut strips = BTreeMap::new();
        for (kind, def) in &profile.strips {
            let mut frames = Vec::with_capacity(def.frames.len());
            for key in &def.frames {
                let handle = assets
                    .image(key)
                    .ok_or_else(|| SimError::AssetNotLoaded(key.clone()))?;
                frames.push(handle);
            }
            let on_complete = def.on_complete.map(|action| match action {
                OnComplete::DespawnSelf => SimCommand::Despawn { entity: id },
            });
            strips.insert(*kind, Strip::new(frames, def.frame_ms, def.mode, on_complete));
        }
        obj.animation = Some(Animation::new(strips, initial));
    }

    if let Some(def) = &profile.collision {
        let mut body = CollisionBody::from_def(def);
        body.update(position, profile.dimensions);
        obj.collision = Some(body);
    }

    if !profile.resources.is_empty() {
        obj.resources = Some(profile.resources.clone());
    }

    if !profile.sounds.is_empty() {
        obj.sounds = Some(SoundSet::new(profile.sounds.clone()));
    }

    obj.allowed_states = profile.allowed_states.clone();
    obj.default_state = profile.default_state;

    debug!(entity = id.0, %species, x = position.x, y = position.y, "entity built");
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::assets::StaticAssets;
    use crate::entity::profile::{builtin, ProfileSet};
    use crate::state::StateKind;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn assets() -> StaticAssets {
        StaticAssets::preloaded(&ProfileSet::builtin().manifest())
    }

    #[test]
    fn test_missing_asset_fails_the_spawn() {
        let empty = StaticAssets::new();
        let profile = builtin(SpeciesKind::Coin);
        let err = build(
            EntityId(0),
            SpeciesKind::Coin,
            &profile,
            Vec2::ZERO,
            &empty,
            &mut rng(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::AssetNotLoaded(_)));
    }

    #[test]
    fn test_enemy_marches_left_with_jittered_speed() {
        let assets = assets();
        let profile = builtin(SpeciesKind::Scuttler);
        let obj = build(
            EntityId(1),
            SpeciesKind::Scuttler,
            &profile,
            Vec2::ZERO,
            &assets,
            &mut rng(),
        )
        .unwrap();

        let movement = obj.movement.unwrap();
        assert!(movement.move_left);
        assert_eq!(obj.facing, Facing::Left);

        let stock = profile.movement.unwrap().max_speed;
        assert!(movement.max_speed >= stock * 0.7);
        assert!(movement.max_speed <= stock * 1.3);
    }

    #[test]
    fn test_jitter_is_deterministic_per_seed() {
        let assets = assets();
        let profile = builtin(SpeciesKind::Hatchling);
        let a = build(
            EntityId(1),
            SpeciesKind::Hatchling,
            &profile,
            Vec2::ZERO,
            &assets,
            &mut rng(),
        )
        .unwrap();
        let b = build(
            EntityId(1),
            SpeciesKind::Hatchling,
            &profile,
            Vec2::ZERO,
            &assets,
            &mut rng(),
        )
        .unwrap();
        assert_eq!(
            a.movement.unwrap().max_speed,
            b.movement.unwrap().max_speed
        );
    }

    #[test]
    fn test_pickup_is_inert_scenery_with_a_body() {
        let assets = assets();
        let profile = builtin(SpeciesKind::Coin);
        let obj = build(
            EntityId(2),
            SpeciesKind::Coin,
            &profile,
            Vec2::new(50.0, 60.0),
            &assets,
            &mut rng(),
        )
        .unwrap();

        assert!(obj.movement.is_none());
        assert!(obj.gravity.is_none());
        assert!(obj.default_state.is_none());
        assert!(obj.animation.is_some());
        assert!(obj.collision.is_some());
    }

    #[test]
    fn test_flask_resolves_landing_to_shatter() {
        let assets = assets();
        let profile = builtin(SpeciesKind::Flask);
        let obj = build(
            EntityId(5),
            SpeciesKind::Flask,
            &profile,
            Vec2::ZERO,
            &assets,
            &mut rng(),
        )
        .unwrap();

        assert_eq!(
            obj.gravity.unwrap().on_land,
            Some(SimCommand::Shatter { entity: EntityId(5) })
        );
        assert_eq!(obj.default_state, Some(StateKind::Rotation));
        assert!(obj.collision.as_ref().is_some_and(|body| body.brittle));
    }
}
