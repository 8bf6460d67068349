//! Species profiles
//!
//! Everything that distinguishes one species from another is data in a
//! [`SpeciesProfile`]: dimensions, which behaviour slots are filled, the
//! animation strips, the cue table, the allowed states. The factory turns
//! a profile into a live entity; nothing downstream switches on species
//! except through these fields.
//!
//! The builtin roster covers every species; a RON override can replace
//! individual profiles wholesale for tuning without a recompile.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::AssetManifest;
use crate::behaviour::animation::{AnimKind, OnComplete, PlayMode, StripDef};
use crate::behaviour::collision::{CollisionDef, Insets};
use crate::behaviour::gravity::{GravityDef, LandAction};
use crate::behaviour::movement::MovementDef;
use crate::behaviour::resource::{Resource, ResourceKind, Resources};
use crate::behaviour::sound::SoundCue;
use crate::behaviour::trigger::{TriggerAction, TriggerDef, TriggerWhen};
use crate::error::{SimError, SimResult};
use crate::math::Vec2;
use crate::state::StateKind;

/// Every species the simulation can spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpeciesKind {
    /// The player character.
    Drifter,
    /// Ground enemy, marches and bites.
    Scuttler,
    /// Small ground enemy, faster and weaker.
    Hatchling,
    /// The boss: slow, heavy contact damage, alerts when approached.
    Broodmother,
    /// Thrown projectile, shatters on anything it hits.
    Flask,
    /// Currency pickup.
    Coin,
    /// Health pickup.
    Phial,
}

impl SpeciesKind {
    pub const ALL: [SpeciesKind; 7] = [
        SpeciesKind::Drifter,
        SpeciesKind::Scuttler,
        SpeciesKind::Hatchling,
        SpeciesKind::Broodmother,
        SpeciesKind::Flask,
        SpeciesKind::Coin,
        SpeciesKind::Phial,
    ];

    /// Lowercase name used in asset and sound keys.
    pub fn name(self) -> &'static str {
        match self {
            SpeciesKind::Drifter => "drifter",
            SpeciesKind::Scuttler => "scuttler",
            SpeciesKind::Hatchling => "hatchling",
            SpeciesKind::Broodmother => "broodmother",
            SpeciesKind::Flask => "flask",
            SpeciesKind::Coin => "coin",
            SpeciesKind::Phial => "phial",
        }
    }

    pub fn is_enemy(self) -> bool {
        matches!(
            self,
            SpeciesKind::Scuttler | SpeciesKind::Hatchling | SpeciesKind::Broodmother
        )
    }
}

impl fmt::Display for SpeciesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One species, fully described
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesProfile {
    /// Sprite size in pixels; the collider shrinks this by insets.
    pub dimensions: Vec2,
    #[serde(default)]
    pub movement: Option<MovementDef>,
    #[serde(default)]
    pub gravity: Option<GravityDef>,
    #[serde(default)]
    pub strips: BTreeMap<AnimKind, StripDef>,
    /// Required whenever `strips` is non-empty.
    #[serde(default)]
    pub initial_anim: Option<AnimKind>,
    #[serde(default)]
    pub collision: Option<CollisionDef>,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub sounds: BTreeMap<SoundCue, String>,
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
    #[serde(default)]
    pub allowed_states: BTreeSet<StateKind>,
    #[serde(default)]
    pub default_state: Option<StateKind>,
}

impl SpeciesProfile {
    /// Reject profiles the factory could not build a working entity from.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dimensions.x > 0.0) || !(self.dimensions.y > 0.0) {
            return Err(SimError::config(format!(
                "dimensions must be positive, got ({}, {})",
                self.dimensions.x, self.dimensions.y
            )));
        }
        if let Some(kind) = self.default_state {
            if !self.allowed_states.contains(&kind) {
                return Err(SimError::config(format!(
                    "default state {kind:?} is not in the allowed set"
                )));
            }
        }
        if !self.strips.is_empty() {
            let Some(initial) = self.initial_anim else {
                return Err(SimError::config("strips declared without initial_anim"));
            };
            if !self.strips.contains_key(&initial) {
                return Err(SimError::config(format!(
                    "initial animation {initial:?} has no strip"
                )));
            }
            for (kind, strip) in &self.strips {
                if strip.frames.is_empty() {
                    return Err(SimError::config(format!("strip {kind:?} has no frames")));
                }
                if !(strip.frame_ms > 0.0) {
                    return Err(SimError::config(format!(
                        "strip {kind:?} frame time must be positive"
                    )));
                }
            }
        }
        if let Some(movement) = &self.movement {
            if !movement.max_speed.is_finite() || movement.max_speed < 0.0 {
                return Err(SimError::config(format!(
                    "max_speed must be finite and non-negative, got {}",
                    movement.max_speed
                )));
            }
            if !(0.0..1.0).contains(&movement.jitter) {
                return Err(SimError::config(format!(
                    "speed jitter must be in [0, 1), got {}",
                    movement.jitter
                )));
            }
        }
        Ok(())
    }
}

fn strip(species: &str, pose: &str, frames: usize, frame_ms: f64, mode: PlayMode) -> StripDef {
    StripDef {
        frames: (0..frames)
            .map(|i| format!("{species}/{pose}_{i:02}"))
            .collect(),
        frame_ms,
        mode,
        on_complete: None,
    }
}

fn sounds(pairs: &[(SoundCue, &str)]) -> BTreeMap<SoundCue, String> {
    pairs
        .iter()
        .map(|(cue, key)| (*cue, (*key).to_owned()))
        .collect()
}

fn walker(max_speed: f32, jitter: f32) -> MovementDef {
    MovementDef {
        max_speed,
        jump_speed: 0.0,
        intent_driven: true,
        clamp_to_world: false,
        jitter,
    }
}

/// The builtin profile for one species; the factory is exhaustive, so a
/// new species will not compile until it has a profile.
pub fn builtin(kind: SpeciesKind) -> SpeciesProfile {
    let name = kind.name();
    match kind {
        SpeciesKind::Drifter => SpeciesProfile {
            dimensions: Vec2::new(46.0, 86.0),
            movement: Some(MovementDef {
                max_speed: 260.0,
                jump_speed: 760.0,
                intent_driven: true,
                clamp_to_world: true,
                jitter: 0.0,
            }),
            gravity: Some(GravityDef::default()),
            strips: [
                (AnimKind::Idle, strip(name, "idle", 4, 140.0, PlayMode::Loop)),
                (
                    AnimKind::IdleLong,
                    strip(name, "idle_long", 6, 180.0, PlayMode::Loop),
                ),
                (AnimKind::Walk, strip(name, "walk", 6, 90.0, PlayMode::Loop)),
                (AnimKind::Jump, strip(name, "jump", 2, 120.0, PlayMode::Loop)),
                (
                    AnimKind::Hurt,
                    strip(name, "hurt", 2, 90.0, PlayMode::PingPong),
                ),
                (AnimKind::Dead, strip(name, "dead", 6, 150.0, PlayMode::Once)),
            ]
            .into_iter()
            .collect(),
            initial_anim: Some(AnimKind::Idle),
            collision: Some(CollisionDef {
                insets: Insets {
                    top: 8.0,
                    right: 10.0,
                    bottom: 0.0,
                    left: 10.0,
                },
                targets: [
                    SpeciesKind::Scuttler,
                    SpeciesKind::Hatchling,
                    SpeciesKind::Broodmother,
                    SpeciesKind::Coin,
                    SpeciesKind::Phial,
                ]
                .into_iter()
                .collect(),
                strike: None,
                bounty: None,
                brittle: false,
            }),
            resources: {
                let mut resources = Resources::new();
                resources.insert(ResourceKind::Health, Resource::full(100, true));
                resources.insert(ResourceKind::Coins, Resource::new(0, 99, false));
                resources.insert(ResourceKind::Flasks, Resource::new(3, 5, false));
                resources
            },
            sounds: sounds(&[
                (SoundCue::Step, "drifter/steps"),
                (SoundCue::Jump, "drifter/jump"),
                (SoundCue::Hurt, "drifter/hurt"),
                (SoundCue::Die, "drifter/die"),
                (SoundCue::Throw, "drifter/throw"),
                (SoundCue::Snore, "drifter/snore"),
            ]),
            triggers: Vec::new(),
            allowed_states: [
                StateKind::Idle,
                StateKind::Walk,
                StateKind::Jump,
                StateKind::Hurt,
                StateKind::Dead,
            ]
            .into_iter()
            .collect(),
            default_state: Some(StateKind::Idle),
        },
        SpeciesKind::Scuttler => SpeciesProfile {
            dimensions: Vec2::new(58.0, 44.0),
            movement: Some(walker(120.0, 0.3)),
            gravity: Some(GravityDef::default()),
            strips: [
                (AnimKind::Walk, strip(name, "walk", 4, 110.0, PlayMode::Loop)),
                (
                    AnimKind::Hurt,
                    strip(name, "hurt", 2, 100.0, PlayMode::PingPong),
                ),
                (AnimKind::Dead, strip(name, "dead", 4, 140.0, PlayMode::Once)),
            ]
            .into_iter()
            .collect(),
            initial_anim: Some(AnimKind::Walk),
            collision: Some(CollisionDef {
                insets: Insets {
                    top: 4.0,
                    right: 6.0,
                    bottom: 0.0,
                    left: 6.0,
                },
                targets: [SpeciesKind::Drifter, SpeciesKind::Flask]
                    .into_iter()
                    .collect(),
                strike: Some(15),
                bounty: None,
                brittle: false,
            }),
            resources: {
                let mut resources = Resources::new();
                resources.insert(ResourceKind::Health, Resource::full(30, true));
                resources
            },
            sounds: sounds(&[
                (SoundCue::Hurt, "scuttler/hurt"),
                (SoundCue::Die, "scuttler/die"),
            ]),
            triggers: Vec::new(),
            allowed_states: [StateKind::Walk, StateKind::Hurt, StateKind::Dead]
                .into_iter()
                .collect(),
            default_state: Some(StateKind::Walk),
        },
        SpeciesKind::Hatchling => SpeciesProfile {
            dimensions: Vec2::new(34.0, 26.0),
            movement: Some(walker(150.0, 0.35)),
            gravity: Some(GravityDef::default()),
            strips: [
                (AnimKind::Walk, strip(name, "walk", 4, 90.0, PlayMode::Loop)),
                (
                    AnimKind::Hurt,
                    strip(name, "hurt", 2, 90.0, PlayMode::PingPong),
                ),
                (AnimKind::Dead, strip(name, "dead", 3, 120.0, PlayMode::Once)),
            ]
            .into_iter()
            .collect(),
            initial_anim: Some(AnimKind::Walk),
            collision: Some(CollisionDef {
                insets: Insets {
                    top: 2.0,
                    right: 4.0,
                    bottom: 0.0,
                    left: 4.0,
                },
                targets: [SpeciesKind::Drifter, SpeciesKind::Flask]
                    .into_iter()
                    .collect(),
                strike: Some(10),
                bounty: None,
                brittle: false,
            }),
            resources: {
                let mut resources = Resources::new();
                resources.insert(ResourceKind::Health, Resource::full(20, true));
                resources
            },
            sounds: sounds(&[
                (SoundCue::Hurt, "hatchling/hurt"),
                (SoundCue::Die, "hatchling/die"),
            ]),
            triggers: Vec::new(),
            allowed_states: [StateKind::Walk, StateKind::Hurt, StateKind::Dead]
                .into_iter()
                .collect(),
            default_state: Some(StateKind::Walk),
        },
        SpeciesKind::Broodmother => SpeciesProfile {
            dimensions: Vec2::new(160.0, 140.0),
            movement: Some(walker(70.0, 0.1)),
            gravity: Some(GravityDef::default()),
            strips: [
                (AnimKind::Idle, strip(name, "idle", 4, 200.0, PlayMode::Loop)),
                (AnimKind::Walk, strip(name, "walk", 4, 160.0, PlayMode::Loop)),
                (
                    AnimKind::Alert,
                    strip(name, "alert", 3, 140.0, PlayMode::Loop),
                ),
                (
                    AnimKind::Attack,
                    strip(name, "attack", 4, 110.0, PlayMode::Loop),
                ),
                (
                    AnimKind::Hurt,
                    strip(name, "hurt", 2, 120.0, PlayMode::PingPong),
                ),
                (AnimKind::Dead, strip(name, "dead", 6, 160.0, PlayMode::Once)),
            ]
            .into_iter()
            .collect(),
            initial_anim: Some(AnimKind::Idle),
            collision: Some(CollisionDef {
                insets: Insets {
                    top: 12.0,
                    right: 18.0,
                    bottom: 0.0,
                    left: 18.0,
                },
                targets: [SpeciesKind::Drifter, SpeciesKind::Flask]
                    .into_iter()
                    .collect(),
                strike: Some(30),
                bounty: None,
                brittle: false,
            }),
            resources: {
                let mut resources = Resources::new();
                resources.insert(ResourceKind::Health, Resource::full(120, true));
                resources
            },
            sounds: sounds(&[
                (SoundCue::Bellow, "broodmother/bellow"),
                (SoundCue::Chitter, "broodmother/chitter"),
                (SoundCue::Hurt, "broodmother/hurt"),
                (SoundCue::Die, "broodmother/die"),
            ]),
            triggers: vec![
                TriggerDef {
                    when: TriggerWhen::PlayerWithin { lead: 560.0 },
                    then: vec![TriggerAction::EnterState(StateKind::Alert)],
                },
                TriggerDef {
                    when: TriggerWhen::SelfDepleted {
                        kind: ResourceKind::Health,
                    },
                    then: vec![TriggerAction::SpawnOffset {
                        species: SpeciesKind::Phial,
                        offset: Vec2::new(60.0, -40.0),
                    }],
                },
                TriggerDef {
                    when: TriggerWhen::SelfDead,
                    then: vec![TriggerAction::SpawnOffset {
                        species: SpeciesKind::Coin,
                        offset: Vec2::new(200.0, 20.0),
                    }],
                },
            ],
            allowed_states: [
                StateKind::Idle,
                StateKind::Walk,
                StateKind::Alert,
                StateKind::Attack,
                StateKind::Hurt,
                StateKind::Dead,
            ]
            .into_iter()
            .collect(),
            default_state: Some(StateKind::Idle),
        },
        SpeciesKind::Flask => SpeciesProfile {
            dimensions: Vec2::new(24.0, 24.0),
            // max_speed and jump_speed double as the launch velocity; the
            // thrower applies them when it lofts the flask
            movement: Some(MovementDef {
                max_speed: 420.0,
                jump_speed: 320.0,
                intent_driven: false,
                clamp_to_world: false,
                jitter: 0.0,
            }),
            gravity: Some(GravityDef {
                acceleration: None,
                on_land: Some(LandAction::ShatterSelf),
            }),
            strips: [
                (
                    AnimKind::Rotation,
                    strip(name, "spin", 4, 70.0, PlayMode::Loop),
                ),
                (AnimKind::Shatter, {
                    let mut def = strip(name, "shatter", 3, 80.0, PlayMode::Once);
                    def.on_complete = Some(OnComplete::DespawnSelf);
                    def
                }),
            ]
            .into_iter()
            .collect(),
            initial_anim: Some(AnimKind::Rotation),
            collision: Some(CollisionDef {
                insets: Insets::uniform(2.0),
                targets: [
                    SpeciesKind::Scuttler,
                    SpeciesKind::Hatchling,
                    SpeciesKind::Broodmother,
                ]
                .into_iter()
                .collect(),
                strike: Some(25),
                bounty: None,
                brittle: true,
            }),
            resources: Resources::new(),
            sounds: sounds(&[(SoundCue::Shatter, "flask/shatter")]),
            triggers: Vec::new(),
            allowed_states: [StateKind::Rotation].into_iter().collect(),
            default_state: Some(StateKind::Rotation),
        },
        SpeciesKind::Coin => SpeciesProfile {
            dimensions: Vec2::new(28.0, 28.0),
            movement: None,
            gravity: None,
            strips: [(AnimKind::Idle, strip(name, "spin", 6, 100.0, PlayMode::Loop))]
                .into_iter()
                .collect(),
            initial_anim: Some(AnimKind::Idle),
            collision: Some(CollisionDef {
                insets: Insets::uniform(2.0),
                targets: [SpeciesKind::Drifter].into_iter().collect(),
                strike: None,
                bounty: Some((ResourceKind::Coins, 1)),
                brittle: false,
            }),
            resources: Resources::new(),
            sounds: sounds(&[(SoundCue::Collect, "coin/collect")]),
            triggers: Vec::new(),
            allowed_states: BTreeSet::new(),
            default_state: None,
        },
        SpeciesKind::Phial => SpeciesProfile {
            dimensions: Vec2::new(22.0, 30.0),
            movement: None,
            gravity: None,
            strips: [(AnimKind::Idle, strip(name, "glow", 4, 140.0, PlayMode::Loop))]
                .into_iter()
                .collect(),
            initial_anim: Some(AnimKind::Idle),
            collision: Some(CollisionDef {
                insets: Insets::uniform(2.0),
                targets: [SpeciesKind::Drifter].into_iter().collect(),
                strike: None,
                bounty: Some((ResourceKind::Health, 25)),
                brittle: false,
            }),
            resources: Resources::new(),
            sounds: sounds(&[(SoundCue::Collect, "phial/collect")]),
            triggers: Vec::new(),
            allowed_states: BTreeSet::new(),
            default_state: None,
        },
    }
}

/// The full roster, every species guaranteed present
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: BTreeMap<SpeciesKind, SpeciesProfile>,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileSet {
    pub fn builtin() -> Self {
        Self {
            profiles: SpeciesKind::ALL
                .into_iter()
                .map(|kind| (kind, builtin(kind)))
                .collect(),
        }
    }

    /// Every species is present by construction, so lookups are total.
    pub fn get(&self, kind: SpeciesKind) -> &SpeciesProfile {
        &self.profiles[&kind]
    }

    pub fn validate_all(&self) -> SimResult<()> {
        for (kind, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| SimError::config(format!("{kind} profile: {e}")))?;
        }
        Ok(())
    }

    /// Replace whole profiles from a RON map of species to profile.
    /// Species absent from the map keep their builtin.
    pub fn apply_overrides_str(&mut self, source: &str) -> SimResult<()> {
        let overrides: BTreeMap<SpeciesKind, SpeciesProfile> = ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(source)
            .map_err(|e| SimError::config(format!("bad profile ron: {e}")))?;
        for (kind, profile) in overrides {
            profile
                .validate()
                .map_err(|e| SimError::config(format!("{kind} override: {e}")))?;
            self.profiles.insert(kind, profile);
        }
        Ok(())
    }

    pub fn apply_overrides_path(&mut self, path: impl AsRef<Path>) -> SimResult<()> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SimError::config(format!("read profiles: {e}")))?;
        self.apply_overrides_str(&text)
    }

    /// Every asset key any species can display; the host loads this set
    /// up front.
    pub fn manifest(&self) -> AssetManifest {
        let mut manifest = AssetManifest::new();
        for profile in self.profiles.values() {
            for strip in profile.strips.values() {
                manifest.extend(strip.frames.iter().cloned());
            }
        }
        manifest
    }
}
