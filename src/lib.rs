//! Deterministic simulation core for a 2D side-scrolling action game
//!
//! Everything that moves lives behind [`Simulation`]: a pausable timer
//! wheel drives fixed update passes, entities are assembled from pluggable
//! behaviour parts, an O(n^2) pair scan resolves contacts, and one-shot
//! watchers fire scripted consequences. The crate renders nothing and
//! opens no window; hosts feed it frame deltas and input, then draw the
//! [`RenderView`] it hands back.
//!
//! ```
//! use dustrun::{
//!     NullAudio, NullStatus, ProfileSet, Simulation, SpeciesKind, StaticAssets, Vec2,
//!     WorldSettings,
//! };
//!
//! # fn main() -> dustrun::SimResult<()> {
//! let profiles = ProfileSet::builtin();
//! let assets = StaticAssets::preloaded(&profiles.manifest());
//! let mut sim = Simulation::with_profiles(
//!     WorldSettings::default(),
//!     profiles,
//!     Box::new(assets),
//!     Box::new(NullAudio),
//!     Box::new(NullStatus),
//! )?;
//!
//! let hero = sim.spawn(SpeciesKind::Drifter, Vec2::new(120.0, 354.0))?;
//! sim.tick(16.7)?;
//! assert!(sim.contains(hero));
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod audio;
pub mod behaviour;
pub mod collision;
pub mod command;
pub mod entity;
pub mod error;
pub mod math;
pub mod settings;
pub mod state;
pub mod status;
pub mod timing;
pub mod trigger;
pub mod world;

pub use assets::{AssetManifest, AssetProvider, ImageHandle, StaticAssets};
pub use audio::{NullAudio, SoundSink};
pub use behaviour::ResourceKind;
pub use entity::{EntityId, Facing, GameObject, ProfileSet, SpeciesKind, SpeciesProfile};
pub use error::{SimError, SimResult};
pub use math::Vec2;
pub use settings::{SpawnPlan, WorldSettings};
pub use state::StateKind;
pub use status::{NullStatus, StatusSink};
pub use world::{InputIntent, RenderView, Simulation, Sprite};
