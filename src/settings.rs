//! World settings and spawn plans
//!
//! Tunable constants for the simulation plus the RON-loadable layout that
//! seeds a run. Every field has a default, so a host can start from
//! `WorldSettings::default()` and override only what it cares about, or load
//! a full settings file from disk.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::SpeciesKind;
use crate::error::{SimError, SimResult};
use crate::math::Vec2;

/// Simulation-wide tunables (distance unit: pixels, time unit: ms)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Downward acceleration (pixels per second squared)
    pub gravity: f32,
    /// Floor line: y coordinate entity bottoms rest on
    pub floor_y: f32,
    /// Playable width; world-clamped entities stay inside [0, width]
    pub world_width: f32,
    /// Period of the primary update interval (ms)
    pub tick_interval_ms: f64,
    /// Idle time before an entity drops into its long-idle pose (ms)
    pub long_idle_delay_ms: f64,
    /// Time spent in the hurt state before recovering (ms)
    pub hurt_recovery_ms: f64,
    /// Invulnerability window granted after taking contact damage (ms)
    pub contact_cooldown_ms: f64,
    /// Delay between death and removal from the world (ms)
    pub death_cleanup_ms: f64,
    /// Footstep loop period while walking (ms)
    pub footstep_period_ms: f64,
    /// Snore loop period once long-idle sets in (ms)
    pub snore_period_ms: f64,
    /// Time an alerted boss takes to wind up an attack (ms)
    pub alert_windup_ms: f64,
    /// Duration of a boss attack lunge (ms)
    pub attack_duration_ms: f64,
    /// Horizontal speed of the attack lunge (pixels/second)
    pub attack_lunge_speed: f32,
    /// How far ahead of the tracked entity the camera looks
    pub camera_lead: f32,
    /// Seed for the per-run RNG (enemy speed jitter)
    pub rng_seed: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: 2400.0,
            floor_y: 440.0,
            world_width: 4320.0,
            tick_interval_ms: 1000.0 / 60.0,
            long_idle_delay_ms: 4000.0,
            hurt_recovery_ms: 600.0,
            contact_cooldown_ms: 1000.0,    // i-frames after a hit
            death_cleanup_ms: 1200.0,       // corpse lingers briefly
            footstep_period_ms: 280.0,
            snore_period_ms: 1600.0,
            alert_windup_ms: 900.0,
            attack_duration_ms: 500.0,
            attack_lunge_speed: 340.0,
            camera_lead: 190.0,
            rng_seed: 7,
        }
    }
}

impl WorldSettings {
    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.tick_interval_ms > 0.0) {
            return Err(SimError::config(format!(
                "tick_interval_ms must be positive, got {}",
                self.tick_interval_ms
            )));
        }
        if !(self.world_width > 0.0) {
            return Err(SimError::config(format!(
                "world_width must be positive, got {}",
                self.world_width
            )));
        }
        if !self.gravity.is_finite() || !self.floor_y.is_finite() {
            return Err(SimError::config("gravity and floor_y must be finite"));
        }
        Ok(())
    }

    pub fn from_ron_str(source: &str) -> SimResult<Self> {
        ron::from_str(source)
            .map_err(|e| SimError::config(format!("bad settings ron: {e}")))
    }

    pub fn from_ron_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SimError::config(format!("read settings: {e}")))?;
        Self::from_ron_str(&text)
    }
}

/// One entity placed at simulation start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub species: SpeciesKind,
    pub position: Vec2,
}

/// A deferred spawn armed as a one-shot watcher: when the tracked player
/// advances past `past_x`, the species appears at `position`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnGate {
    pub past_x: f32,
    pub species: SpeciesKind,
    pub position: Vec2,
}

/// The layout that seeds a run: immediate spawns plus gated ones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPlan {
    pub spawns: Vec<SpawnEntry>,
    pub gates: Vec<SpawnGate>,
}

impl SpawnPlan {
    pub fn from_ron_str(source: &str) -> SimResult<Self> {
        ron::from_str(source)
            .map_err(|e| SimError::config(format!("bad spawn plan ron: {e}")))
    }

    pub fn from_ron_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SimError::config(format!("read spawn plan: {e}")))?;
        Self::from_ron_str(&text)
    }
}
