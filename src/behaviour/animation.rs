//! Frame animation
//!
//! Strips advance on a fixed per-frame duration in milliseconds, decoupled
//! from the tick delta: a 100ms frame shows for 100ms whether the host runs
//! at 30 or 144 fps. Three playback modes: looping, play-once with a
//! completion command delivered exactly once per play-through, and
//! ping-pong (bounces between the ends without doubling them).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assets::ImageHandle;
use crate::command::SimCommand;

/// Every pose an entity can show. A species only defines the subset it
/// uses; switching to an undefined one is a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimKind {
    Idle,
    IdleLong,
    Walk,
    Jump,
    Hurt,
    Dead,
    Alert,
    Attack,
    Rotation,
    Shatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    Loop,
    Once,
    PingPong,
}

/// What a finished `Once` strip does; resolved against the owning entity
/// at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnComplete {
    DespawnSelf,
}

/// Profile-side strip definition: frame asset keys plus playback data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripDef {
    pub frames: Vec<String>,
    pub frame_ms: f64,
    pub mode: PlayMode,
    #[serde(default)]
    pub on_complete: Option<OnComplete>,
}

/// A strip with its frame keys resolved to host image handles
#[derive(Debug, Clone)]
pub struct Strip {
    frames: Vec<ImageHandle>,
    frame_ms: f64,
    mode: PlayMode,
    on_complete: Option<SimCommand>,
}

impl Strip {
    pub fn new(
        frames: Vec<ImageHandle>,
        frame_ms: f64,
        mode: PlayMode,
        on_complete: Option<SimCommand>,
    ) -> Self {
        Self {
            frames,
            frame_ms,
            mode,
            on_complete,
        }
    }
}

/// Per-entity animation state
#[derive(Debug, Clone)]
pub struct Animation {
    strips: BTreeMap<AnimKind, Strip>,
    current: AnimKind,
    frame: usize,
    elapsed_ms: f64,
    /// Ping-pong travel direction.
    forward: bool,
    /// A `Once` strip ran to the end; its completion is spent until the
    /// strip is set again.
    completed: bool,
}

impl Animation {
    /// `initial` must be one of the provided strips; the factory validates
    /// that before construction.
    pub fn new(strips: BTreeMap<AnimKind, Strip>, initial: AnimKind) -> Self {
        Self {
            strips,
            current: initial,
            frame: 0,
            elapsed_ms: 0.0,
            forward: true,
            completed: false,
        }
    }

    pub fn current_kind(&self) -> AnimKind {
        self.current
    }

    pub fn has(&self, kind: AnimKind) -> bool {
        self.strips.contains_key(&kind)
    }

    /// The image to draw right now.
    pub fn current_image(&self) -> Option<ImageHandle> {
        let strip = self.strips.get(&self.current)?;
        strip.frames.get(self.frame).copied()
    }

    /// Switch strips (or restart the current one). Unknown kinds are a
    /// silent no-op. Restarting re-arms a spent completion.
    pub fn set(&mut self, kind: AnimKind) {
        if !self.strips.contains_key(&kind) {
            return;
        }
        self.current = kind;
        self.frame = 0;
        self.elapsed_ms = 0.0;
        self.forward = true;
        self.completed = false;
    }

    /// Advance by the tick delta; returns the completion command when a
    /// `Once` strip finishes this update.
    pub fn update(&mut self, dt_ms: f64) -> Option<SimCommand> {
        let Some(strip) = self.strips.get(&self.current) else {
            return None;
        };
        if strip.frames.is_empty() || strip.frame_ms <= 0.0 {
            return None;
        }

        let last = strip.frames.len() - 1;
        let mut fired = None;
        self.elapsed_ms += dt_ms;
        while self.elapsed_ms >= strip.frame_ms {
            self.elapsed_ms -= strip.frame_ms;
            match strip.mode {
                PlayMode::Loop => {
                    self.frame = (self.frame + 1) % strip.frames.len();
                }
                PlayMode::Once => {
                    if self.frame < last {
                        self.frame += 1;
                    } else if !self.completed {
                        // Held on the last frame; deliver the completion
                        // exactly once for this play-through.
                        self.completed = true;
                        fired = strip.on_complete.clone();
                    }
                }
                PlayMode::PingPong => {
                    if self.forward {
                        if self.frame >= last {
                            self.forward = false;
                            self.frame = self.frame.saturating_sub(1);
                        } else {
                            self.frame += 1;
                        }
                    } else if self.frame == 0 {
                        self.forward = true;
                        self.frame = last.min(1);
                    } else {
                        self.frame -= 1;
                    }
                }
            }
        }
        fired
    }
}
