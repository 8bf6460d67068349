//! Per-entity collision participation
//!
//! A body is a sprite rect shrunk by directional insets, a whitelist of
//! species it reacts to, and the contact facets applied when a pair
//! overlaps. Cooldowns give struck entities invulnerability frames by
//! parking attacker species outside the whitelist until a timer puts them
//! back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::behaviour::resource::ResourceKind;
use crate::collision::Rect;
use crate::command::SimCommand;
use crate::entity::{EntityId, SpeciesKind};
use crate::math::Vec2;
use crate::timing::{Scheduler, TimerId};

/// Directional shrink from the sprite rect to the collider
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Insets {
    pub fn uniform(inset: f32) -> Self {
        Self {
            top: inset,
            right: inset,
            bottom: inset,
            left: inset,
        }
    }
}

/// Profile-side collision constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionDef {
    #[serde(default)]
    pub insets: Insets,
    /// Species this body reacts to on contact.
    pub targets: BTreeSet<SpeciesKind>,
    /// Health damage dealt to whatever this body touches.
    #[serde(default)]
    pub strike: Option<u32>,
    /// Resource granted to whatever touches this body; the body despawns
    /// once collected.
    #[serde(default)]
    pub bounty: Option<(ResourceKind, u32)>,
    /// The body breaks on its first contact (and on landing, if its
    /// gravity says so).
    #[serde(default)]
    pub brittle: bool,
}

/// Live collision state for one entity
#[derive(Debug, Clone)]
pub struct CollisionBody {
    insets: Insets,
    /// Active whitelist; cooldowns park entries in `suppressed`.
    targets: BTreeSet<SpeciesKind>,
    suppressed: BTreeSet<SpeciesKind>,
    cooldown: Option<TimerId>,
    /// Derived collider, refreshed by [`CollisionBody::update`].
    rect: Rect,
    pub strike: Option<u32>,
    pub bounty: Option<(ResourceKind, u32)>,
    pub brittle: bool,
}

impl CollisionBody {
    pub fn from_def(def: &CollisionDef) -> Self {
        Self {
            insets: def.insets,
            targets: def.targets.clone(),
            suppressed: BTreeSet::new(),
            cooldown: None,
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            strike: def.strike,
            bounty: def.bounty,
            brittle: def.brittle,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn targets_species(&self, species: SpeciesKind) -> bool {
        self.targets.contains(&species)
    }

    /// Whether an invulnerability window is currently open.
    pub fn in_cooldown(&self) -> bool {
        self.cooldown.is_some()
    }

    /// Per-tick refresh of the derived collider.
    pub fn update(&mut self, position: Vec2, dimensions: Vec2) {
        self.rect = Rect::from_entity(position, dimensions, self.insets);
    }

    /// Open (or re-open) an invulnerability window against the given
    /// species. A fresh request resets the in-flight window rather than
    /// stacking a second timer; the single restore carries every species
    /// parked so far.
    pub fn add_cooldown(
        &mut self,
        owner: EntityId,
        species: &[SpeciesKind],
        duration_ms: f64,
        scheduler: &mut Scheduler<SimCommand>,
    ) {
        if let Some(old) = self.cooldown.take() {
            scheduler.kill(old);
        }
        for kind in species {
            if self.targets.remove(kind) {
                self.suppressed.insert(*kind);
            }
        }
        if self.suppressed.is_empty() {
            return;
        }
        let restore = SimCommand::RestoreTargets {
            entity: owner,
            species: self.suppressed.iter().copied().collect(),
        };
        self.cooldown = Some(scheduler.start_timer(restore, duration_ms, true));
    }

    /// Applied when the restore timer fires: put species back in the
    /// whitelist.
    pub fn restore_targets(&mut self, species: &[SpeciesKind]) {
        for kind in species {
            if self.suppressed.remove(kind) {
                self.targets.insert(*kind);
            }
        }
        if self.suppressed.is_empty() {
            self.cooldown = None;
        }
    }

    /// Kill the restore timer without waiting for it; the destroy path
    /// calls this so no timer outlives its owner.
    pub fn kill_timers(&mut self, scheduler: &mut Scheduler<SimCommand>) {
        if let Some(id) = self.cooldown.take() {
            scheduler.kill(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> CollisionDef {
        CollisionDef {
            insets: Insets::default(),
            targets: [SpeciesKind::Scuttler, SpeciesKind::Flask]
                .into_iter()
                .collect(),
            strike: None,
            bounty: None,
            brittle: false,
        }
    }

    fn restore(body: &mut CollisionBody, fired: Vec<SimCommand>) -> usize {
        let mut count = 0;
        for command in fired {
            match command {
                SimCommand::RestoreTargets { species, .. } => {
                    body.restore_targets(&species);
                    count += 1;
                }
                other => panic!("unexpected command {other:?}"),
            }
        }
        count
    }

    #[test]
    fn test_rect_tracks_position_with_insets() {
        let mut body = CollisionBody::from_def(&CollisionDef {
            insets: Insets {
                top: 2.0,
                right: 4.0,
                bottom: 0.0,
                left: 4.0,
            },
            ..def()
        });

        body.update(Vec2::new(10.0, 20.0), Vec2::new(30.0, 40.0));
        assert_eq!(body.rect(), Rect::new(14.0, 22.0, 22.0, 38.0));
    }

    #[test]
    fn test_cooldown_parks_targets_until_restore() {
        let mut scheduler: Scheduler<SimCommand> = Scheduler::new();
        let mut body = CollisionBody::from_def(&def());
        assert!(body.targets_species(SpeciesKind::Scuttler));

        body.add_cooldown(EntityId(3), &[SpeciesKind::Scuttler], 500.0, &mut scheduler);
        assert!(body.in_cooldown());
        assert!(!body.targets_species(SpeciesKind::Scuttler));
        assert!(body.targets_species(SpeciesKind::Flask));

        let batch = scheduler.tick(500.0);
        assert_eq!(restore(&mut body, batch.fired), 1);
        assert!(!body.in_cooldown());
        assert!(body.targets_species(SpeciesKind::Scuttler));
    }

    #[test]
    fn test_fresh_cooldown_resets_the_window() {
        let mut scheduler: Scheduler<SimCommand> = Scheduler::new();
        let mut body = CollisionBody::from_def(&def());

        body.add_cooldown(EntityId(3), &[SpeciesKind::Scuttler], 500.0, &mut scheduler);
        let batch = scheduler.tick(400.0);
        assert!(batch.fired.is_empty());

        // second hit 400ms in restarts the window and folds both species
        // into the one restore
        body.add_cooldown(EntityId(3), &[SpeciesKind::Flask], 500.0, &mut scheduler);
        let batch = scheduler.tick(400.0);
        assert!(batch.fired.is_empty(), "old window must not fire");
        assert!(!body.targets_species(SpeciesKind::Scuttler));
        assert!(!body.targets_species(SpeciesKind::Flask));

        let batch = scheduler.tick(100.0);
        assert_eq!(restore(&mut body, batch.fired), 1);
        assert!(body.targets_species(SpeciesKind::Scuttler));
        assert!(body.targets_species(SpeciesKind::Flask));
        assert!(!body.in_cooldown());
    }

    #[test]
    fn test_unlisted_species_never_enters_the_whitelist() {
        let mut scheduler: Scheduler<SimCommand> = Scheduler::new();
        let mut body = CollisionBody::from_def(&def());

        // Drifter was never a target; the cooldown must not smuggle it in
        body.add_cooldown(EntityId(3), &[SpeciesKind::Drifter], 500.0, &mut scheduler);
        assert!(!body.in_cooldown());

        let batch = scheduler.tick(500.0);
        assert!(batch.fired.is_empty());
        assert!(!body.targets_species(SpeciesKind::Drifter));
    }
}
