//! Pairwise collision detection
//!
//! Every registered entity is tested against every other once per update
//! pass. The roster is small (a level holds tens of entities, not
//! thousands), so the O(n squared) scan stays cheap and keeps detection
//! order obvious: pairs come out in registration order, and within a pair
//! the earlier registration is `first`.

use std::collections::BTreeMap;

use tracing::trace;

use crate::behaviour::collision::Insets;
use crate::entity::{EntityId, GameObject};
use crate::math::Vec2;

/// Axis-aligned box, y growing downward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The sprite rect shrunk by directional insets.
    pub fn from_entity(position: Vec2, dimensions: Vec2, insets: Insets) -> Self {
        Self {
            x: position.x + insets.left,
            y: position.y + insets.top,
            width: dimensions.x - insets.left - insets.right,
            height: dimensions.y - insets.top - insets.bottom,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Strict overlap: rects sharing only a boundary edge do not touch.
    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.x + self.width <= other.x || other.x + other.width <= self.x {
            return false;
        }
        if self.y + self.height <= other.y || other.y + other.height <= self.y {
            return false;
        }
        true
    }
}

/// One overlapping pair; `first` registered before `second`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub first: EntityId,
    pub second: EntityId,
    /// Midpoint between the two collider centers.
    pub point: Vec2,
}

/// Registry of collision participants, scanned all-pairs
#[derive(Debug, Default)]
pub struct CollisionManager {
    members: Vec<EntityId>,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity to the scan. Re-registering keeps the original slot.
    pub fn register(&mut self, id: EntityId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    pub fn deregister(&mut self, id: EntityId) {
        self.members.retain(|member| *member != id);
    }

    pub fn is_registered(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// One full pair scan. A pair produces a contact only when both
    /// bodies are out of cooldown, each species is on the other's
    /// whitelist and the rects strictly overlap.
    pub fn check_all(&self, entities: &BTreeMap<EntityId, GameObject>) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for i in 0..self.members.len() {
            for j in (i + 1)..self.members.len() {
                let (Some(a), Some(b)) = (
                    entities.get(&self.members[i]),
                    entities.get(&self.members[j]),
                ) else {
                    continue;
                };
                let (Some(body_a), Some(body_b)) = (a.collision.as_ref(), b.collision.as_ref())
                else {
                    continue;
                };
                if body_a.in_cooldown() || body_b.in_cooldown() {
                    continue;
                }
                if !body_a.targets_species(b.species) || !body_b.targets_species(a.species) {
                    continue;
                }
                if !body_a.rect().overlaps(&body_b.rect()) {
                    continue;
                }
                trace!(first = a.id.0, second = b.id.0, "contact");
                contacts.push(Contact {
                    first: a.id,
                    second: b.id,
                    point: Vec2::average(&[body_a.rect().center(), body_b.rect().center()]),
                });
            }
        }
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::collision::{CollisionBody, CollisionDef};
    use crate::entity::SpeciesKind;

    fn entity(id: u64, species: SpeciesKind, x: f32, targets: &[SpeciesKind]) -> GameObject {
        let mut obj = GameObject::new(
            EntityId(id),
            species,
            Vec2::new(x, 0.0),
            Vec2::new(20.0, 20.0),
        );
        let mut body = CollisionBody::from_def(&CollisionDef {
            insets: Insets::default(),
            targets: targets.iter().copied().collect(),
            strike: None,
            bounty: None,
            brittle: false,
        });
        body.update(obj.position, obj.dimensions);
        obj.collision = Some(body);
        obj
    }

    fn world_of(entities: Vec<GameObject>) -> (CollisionManager, BTreeMap<EntityId, GameObject>) {
        let mut manager = CollisionManager::new();
        let mut map = BTreeMap::new();
        for obj in entities {
            manager.register(obj.id);
            map.insert(obj.id, obj);
        }
        (manager, map)
    }

    #[test]
    fn test_boundary_touch_is_not_overlap() {
        let a = Rect::new(0.0, 0.0, 20.0, 20.0);
        assert!(!a.overlaps(&Rect::new(20.0, 0.0, 20.0, 20.0)));
        assert!(!a.overlaps(&Rect::new(0.0, 20.0, 20.0, 20.0)));
        assert!(a.overlaps(&Rect::new(19.5, 0.0, 20.0, 20.0)));
        // symmetry
        assert!(Rect::new(19.5, 0.0, 20.0, 20.0).overlaps(&a));
    }

    #[test]
    fn test_contact_needs_mutual_whitelist() {
        let (manager, entities) = world_of(vec![
            entity(0, SpeciesKind::Drifter, 0.0, &[SpeciesKind::Scuttler]),
            entity(1, SpeciesKind::Scuttler, 10.0, &[]),
        ]);
        assert!(manager.check_all(&entities).is_empty());

        let (manager, entities) = world_of(vec![
            entity(0, SpeciesKind::Drifter, 0.0, &[SpeciesKind::Scuttler]),
            entity(1, SpeciesKind::Scuttler, 10.0, &[SpeciesKind::Drifter]),
        ]);
        let contacts = manager.check_all(&entities);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].first, EntityId(0));
        assert_eq!(contacts[0].second, EntityId(1));
        // midpoint of the two collider centers
        assert_eq!(contacts[0].point, Vec2::new(15.0, 10.0));
    }

    #[test]
    fn test_cooldown_suppresses_the_pair() {
        let mut scheduler = crate::timing::Scheduler::new();
        let (manager, mut entities) = world_of(vec![
            entity(0, SpeciesKind::Drifter, 0.0, &[SpeciesKind::Scuttler]),
            entity(1, SpeciesKind::Scuttler, 10.0, &[SpeciesKind::Drifter]),
        ]);
        assert_eq!(manager.check_all(&entities).len(), 1);

        if let Some(body) = entities
            .get_mut(&EntityId(0))
            .and_then(|obj| obj.collision.as_mut())
        {
            body.add_cooldown(EntityId(0), &[SpeciesKind::Scuttler], 500.0, &mut scheduler);
        }
        assert!(manager.check_all(&entities).is_empty());
    }

    #[test]
    fn test_deregistered_entity_is_skipped() {
        let (mut manager, entities) = world_of(vec![
            entity(0, SpeciesKind::Drifter, 0.0, &[SpeciesKind::Scuttler]),
            entity(1, SpeciesKind::Scuttler, 10.0, &[SpeciesKind::Drifter]),
        ]);
        manager.deregister(EntityId(1));
        assert!(manager.check_all(&entities).is_empty());
        assert_eq!(manager.len(), 1);
        assert!(!manager.is_registered(EntityId(1)));
    }
}
