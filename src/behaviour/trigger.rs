//! Trigger templates
//!
//! Profiles describe one-shot reactions in terms of the entity that will
//! own them ("when the player gets close, go alert"; "when I die, drop a
//! phial"). The spawn path resolves each template against concrete entity
//! ids and positions into a [`Watcher`] for the trigger registry.

use serde::{Deserialize, Serialize};

use crate::behaviour::resource::ResourceKind;
use crate::command::{Condition, SimCommand};
use crate::entity::{EntityId, SpeciesKind};
use crate::math::Vec2;
use crate::state::StateKind;
use crate::trigger::Watcher;

/// The moment a template fires, relative to its owner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TriggerWhen {
    /// The tracked player advances past `owner_spawn_x - lead`.
    PlayerWithin { lead: f32 },
    /// The owner entered its dead state.
    SelfDead,
    /// One of the owner's counters hit zero.
    SelfDepleted { kind: ResourceKind },
}

/// What a fired template does
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TriggerAction {
    /// Put the owner in this state.
    EnterState(StateKind),
    /// Spawn a species at an offset from the owner's spawn position.
    SpawnOffset { species: SpeciesKind, offset: Vec2 },
}

/// One profile-side reaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDef {
    pub when: TriggerWhen,
    pub then: Vec<TriggerAction>,
}

impl TriggerDef {
    /// Bind the template to the entity it spawned with. Returns `None`
    /// when the condition needs a tracked player and there is none yet.
    pub fn resolve(
        &self,
        owner: EntityId,
        origin: Vec2,
        player: Option<EntityId>,
    ) -> Option<Watcher> {
        let when = match self.when {
            TriggerWhen::PlayerWithin { lead } => Condition::PastX {
                entity: player?,
                x: origin.x - lead,
            },
            TriggerWhen::SelfDead => Condition::Dead(owner),
            TriggerWhen::SelfDepleted { kind } => Condition::Depleted {
                entity: owner,
                kind,
            },
        };
        let then = self
            .then
            .iter()
            .map(|action| match *action {
                TriggerAction::EnterState(kind) => SimCommand::SetState {
                    entity: owner,
                    kind: Some(kind),
                },
                TriggerAction::SpawnOffset { species, offset } => SimCommand::Spawn {
                    species,
                    position: origin + offset,
                },
            })
            .collect();
        Some(Watcher {
            owner: Some(owner),
            when,
            then,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proximity_template_binds_player_and_origin() {
        let def = TriggerDef {
            when: TriggerWhen::PlayerWithin { lead: 560.0 },
            then: vec![TriggerAction::EnterState(StateKind::Alert)],
        };

        let watcher = def
            .resolve(EntityId(4), Vec2::new(900.0, 300.0), Some(EntityId(0)))
            .unwrap();
        assert_eq!(
            watcher.when,
            Condition::PastX {
                entity: EntityId(0),
                x: 340.0
            }
        );
        assert_eq!(
            watcher.then,
            vec![SimCommand::SetState {
                entity: EntityId(4),
                kind: Some(StateKind::Alert),
            }]
        );
        assert_eq!(watcher.owner, Some(EntityId(4)));
    }

    #[test]
    fn test_proximity_template_needs_a_player() {
        let def = TriggerDef {
            when: TriggerWhen::PlayerWithin { lead: 100.0 },
            then: vec![],
        };
        assert!(def.resolve(EntityId(4), Vec2::ZERO, None).is_none());
    }

    #[test]
    fn test_death_drop_resolves_to_offset_spawn() {
        let def = TriggerDef {
            when: TriggerWhen::SelfDead,
            then: vec![TriggerAction::SpawnOffset {
                species: SpeciesKind::Phial,
                offset: Vec2::new(60.0, -40.0),
            }],
        };

        let watcher = def.resolve(EntityId(9), Vec2::new(1000.0, 300.0), None).unwrap();
        assert_eq!(watcher.when, Condition::Dead(EntityId(9)));
        assert_eq!(
            watcher.then,
            vec![SimCommand::Spawn {
                species: SpeciesKind::Phial,
                position: Vec2::new(1060.0, 260.0),
            }]
        );
    }
}
