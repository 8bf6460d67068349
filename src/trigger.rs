//! One-shot condition watchers
//!
//! A watcher pairs a world predicate with the commands to run the first
//! time it holds. The registry consumes fired watchers *before* their
//! commands execute, so a command that re-arms a similar watcher cannot
//! make the original fire twice.

use tracing::debug;

use crate::command::{Condition, SimCommand};
use crate::entity::EntityId;

/// A pending one-shot reaction
#[derive(Debug, Clone, PartialEq)]
pub struct Watcher {
    /// Entity whose removal should also remove this watcher. Watchers
    /// armed by a spawn plan have no owner and outlive everything.
    pub owner: Option<EntityId>,
    pub when: Condition,
    pub then: Vec<SimCommand>,
}

/// Registry of pending watchers, polled once per update pass
#[derive(Debug, Default)]
pub struct TriggerManager {
    watchers: Vec<Watcher>,
}

impl TriggerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, watcher: Watcher) {
        debug!(when = ?watcher.when, owner = ?watcher.owner, "watcher armed");
        self.watchers.push(watcher);
    }

    /// Drop every watcher owned by a departing entity.
    pub fn remove_owned_by(&mut self, entity: EntityId) {
        self.watchers.retain(|watcher| watcher.owner != Some(entity));
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Pull out every watcher whose condition holds. The caller runs the
    /// returned commands; anything still pending stays armed.
    pub fn collect_fired(&mut self, mut holds: impl FnMut(&Condition) -> bool) -> Vec<Watcher> {
        let (fired, pending): (Vec<_>, Vec<_>) = self
            .watchers
            .drain(..)
            .partition(|watcher| holds(&watcher.when));
        self.watchers = pending;
        for watcher in &fired {
            debug!(when = ?watcher.when, "watcher fired");
        }
        fired
    }
}
