//! Bounded resource counters
//!
//! Health, coins and throwable flasks are all the same thing: a counter
//! clamped to [0, max] with full-or-nothing spending unless the counter
//! explicitly allows draining partially (health does, so any hit can floor
//! you; flasks do not, you either have one to throw or you don't).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The counters an entity can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Health,
    Coins,
    Flasks,
}

/// A counter clamped to [0, max]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Resource {
    current: u32,
    max: u32,
    /// Whether spending more than is available drains to zero instead of
    /// failing.
    allow_partial: bool,
}

impl Resource {
    pub fn new(current: u32, max: u32, allow_partial: bool) -> Self {
        Self {
            current: current.min(max),
            max,
            allow_partial,
        }
    }

    pub fn full(max: u32, allow_partial: bool) -> Self {
        Self::new(max, max, allow_partial)
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Take `amount` out of the counter. An empty counter always fails; a
    /// short counter drains to zero when partial spending is allowed and
    /// fails untouched otherwise. Never goes negative.
    pub fn spend(&mut self, amount: u32) -> bool {
        if self.current == 0 {
            return false;
        }
        if self.current >= amount {
            self.current -= amount;
            return true;
        }
        if self.allow_partial {
            self.current = 0;
            return true;
        }
        false
    }

    /// Add, clamped at max.
    pub fn add(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }
}

/// The per-entity set of counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resources {
    entries: BTreeMap<ResourceKind, Resource>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, kind: ResourceKind, resource: Resource) {
        self.entries.insert(kind, resource);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Resource> {
        self.entries.get(&kind)
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> Option<&mut Resource> {
        self.entries.get_mut(&kind)
    }

    /// Spend against a kind the entity may not even carry; a missing
    /// counter fails like an empty one.
    pub fn spend(&mut self, kind: ResourceKind, amount: u32) -> bool {
        match self.entries.get_mut(&kind) {
            Some(resource) => resource.spend(amount),
            None => false,
        }
    }

    /// Add to a carried kind; missing counters ignore the grant. Returns
    /// the new (current, max) when something changed, for status updates.
    pub fn add(&mut self, kind: ResourceKind, amount: u32) -> Option<(u32, u32)> {
        let resource = self.entries.get_mut(&kind)?;
        resource.add(amount);
        Some((resource.current, resource.max))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &Resource)> {
        self.entries.iter().map(|(k, r)| (*k, r))
    }
}
