//! Status boundary
//!
//! Resource changes (health, coins, flasks) push through this sink so a
//! host can keep status bars current without polling entity state.

use crate::behaviour::resource::ResourceKind;
use crate::entity::EntityId;

/// Host-side status display
pub trait StatusSink {
    /// A bounded counter changed; `current` is already clamped to
    /// `[0, max]`.
    fn resource_changed(&mut self, entity: EntityId, kind: ResourceKind, current: u32, max: u32);
}

/// Sink that ignores every update
#[derive(Debug, Default)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn resource_changed(&mut self, _: EntityId, _: ResourceKind, _: u32, _: u32) {}
}

/// Sink that records every update; tests keep the shared log half.
#[cfg(test)]
pub(crate) struct RecordingStatus {
    log: std::rc::Rc<std::cell::RefCell<Vec<(EntityId, ResourceKind, u32, u32)>>>,
}

#[cfg(test)]
impl RecordingStatus {
    #[allow(clippy::type_complexity)]
    pub(crate) fn new() -> (
        Self,
        std::rc::Rc<std::cell::RefCell<Vec<(EntityId, ResourceKind, u32, u32)>>>,
    ) {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        (
            Self {
                log: std::rc::Rc::clone(&log),
            },
            log,
        )
    }
}

#[cfg(test)]
impl StatusSink for RecordingStatus {
    fn resource_changed(&mut self, entity: EntityId, kind: ResourceKind, current: u32, max: u32) {
        self.log.borrow_mut().push((entity, kind, current, max));
    }
}
