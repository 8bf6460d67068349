//! Error taxonomy for the simulation core
//!
//! Every variant is a fatal programmer error: a tick that surfaces one is
//! abandoned and the caller decides whether to crash or stop the run. There
//! are deliberately no recoverable variants: gameplay outcomes like a
//! failed resource spend are expressed as return values, not errors.
//!
//! The unknown-kind class of error from stringly-typed engines cannot occur
//! here: species, states, animation and sound cues are closed enums, so a
//! bad name is unrepresentable past deserialization.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid wiring at construction: a profile default state outside its
    /// allowed set, zero dimensions, a non-positive tick interval, or a
    /// settings/plan file that failed to parse.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An animation frame or sound referenced an asset key the provider has
    /// no handle for. Registration happens before first use; a miss means a
    /// profile and the host's load set disagree.
    #[error("asset not loaded: {0}")]
    AssetNotLoaded(String),

    /// A registry lookup that must succeed came back empty, e.g. an entity
    /// id vanished between collection and use inside a single tick.
    #[error("lookup miss: no {what} with id {id}")]
    LookupMiss { what: &'static str, id: u64 },
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }
}
