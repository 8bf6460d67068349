//! Deterministic timing
//!
//! A replacement for host-provided setTimeout/setInterval with three parts:
//! - Timer: one-shot countdown, explicitly armed, pausable
//! - Interval: repeating countdown with stop/pause commands
//! - Scheduler: owns every entry plus the accumulated millisecond clock
//!
//! Key properties:
//! - Construction never auto-starts; resume() arms
//! - Pause banks the exact remaining duration off the wall clock
//! - Kill is idempotent and final; nothing fires after it
//! - The clock only moves inside tick(), so outcomes are reproducible

pub mod interval;
pub mod scheduler;
pub mod timer;

pub use interval::Interval;
pub use scheduler::{Scheduler, TickBatch, TimerId};
pub use timer::Timer;
