//! Timer scheduler
//!
//! Owns every live timer and interval, keyed by ids that are never reused,
//! plus the simulation clock: an f64 millisecond counter accumulated from
//! tick deltas. Hosts feed real frame deltas, tests feed exact ones; either
//! way the arithmetic is identical and deterministic.
//!
//! Global pause walks every pausable entry, banks its remaining duration
//! and records which entries it touched; global resume re-arms exactly
//! those. Unpausable entries keep running on the still-advancing clock
//! (menu timers, the respawn-screen delay).

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::command::Condition;

use super::interval::Interval;
use super::timer::Timer;

/// Handle to a scheduled timer or interval. Monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug)]
enum Entry<C> {
    Once(Timer<C>),
    Every(Interval<C>),
}

/// One tick's worth of scheduler output
#[derive(Debug)]
pub struct TickBatch<C> {
    /// Commands from every entry that came due, in fire order.
    pub fired: Vec<C>,
    /// Intervals that fired and carry a stop condition; the caller
    /// evaluates each and calls [`Scheduler::stop_interval`] on the ones
    /// whose condition holds, before the clock can advance again.
    pub stop_checks: Vec<(TimerId, Condition)>,
}

#[derive(Debug)]
pub struct Scheduler<C> {
    now_ms: f64,
    next_id: u64,
    entries: BTreeMap<TimerId, Entry<C>>,
    /// Entries the last pause_all banked; resume_all re-arms exactly these.
    suspended: Vec<TimerId>,
}

impl<C: Clone> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 0,
            entries: BTreeMap::new(),
            suspended: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn fresh_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a timer without starting it. The owner arms it later via
    /// [`Scheduler::resume`].
    pub fn schedule_timer(&mut self, timer: Timer<C>) -> TimerId {
        let id = self.fresh_id();
        trace!(id = id.0, remaining = timer.remaining_ms(self.now_ms), "timer scheduled");
        self.entries.insert(id, Entry::Once(timer));
        id
    }

    /// Register and immediately arm a one-shot timer.
    pub fn start_timer(&mut self, command: C, timeout_ms: f64, pausable: bool) -> TimerId {
        let mut timer = Timer::new(command, timeout_ms, pausable);
        timer.resume(self.now_ms);
        self.schedule_timer(timer)
    }

    /// Register an interval without starting it.
    pub fn schedule_interval(&mut self, interval: Interval<C>) -> TimerId {
        let id = self.fresh_id();
        trace!(id = id.0, period = interval.period_ms(), "interval scheduled");
        self.entries.insert(id, Entry::Every(interval));
        id
    }

    /// Register and immediately arm an interval.
    pub fn start_interval(&mut self, mut interval: Interval<C>) -> TimerId {
        interval.resume(self.now_ms);
        self.schedule_interval(interval)
    }

    /// Advance the clock and collect everything that came due.
    pub fn tick(&mut self, delta_ms: f64) -> TickBatch<C> {
        self.now_ms += delta_ms.max(0.0);
        let now = self.now_ms;

        // (fire instant, command); entries iterate in id order, so the
        // stable sort below keeps creation order for simultaneous fires.
        let mut fires: Vec<(f64, C)> = Vec::new();
        let mut stop_checks = Vec::new();

        for (id, entry) in self.entries.iter_mut() {
            match entry {
                Entry::Once(timer) => {
                    if let Some(fire) = timer.fire_due(now) {
                        fires.push(fire);
                    }
                }
                Entry::Every(interval) => {
                    let burst = interval.fire_due(now);
                    if !burst.is_empty() {
                        if let Some(condition) = interval.stop_condition() {
                            stop_checks.push((*id, condition.clone()));
                        }
                        fires.extend(burst);
                    }
                }
            }
        }

        // Fired one-shots (and any interval that died) are spent.
        self.entries.retain(|_, entry| match entry {
            Entry::Once(timer) => !timer.is_done(),
            Entry::Every(interval) => !interval.is_done(),
        });

        fires.sort_by(|a, b| a.0.total_cmp(&b.0));
        TickBatch {
            fired: fires.into_iter().map(|(_, cmd)| cmd).collect(),
            stop_checks,
        }
    }

    /// Pause one entry; interval pause commands surface to the caller.
    pub fn pause(&mut self, id: TimerId) -> Option<C> {
        match self.entries.get_mut(&id)? {
            Entry::Once(timer) => {
                timer.pause(self.now_ms);
                None
            }
            Entry::Every(interval) => interval.pause(self.now_ms),
        }
    }

    pub fn resume(&mut self, id: TimerId) {
        let now = self.now_ms;
        match self.entries.get_mut(&id) {
            Some(Entry::Once(timer)) => timer.resume(now),
            Some(Entry::Every(interval)) => interval.resume(now),
            None => {}
        }
    }

    /// Restore the entry's full original duration, disarmed.
    pub fn reset(&mut self, id: TimerId) {
        match self.entries.get_mut(&id) {
            Some(Entry::Once(timer)) => timer.reset(),
            Some(Entry::Every(interval)) => interval.reset(),
            None => {}
        }
    }

    /// Drop an entry outright, without stop commands. Unknown ids are a
    /// no-op, so killing twice is safe.
    pub fn kill(&mut self, id: TimerId) {
        if self.entries.remove(&id).is_some() {
            trace!(id = id.0, "timer killed");
        }
    }

    /// Dispose an interval and surface its stop command. One-shot entries
    /// are simply dropped.
    pub fn stop_interval(&mut self, id: TimerId) -> Option<C> {
        match self.entries.remove(&id)? {
            Entry::Once(_) => None,
            Entry::Every(mut interval) => interval.stop(),
        }
    }

    /// Bank every pausable armed entry; returns the pause commands of the
    /// intervals among them.
    pub fn pause_all(&mut self) -> Vec<C> {
        let now = self.now_ms;
        let mut hushed = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            let paused = match entry {
                Entry::Once(timer) => timer.pause(now),
                Entry::Every(interval) => {
                    let was_armed = interval.is_armed();
                    if let Some(cmd) = interval.pause(now) {
                        hushed.push(cmd);
                    }
                    was_armed && !interval.is_armed()
                }
            };
            if paused {
                self.suspended.push(*id);
            }
        }
        debug!(suspended = self.suspended.len(), "scheduler paused");
        hushed
    }

    /// Re-arm exactly the entries the last pause_all banked.
    pub fn resume_all(&mut self) {
        let ids = std::mem::take(&mut self.suspended);
        debug!(resumed = ids.len(), "scheduler resumed");
        for id in ids {
            self.resume(id);
        }
    }

    pub fn is_alive(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn remaining_ms(&self, id: TimerId) -> Option<f64> {
        match self.entries.get(&id)? {
            Entry::Once(timer) => Some(timer.remaining_ms(self.now_ms)),
            Entry::Every(interval) => Some(interval.remaining_ms(self.now_ms)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Clone> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}
