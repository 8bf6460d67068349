//! One-shot timers with pausable wall-clock accounting
//!
//! The clock is the scheduler's accumulated milliseconds, never OS time.
//! A timer is constructed disarmed and only starts counting on `resume()`;
//! pausing banks the remaining duration so a later resume picks up exactly
//! where it left off.

/// Wall-clock bookkeeping shared by timers and intervals.
///
/// Invariants: `remaining_ms` is only meaningful while disarmed; while
/// armed, the live remaining is `remaining_ms - (now - armed_at)`. Every
/// exit path (pause, reset, kill) disarms, so a stale arm instant can never
/// fire.
#[derive(Debug, Clone)]
pub(crate) struct Countdown {
    timeout_ms: f64,
    remaining_ms: f64,
    pausable: bool,
    armed_at: Option<f64>,
    dead: bool,
}

impl Countdown {
    pub fn new(timeout_ms: f64, pausable: bool) -> Self {
        let timeout_ms = timeout_ms.max(0.0);
        Self {
            timeout_ms,
            remaining_ms: timeout_ms,
            pausable,
            armed_at: None,
            dead: false,
        }
    }

    /// Start (or restart after a pause) counting down. No-op while armed or
    /// dead.
    pub fn arm(&mut self, now: f64) {
        if !self.dead && self.armed_at.is_none() {
            self.armed_at = Some(now);
        }
    }

    /// Bank elapsed progress and disarm. Returns whether anything actually
    /// paused (dead, unpausable or already-disarmed countdowns report
    /// false).
    pub fn pause(&mut self, now: f64) -> bool {
        if self.dead || !self.pausable {
            return false;
        }
        let Some(at) = self.armed_at else {
            return false;
        };
        self.remaining_ms = (self.remaining_ms - (now - at)).max(0.0);
        self.armed_at = None;
        true
    }

    /// Back to the full original timeout, disarmed. Progress is discarded
    /// but the countdown stays usable.
    pub fn reset(&mut self) {
        if !self.dead {
            self.remaining_ms = self.timeout_ms;
            self.armed_at = None;
        }
    }

    pub fn kill(&mut self) {
        self.dead = true;
        self.armed_at = None;
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn is_pausable(&self) -> bool {
        self.pausable
    }

    pub fn timeout_ms(&self) -> f64 {
        self.timeout_ms
    }

    /// Remaining until fire: banked value while disarmed, live value while
    /// armed.
    pub fn remaining_ms(&self, now: f64) -> f64 {
        match self.armed_at {
            Some(at) => (self.remaining_ms - (now - at)).max(0.0),
            None => self.remaining_ms,
        }
    }

    /// The clock instant this countdown elapses at, if armed and due.
    pub fn due_instant(&self, now: f64) -> Option<f64> {
        if self.dead {
            return None;
        }
        let at = self.armed_at?;
        let due = at + self.remaining_ms;
        (now >= due).then_some(due)
    }

    /// Re-arm for the next period from the given fire instant, so repeat
    /// fires stay on the original cadence instead of drifting by processing
    /// latency.
    pub fn rearm_at(&mut self, fire_instant: f64) {
        if !self.dead {
            self.remaining_ms = self.timeout_ms;
            self.armed_at = Some(fire_instant);
        }
    }
}

/// One-shot timer carrying a command payload.
///
/// Construction does not start it: the owner calls `resume()` when ready.
/// After firing (or `kill()`) it is done for good.
#[derive(Debug, Clone)]
pub struct Timer<C> {
    countdown: Countdown,
    command: C,
}

impl<C: Clone> Timer<C> {
    pub fn new(command: C, timeout_ms: f64, pausable: bool) -> Self {
        Self {
            countdown: Countdown::new(timeout_ms, pausable),
            command,
        }
    }

    /// Arm the timer (initial start, or continue after a pause).
    pub fn resume(&mut self, now: f64) {
        self.countdown.arm(now);
    }

    /// Bank the remaining duration and stop counting. Returns whether the
    /// timer actually paused; unpausable, disarmed and dead timers report
    /// false.
    pub fn pause(&mut self, now: f64) -> bool {
        self.countdown.pause(now)
    }

    /// Discard progress, restoring the full original timeout. The timer is
    /// left disarmed.
    pub fn reset(&mut self) {
        self.countdown.reset();
    }

    /// Permanently disable. Idempotent; a killed timer never fires.
    pub fn kill(&mut self) {
        self.countdown.kill();
    }

    pub fn is_done(&self) -> bool {
        self.countdown.is_dead()
    }

    pub fn is_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    pub fn is_pausable(&self) -> bool {
        self.countdown.is_pausable()
    }

    pub fn remaining_ms(&self, now: f64) -> f64 {
        self.countdown.remaining_ms(now)
    }

    /// Emit the command if due. Firing finishes the timer, so this returns
    /// `Some` at most once over its whole life.
    pub(crate) fn fire_due(&mut self, now: f64) -> Option<(f64, C)> {
        let due = self.countdown.due_instant(now)?;
        self.countdown.kill();
        Some((due, self.command.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_does_not_auto_start() {
        let mut timer = Timer::new("fire", 100.0, true);
        // Never resumed: no amount of clock movement makes it due.
        assert!(timer.fire_due(10_000.0).is_none());
        assert!(!timer.is_done());
    }

    #[test]
    fn test_timer_fires_once_after_resume() {
        let mut timer = Timer::new("fire", 100.0, true);
        timer.resume(0.0);
        assert!(timer.fire_due(99.0).is_none());

        let (instant, cmd) = timer.fire_due(100.0).unwrap();
        assert_eq!(cmd, "fire");
        assert!((instant - 100.0).abs() < 1e-9);
        assert!(timer.is_done());

        // Done for good.
        assert!(timer.fire_due(10_000.0).is_none());
    }

    #[test]
    fn test_pause_banks_remaining() {
        let mut timer = Timer::new("fire", 100.0, true);
        timer.resume(0.0);
        timer.pause(40.0);
        assert!((timer.remaining_ms(40.0) - 60.0).abs() < 1e-9);

        // While paused the clock is irrelevant.
        assert!(timer.fire_due(500.0).is_none());

        // Resumed at 500: fires no earlier than 60ms later.
        timer.resume(500.0);
        assert!(timer.fire_due(559.0).is_none());
        assert!(timer.fire_due(560.0).is_some());
    }

    #[test]
    fn test_unpausable_timer_ignores_pause() {
        let mut timer = Timer::new("fire", 100.0, false);
        timer.resume(0.0);
        timer.pause(50.0);
        assert!(timer.fire_due(100.0).is_some());
    }

    #[test]
    fn test_reset_restores_full_timeout() {
        let mut timer = Timer::new("fire", 100.0, true);
        timer.resume(0.0);
        timer.reset();
        assert!((timer.remaining_ms(90.0) - 100.0).abs() < 1e-9);

        // Disarmed after reset; must resume again.
        assert!(timer.fire_due(1000.0).is_none());
        timer.resume(1000.0);
        assert!(timer.fire_due(1100.0).is_some());
    }

    #[test]
    fn test_kill_is_idempotent_and_final() {
        let mut timer = Timer::new("fire", 100.0, true);
        timer.resume(0.0);
        timer.kill();
        timer.kill();
        assert!(timer.is_done());
        assert!(timer.fire_due(10_000.0).is_none());

        // Nothing revives it.
        timer.resume(10_000.0);
        timer.reset();
        assert!(timer.fire_due(20_000.0).is_none());
    }

    #[test]
    fn test_resume_while_armed_keeps_original_start() {
        let mut timer = Timer::new("fire", 100.0, true);
        timer.resume(0.0);
        timer.resume(90.0);
        assert!(timer.fire_due(100.0).is_some());
    }
}
