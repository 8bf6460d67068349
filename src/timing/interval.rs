//! Repeating intervals
//!
//! Same wall-clock accounting as one-shot timers, plus re-arming on a fixed
//! cadence. Re-arms anchor to the fire instant rather than "now", so a slow
//! host frame delays delivery but never shifts the cadence.
//!
//! An interval can carry a stop condition. Conditions read world state, so
//! the scheduler surfaces them to the caller after a fire instead of
//! evaluating them itself; a met condition stops the interval via
//! [`Interval::stop`], which emits the optional stop command.

use crate::command::Condition;

use super::timer::Countdown;

/// Repeating timer carrying a command payload per fire
#[derive(Debug, Clone)]
pub struct Interval<C> {
    countdown: Countdown,
    command: C,
    stop_when: Option<Condition>,
    on_stop: Option<C>,
    on_pause: Option<C>,
}

impl<C: Clone> Interval<C> {
    pub fn new(command: C, period_ms: f64, pausable: bool) -> Self {
        Self {
            countdown: Countdown::new(period_ms, pausable),
            command,
            stop_when: None,
            on_stop: None,
            on_pause: None,
        }
    }

    /// Dispose automatically once this condition holds at a fire.
    pub fn with_stop_when(mut self, condition: Condition) -> Self {
        self.stop_when = Some(condition);
        self
    }

    /// Command emitted when the interval stops via its condition or
    /// [`Interval::stop`].
    pub fn with_stop_command(mut self, command: C) -> Self {
        self.on_stop = Some(command);
        self
    }

    /// Command emitted whenever the interval actually pauses; used to
    /// silence looping side effects while the simulation is frozen.
    pub fn with_pause_command(mut self, command: C) -> Self {
        self.on_pause = Some(command);
        self
    }

    /// Arm (initial start, or continue after a pause).
    pub fn resume(&mut self, now: f64) {
        self.countdown.arm(now);
    }

    /// Bank the remaining duration and stop counting; emits the pause
    /// command if the interval actually paused.
    pub fn pause(&mut self, now: f64) -> Option<C> {
        if self.countdown.pause(now) {
            self.on_pause.clone()
        } else {
            None
        }
    }

    /// Back to a full period, disarmed.
    pub fn reset(&mut self) {
        self.countdown.reset();
    }

    /// Permanently disable without the stop command. Idempotent.
    pub fn kill(&mut self) {
        self.countdown.kill();
    }

    /// Dispose and emit the stop command. Idempotent; a second stop
    /// returns None.
    pub fn stop(&mut self) -> Option<C> {
        if self.countdown.is_dead() {
            return None;
        }
        self.countdown.kill();
        self.on_stop.clone()
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

    pub fn period_ms(&self) -> f64 {
        self.countdown.timeout_ms()
    }

    pub fn remaining_ms(&self, now: f64) -> f64 {
        self.countdown.remaining_ms(now)
    }

    pub fn stop_condition(&self) -> Option<&Condition> {
        self.stop_when.as_ref()
    }

    /// Emit one command per elapsed period, in fire order. A large delta
    /// can deliver several.
    pub(crate) fn fire_due(&mut self, now: f64) -> Vec<(f64, C)> {
        let mut fires = Vec::new();
        while let Some(due) = self.countdown.due_instant(now) {
            fires.push((due, self.command.clone()));
            // A degenerate zero period would otherwise never catch up to now.
            if self.countdown.timeout_ms() <= 0.0 {
                self.countdown.kill();
                break;
            }
            self.countdown.rearm_at(due);
        }
        fires
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_cadence_has_no_drift() {
        let mut interval = Interval::new("beat", 100.0, true);
        interval.resume(0.0);

        // Sloppy, late ticks; fire instants stay on exact multiples.
        let mut instants = Vec::new();
        for now in [130.0, 210.0, 450.0] {
            for (at, _) in interval.fire_due(now) {
                instants.push(at);
            }
        }
        assert_eq!(instants, vec![100.0, 200.0, 300.0, 400.0]);
    }

    #[test]
    fn test_multiple_fires_in_one_delta_in_order() {
        let mut interval = Interval::new("beat", 50.0, true);
        interval.resume(0.0);
        let fires = interval.fire_due(175.0);
        assert_eq!(fires.len(), 3);
        assert!(fires.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_pause_resume_many_times_keeps_remaining() {
        let mut interval = Interval::new("beat", 100.0, true);
        interval.resume(0.0);

        // 30ms of progress, then a storm of pause/resume cycles at varying
        // clocks with no time spent armed.
        interval.pause(30.0);
        let mut now = 500.0;
        for _ in 0..10 {
            interval.resume(now);
            assert!(interval.pause(now).is_none()); // no pause command configured
            now += 1000.0;
        }
        assert!((interval.remaining_ms(now) - 70.0).abs() < 1e-9);

        // Resumed for real: fires exactly 70ms later, not before.
        interval.resume(now);
        assert!(interval.fire_due(now + 69.0).is_empty());
        assert_eq!(interval.fire_due(now + 70.0).len(), 1);
    }

    #[test]
    fn test_pause_command_emitted_only_on_real_pause() {
        let mut interval = Interval::new("beat", 100.0, true).with_pause_command("hush");
        // Not armed yet: no pause happens.
        assert!(interval.pause(0.0).is_none());

        interval.resume(0.0);
        assert_eq!(interval.pause(10.0), Some("hush"));
        // Already paused.
        assert!(interval.pause(20.0).is_none());
    }

    #[test]
    fn test_stop_emits_stop_command_once() {
        let mut interval = Interval::new("beat", 100.0, true).with_stop_command("done");
        interval.resume(0.0);
        assert_eq!(interval.stop(), Some("done"));
        assert!(interval.is_done());
        assert!(interval.stop().is_none());
        assert!(interval.fire_due(10_000.0).is_empty());
    }

    #[test]
    fn test_zero_period_interval_fires_once_then_dies() {
        let mut interval = Interval::new("beat", 0.0, true);
        interval.resume(0.0);
        assert_eq!(interval.fire_due(0.0).len(), 1);
        assert!(interval.is_done());
    }
}
