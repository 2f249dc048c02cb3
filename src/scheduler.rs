// SPDX-License-Identifier: Apache-2.0

//! Fans the periodic hardware tick out into sub-tasks running at their own rates.
//!
//! [`Scheduler::tick`] is called once per timer period from inside the shared-context critical
//! section, so a tick's sub-tasks run to completion before the next tick is accepted. Every
//! sub-task must be bounded so that all of them together fit in [`TICK_PERIOD_US`].
//!
//! [`TICK_PERIOD_US`]: crate::config::TICK_PERIOD_US

use core::num::NonZeroU16;

use crate::config::Divisors;

/// Work dispatched by the [`Scheduler`]. Each method must return well within one tick.
pub trait Tasks {
    /// Signal the foreground loop that the display is due for a refresh
    fn refresh_display(&mut self);
    /// Sample the operator buttons
    fn poll_input(&mut self);
    /// Advance the PWM generator and drive the motor lines
    fn update_pwm(&mut self);
    /// Start an analog scan
    fn trigger_adc(&mut self);
    /// Evaluate the line-follow controller
    fn evaluate_control(&mut self);
}

/// Counts ticks for one sub-task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCounter {
    count: u16,
    divisor: NonZeroU16,
}

impl TaskCounter {
    /// Counter at zero that fires every `divisor` ticks
    pub fn new(divisor: NonZeroU16) -> Self {
        Self { count: 0, divisor }
    }

    /// Count one tick. Returns `true`, and resets to zero, when the divisor is reached.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.divisor.get() {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Ticks counted since the sub-task last ran
    pub fn count(&self) -> u16 {
        self.count
    }
}

/// One counter per sub-task
#[derive(Debug, Clone)]
pub struct Scheduler {
    display: TaskCounter,
    input: TaskCounter,
    pwm: TaskCounter,
    adc: TaskCounter,
    control: TaskCounter,
}

impl Scheduler {
    /// All counters at zero
    pub fn new(divisors: Divisors) -> Self {
        Self {
            display: TaskCounter::new(divisors.display),
            input: TaskCounter::new(divisors.input),
            pwm: TaskCounter::new(divisors.pwm),
            adc: TaskCounter::new(divisors.adc),
            control: TaskCounter::new(divisors.control),
        }
    }

    /// Service one timer tick: run every sub-task whose divisor has been reached, exactly once
    pub fn tick<T: Tasks>(&mut self, tasks: &mut T) {
        if self.display.tick() {
            tasks.refresh_display();
        }
        if self.input.tick() {
            tasks.poll_input();
        }
        if self.pwm.tick() {
            tasks.update_pwm();
        }
        if self.adc.tick() {
            tasks.trigger_adc();
        }
        if self.control.tick() {
            tasks.evaluate_control();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<&'static str>,
    }

    impl Recorder {
        fn runs(&self, task: &str) -> usize {
            self.log.iter().filter(|&&name| name == task).count()
        }
    }

    impl Tasks for Recorder {
        fn refresh_display(&mut self) {
            self.log.push("display");
        }
        fn poll_input(&mut self) {
            self.log.push("input");
        }
        fn update_pwm(&mut self) {
            self.log.push("pwm");
        }
        fn trigger_adc(&mut self) {
            self.log.push("adc");
        }
        fn evaluate_control(&mut self) {
            self.log.push("control");
        }
    }

    fn nz(value: u16) -> NonZeroU16 {
        NonZeroU16::new(value).unwrap()
    }

    #[test]
    fn default_rates() {
        let mut scheduler = Scheduler::new(Divisors::default());
        let mut recorder = Recorder::default();
        for _ in 0..1000 {
            scheduler.tick(&mut recorder);
        }
        assert_eq!(recorder.runs("display"), 10);
        assert_eq!(recorder.runs("input"), 1000);
        assert_eq!(recorder.runs("pwm"), 1000);
        assert_eq!(recorder.runs("adc"), 1000);
        assert_eq!(recorder.runs("control"), 1000);
    }

    #[test]
    fn divisors_are_independent() {
        let divisors = Divisors {
            display: nz(100),
            input: nz(1),
            pwm: nz(1),
            adc: nz(2),
            control: nz(10),
        };
        let mut scheduler = Scheduler::new(divisors);
        let mut recorder = Recorder::default();
        for _ in 0..100 {
            scheduler.tick(&mut recorder);
        }
        assert_eq!(recorder.runs("display"), 1);
        assert_eq!(recorder.runs("adc"), 50);
        assert_eq!(recorder.runs("control"), 10);
    }

    #[test]
    fn task_fires_on_reaching_divisor() {
        let mut counter = TaskCounter::new(nz(3));
        assert!(!counter.tick());
        assert!(!counter.tick());
        assert_eq!(counter.count(), 2);
        assert!(counter.tick());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn tasks_run_in_fixed_order_within_a_tick() {
        let divisors = Divisors {
            display: nz(1),
            ..Divisors::default()
        };
        let mut scheduler = Scheduler::new(divisors);
        let mut recorder = Recorder::default();
        scheduler.tick(&mut recorder);
        assert_eq!(recorder.log, ["display", "input", "pwm", "adc", "control"]);
    }
}
