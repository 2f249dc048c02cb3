// SPDX-License-Identifier: Apache-2.0

//! Sizing constants and runtime configuration.
//!
//! The constants fix buffer sizes and control-law limits at compile time. The structs carry
//! the knobs that differ between robots (sub-task rates, sensor wiring, controller gain) and
//! come with [`Default`] impls matching the reference robot.

use core::num::NonZeroU16;

use crate::controller::RecoveryManeuver;

/// Hardware timer period in microseconds. Every sub-task must finish within one period.
pub const TICK_PERIOD_US: u32 = 1000;

/// Number of analog channels converted per scan group
pub const CHANNEL_COUNT: usize = 4;
/// Depth of the per-channel conversion buffer
pub const ADC_BUFFER_DEPTH: usize = 8;
/// Number of recent samples averaged by [`Sampler::read_smoothed`](crate::sampler::Sampler::read_smoothed)
pub const SMOOTHING_WINDOW: usize = 4;

/// Depth of the per-side label history
pub const HISTORY_DEPTH: usize = 10;
/// Number of history entries inspected when both sensors lose the line
pub const HISTORY_WINDOW: usize = 10;
/// Simultaneous on-line entries in the window needed to treat a double loss as a real gap.
/// The count must be strictly greater than this.
pub const GAP_EVIDENCE: usize = 3;

/// The PWM duty counter runs over `0..PWM_MAX_COUNT`
pub const PWM_MAX_COUNT: u16 = 255;
/// Highest commanded motor speed. Equal to [`PWM_MAX_COUNT`], so it is always on.
pub const MAX_SPEED: u8 = 255;

/// Proportional gain used until the operator changes it
pub const DEFAULT_KP: u8 = 8;
/// The operator cycles the gain through `0..KP_STEPS`
pub const KP_STEPS: u8 = 10;

/// Character display geometry
pub const DISPLAY_COLUMNS: usize = 10;
/// Character display geometry
pub const DISPLAY_ROWS: usize = 2;

/// Shorthand for divisor literals
const fn divisor(ticks: u16) -> NonZeroU16 {
    match NonZeroU16::new(ticks) {
        Some(ticks) => ticks,
        None => panic!("sub-task divisor must be non-zero"),
    }
}

/// Number of ticks between successive runs of each sub-task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divisors {
    /// Raises the foreground display refresh flag
    pub display: NonZeroU16,
    /// Polls the operator buttons
    pub input: NonZeroU16,
    /// Advances the PWM duty counter and drives the motor lines
    pub pwm: NonZeroU16,
    /// Starts an analog scan
    pub adc: NonZeroU16,
    /// Evaluates the line-follow controller
    pub control: NonZeroU16,
}

impl Default for Divisors {
    fn default() -> Self {
        Self {
            display: divisor(100),
            input: divisor(1),
            pwm: divisor(1),
            adc: divisor(1),
            control: divisor(1),
        }
    }
}

/// Which analog channels carry the reflectance sensors, and how readings are scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// Channel of the left sensor
    pub left_channel: usize,
    /// Channel of the right sensor
    pub right_channel: usize,
    /// Smoothed readings are shifted right by this many bits before classification
    pub reading_shift: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            left_channel: 1,
            right_channel: 2,
            reading_shift: 1,
        }
    }
}

/// Operator-tunable controller settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConfig {
    /// Speed lost per evaluation while one side is off the line
    pub kp: u8,
    /// Maneuver performed once the recovery latch is set
    pub maneuver: RecoveryManeuver,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            kp: DEFAULT_KP,
            maneuver: RecoveryManeuver::Jump,
        }
    }
}

/// Everything needed to build a [`RobotContext`](crate::context::RobotContext)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    /// Sub-task rates
    pub divisors: Divisors,
    /// Sensor wiring
    pub sensors: SensorConfig,
    /// Controller settings
    pub control: ControlConfig,
}
