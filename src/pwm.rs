// SPDX-License-Identifier: Apache-2.0

//! Software PWM for the two drive motors.
//!
//! A free-running duty counter is compared against each motor's commanded speed once per PWM
//! tick. While `counter < speed` one of the motor's two drive lines is asserted according to its
//! direction, otherwise both are cleared. Over a full cycle of [`PWM_MAX_COUNT`] ticks a motor
//! commanded at speed `s` is driven for exactly `s` ticks.

use embedded_hal::digital::{OutputPin, PinState};

use crate::{
    config::PWM_MAX_COUNT,
    motor::{Direction, MotorCommand, MotorCommands},
};

/// State of the four motor drive lines, one bit per line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveLines(u8);

impl DriveLines {
    /// Left motor, forward line
    pub const LEFT_IN1: u8 = 0x01;
    /// Left motor, reverse line
    pub const LEFT_IN2: u8 = 0x02;
    /// Right motor, forward line
    pub const RIGHT_IN1: u8 = 0x04;
    /// Right motor, reverse line
    pub const RIGHT_IN2: u8 = 0x08;
    /// Every line in the order [`MotorPort`] implementations drive them
    pub const ALL: [u8; 4] = [
        Self::LEFT_IN1,
        Self::LEFT_IN2,
        Self::RIGHT_IN1,
        Self::RIGHT_IN2,
    ];

    /// Raw port byte
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether `line` is asserted
    pub fn is_set(&self, line: u8) -> bool {
        self.0 & line != 0
    }

    /// Assert or clear a motor's line pair. `None` clears both.
    fn drive(&mut self, in1: u8, in2: u8, direction: Option<Direction>) {
        self.0 &= !(in1 | in2);
        match direction {
            Some(Direction::Forward) => self.0 |= in1,
            Some(Direction::Reverse) => self.0 |= in2,
            None => {}
        }
    }
}

/// Output port carrying the four motor drive lines
pub trait MotorPort {
    /// Error raised by the underlying pins
    type Error;

    /// Drive every line to the state in `lines`
    fn write_lines(&mut self, lines: DriveLines) -> Result<(), Self::Error>;
}

/// [`MotorPort`] over four individual output pins, ordered as [`DriveLines::ALL`]
pub struct PinPort<P: OutputPin> {
    pins: [P; 4],
}

impl<P: OutputPin> PinPort<P> {
    /// Take ownership of the pins: left IN1, left IN2, right IN1, right IN2
    pub fn new(pins: [P; 4]) -> Self {
        Self { pins }
    }
}

impl<P: OutputPin> MotorPort for PinPort<P> {
    type Error = P::Error;

    fn write_lines(&mut self, lines: DriveLines) -> Result<(), Self::Error> {
        for (pin, line) in self.pins.iter_mut().zip(DriveLines::ALL) {
            pin.set_state(PinState::from(lines.is_set(line)))?;
        }
        Ok(())
    }
}

/// Free-running duty counter and the comparison against commanded speeds
#[derive(Debug, Default)]
pub struct PwmGenerator {
    /// Within \[0, [`PWM_MAX_COUNT`] - 1\]
    duty_counter: u16,
    /// Lines produced by the last update
    lines: DriveLines,
}

impl PwmGenerator {
    /// Counter at 0, all lines cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the lines for this tick from `commands`, then advance the duty counter
    pub fn update(&mut self, commands: &MotorCommands) -> DriveLines {
        let mut lines = DriveLines::default();
        lines.drive(
            DriveLines::RIGHT_IN1,
            DriveLines::RIGHT_IN2,
            self.asserted(&commands.right),
        );
        lines.drive(
            DriveLines::LEFT_IN1,
            DriveLines::LEFT_IN2,
            self.asserted(&commands.left),
        );

        self.duty_counter += 1;
        if self.duty_counter >= PWM_MAX_COUNT {
            self.duty_counter = 0;
        }
        self.lines = lines;
        lines
    }

    /// Direction to drive `command` in this tick, or `None` while its duty is off
    fn asserted(&self, command: &MotorCommand) -> Option<Direction> {
        (self.duty_counter < u16::from(command.speed)).then_some(command.direction)
    }

    /// Current duty counter value
    pub fn duty_counter(&self) -> u16 {
        self.duty_counter
    }

    /// Lines produced by the most recent update
    pub fn lines(&self) -> DriveLines {
        self.lines
    }
}
