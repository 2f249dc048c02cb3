// SPDX-License-Identifier: Apache-2.0

//! Motor commands shared between the controller and the PWM generator.

use crate::config::MAX_SPEED;

/// One side of the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    /// Left sensor / left motor
    Left,
    /// Right sensor / right motor
    Right,
}

/// Direction a motor turns while its duty is asserted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Drive line 1 asserted, line 2 cleared
    #[default]
    Forward,
    /// Drive line 2 asserted, line 1 cleared
    Reverse,
}

/// Speed and direction for one motor. Speed `0` is off, [`MAX_SPEED`] is always on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommand {
    /// Duty, out of [`PWM_MAX_COUNT`](crate::config::PWM_MAX_COUNT)
    pub speed: u8,
    /// Only meaningful while `speed > 0`
    pub direction: Direction,
}

impl MotorCommand {
    /// Motor off
    pub const STOP: Self = Self {
        speed: 0,
        direction: Direction::Forward,
    };
    /// Full speed ahead
    pub const FULL_FORWARD: Self = Self::forward(MAX_SPEED);
    /// Full speed backwards
    pub const FULL_REVERSE: Self = Self {
        speed: MAX_SPEED,
        direction: Direction::Reverse,
    };

    /// Forward at `speed`
    pub const fn forward(speed: u8) -> Self {
        Self {
            speed,
            direction: Direction::Forward,
        }
    }
}

/// Commands for both motors, published once per control evaluation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommands {
    /// Left motor
    pub left: MotorCommand,
    /// Right motor
    pub right: MotorCommand,
}

impl MotorCommands {
    /// Both motors off
    pub const STOP: Self = Self {
        left: MotorCommand::STOP,
        right: MotorCommand::STOP,
    };
    /// Both motors full speed ahead
    pub const FULL_FORWARD: Self = Self {
        left: MotorCommand::FULL_FORWARD,
        right: MotorCommand::FULL_FORWARD,
    };

    /// Both forward, with `slow` at `speed` and the other side at [`MAX_SPEED`]
    pub fn slowed(slow: Side, speed: u8) -> Self {
        match slow {
            Side::Left => Self {
                left: MotorCommand::forward(speed),
                right: MotorCommand::FULL_FORWARD,
            },
            Side::Right => Self {
                left: MotorCommand::FULL_FORWARD,
                right: MotorCommand::forward(speed),
            },
        }
    }

    /// `(right, left)` speeds, the order the status display uses
    pub fn speeds(&self) -> (u8, u8) {
        (self.right.speed, self.left.speed)
    }
}
