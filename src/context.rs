// SPDX-License-Identifier: Apache-2.0

//! The owned robot context: every piece of scheduler-driven state in one struct.
//!
//! Interrupt handlers and the foreground loop reach it through
//! [`Shared`](crate::interrupt::Shared), so a tick, a conversion-complete handler and a menu
//! pass never overlap.

use crate::{
    classifier::SensorReadings,
    config::{Config, SensorConfig},
    controller::Controller,
    display::CharDisplay,
    error::Error,
    input::Buttons,
    menu::Menu,
    pwm::{DriveLines, MotorPort, PwmGenerator},
    sampler::{AdcGroup, Sampler},
    scheduler::{Scheduler, Tasks},
};

/// The sub-task side of the context, dispatched by the [`Scheduler`]
pub struct ControlTasks<A: AdcGroup, M: MotorPort, B: Buttons> {
    sampler: Sampler<A>,
    pwm: PwmGenerator,
    port: M,
    controller: Controller,
    buttons: B,
    sensors: SensorConfig,
    /// Raised by the display sub-task, cleared by the foreground loop
    display_due: bool,
}

impl<A: AdcGroup, M: MotorPort, B: Buttons> ControlTasks<A, M, B> {
    /// Smoothed, scaled readings of both sensors
    fn read_sensors(&self) -> Result<SensorReadings, Error> {
        let scale = |reading: u8| {
            reading
                .checked_shr(u32::from(self.sensors.reading_shift))
                .unwrap_or(0)
        };
        let left = self.sampler.read_smoothed(self.sensors.left_channel)?;
        let right = self.sampler.read_smoothed(self.sensors.right_channel)?;
        Ok(SensorReadings {
            left: scale(left),
            right: scale(right),
        })
    }
}

impl<A: AdcGroup, M: MotorPort, B: Buttons> Tasks for ControlTasks<A, M, B> {
    fn refresh_display(&mut self) {
        self.display_due = true;
    }

    fn poll_input(&mut self) {
        self.buttons.poll();
    }

    fn update_pwm(&mut self) {
        let lines = self.pwm.update(&self.controller.commands());
        if self.port.write_lines(lines).is_err() {
            error!("failed to drive motor lines {:?}", lines);
        }
    }

    fn trigger_adc(&mut self) {
        self.sampler.trigger_scan();
    }

    fn evaluate_control(&mut self) {
        match self.read_sensors() {
            Ok(readings) => {
                self.controller.evaluate(readings);
            }
            Err(err) => error!("control evaluation skipped: {:?}", err),
        }
    }
}

/// Scheduler plus the state its sub-tasks operate on
pub struct RobotContext<A: AdcGroup, M: MotorPort, B: Buttons> {
    scheduler: Scheduler,
    tasks: ControlTasks<A, M, B>,
}

impl<A: AdcGroup, M: MotorPort, B: Buttons> RobotContext<A, M, B> {
    /// Assemble the context. The controller starts in background calibration with motors off.
    pub fn new(config: Config, adc: A, port: M, buttons: B) -> Self {
        Self {
            scheduler: Scheduler::new(config.divisors),
            tasks: ControlTasks {
                sampler: Sampler::new(adc),
                pwm: PwmGenerator::new(),
                port,
                controller: Controller::new(config.control),
                buttons,
                sensors: config.sensors,
                display_due: false,
            },
        }
    }

    /// Timer interrupt entry point
    pub fn tick(&mut self) {
        self.scheduler.tick(&mut self.tasks);
    }

    /// Conversion-complete interrupt entry point
    pub fn on_conversion_complete(&mut self) {
        self.tasks.sampler.on_conversion_complete();
    }

    /// Consume the display refresh flag
    pub fn take_display_due(&mut self) -> bool {
        core::mem::take(&mut self.tasks.display_due)
    }

    /// Foreground work: run the menu if a refresh is due. Returns whether it ran.
    pub fn service_menu<D: CharDisplay>(&mut self, menu: &mut Menu, display: &mut D) -> bool {
        if !self.take_display_due() {
            return false;
        }
        let lines = self.tasks.pwm.lines();
        let tasks = &mut self.tasks;
        menu.service(&mut tasks.controller, lines, &mut tasks.buttons, display);
        true
    }

    /// The line-follow controller
    pub fn controller(&self) -> &Controller {
        &self.tasks.controller
    }

    /// The line-follow controller, for operator commands
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.tasks.controller
    }

    /// The analog sampler
    pub fn sampler(&self) -> &Sampler<A> {
        &self.tasks.sampler
    }

    /// Drive lines from the latest PWM tick
    pub fn lines(&self) -> DriveLines {
        self.tasks.pwm.lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CHANNEL_COUNT,
        controller::Mode,
        display::LogDisplay,
        input::{mocks::MockButtonsHandle, Button},
        motor::MotorCommands,
        pwm::mocks::MockPortHandle,
        sampler::{mocks::MockAdcHandle, Frame},
    };

    type TestRobot = RobotContext<MockAdcHandle, MockPortHandle, MockButtonsHandle>;

    struct Rig {
        robot: TestRobot,
        adc: MockAdcHandle,
        port: MockPortHandle,
        buttons: MockButtonsHandle,
    }

    impl Rig {
        fn new(config: Config) -> Self {
            let adc = MockAdcHandle::new();
            let port = MockPortHandle::default();
            let buttons = MockButtonsHandle::default();
            let robot = RobotContext::new(config, adc.clone(), port.clone(), buttons.clone());
            Self {
                robot,
                adc,
                port,
                buttons,
            }
        }

        /// Unscaled readings so test values map one-to-one onto classifier input
        fn unscaled() -> Self {
            Self::new(Config {
                sensors: SensorConfig {
                    reading_shift: 0,
                    ..SensorConfig::default()
                },
                ..Config::default()
            })
        }

        /// Tick `ticks` times, completing one conversion of `(right, left)` after each tick
        fn run(&mut self, right: u8, left: u8, ticks: usize) {
            let mut frame: Frame = [0; CHANNEL_COUNT];
            frame[1] = left;
            frame[2] = right;
            for _ in 0..ticks {
                self.adc.queue(frame);
                self.robot.tick();
                self.robot.on_conversion_complete();
            }
        }
    }

    #[test]
    fn calibrate_and_follow_through_the_pipeline() {
        let mut rig = Rig::unscaled();

        rig.run(200, 200, 5);
        rig.robot.controller_mut().confirm();
        rig.run(40, 40, 5);
        rig.robot.controller_mut().confirm();
        assert_eq!(rig.robot.controller().mode(), Mode::Tracking);
        assert_eq!(rig.robot.controller().calibration().threshold, 120);

        rig.run(40, 40, 2);
        assert_eq!(rig.robot.controller().commands(), MotorCommands::FULL_FORWARD);
        // Lines follow the commands one PWM tick later
        assert_eq!(rig.robot.lines().bits(), 0x05);

        rig.run(30, 210, 8);
        let commands = rig.robot.controller().commands();
        assert_eq!(commands.left, crate::motor::MotorCommand::FULL_FORWARD);
        assert!(commands.right.speed < 255);
    }

    #[test]
    fn readings_are_halved_by_default() {
        let mut rig = Rig::new(Config::default());
        rig.run(100, 200, 5);
        assert_eq!(
            rig.robot.controller().readings(),
            SensorReadings::new(50, 100)
        );
    }

    #[test]
    fn every_tick_writes_the_port_once() {
        let mut rig = Rig::unscaled();
        rig.run(0, 0, 25);
        assert_eq!(rig.port.0.borrow().len(), 25);
        assert!(rig.port.0.borrow().iter().all(|&bits| bits == 0));
    }

    #[test]
    fn display_flag_raised_every_hundred_ticks() {
        let mut rig = Rig::unscaled();
        rig.run(0, 0, 99);
        assert!(!rig.robot.take_display_due());
        rig.run(0, 0, 1);
        assert!(rig.robot.take_display_due());
        assert!(!rig.robot.take_display_due());
    }

    #[test]
    fn menu_runs_only_when_due() {
        let mut rig = Rig::unscaled();
        let mut menu = Menu::new();
        let mut display = LogDisplay::new();

        rig.buttons.press(Button::Page);
        assert!(!rig.robot.service_menu(&mut menu, &mut display));

        rig.run(0, 0, 100);
        assert!(rig.robot.service_menu(&mut menu, &mut display));
        assert_eq!(display.row(0), "SET KP    ");
    }

    #[test]
    fn bad_channel_skips_control() {
        let mut rig = Rig::new(Config {
            sensors: SensorConfig {
                left_channel: CHANNEL_COUNT,
                ..SensorConfig::default()
            },
            ..Config::default()
        });
        rig.run(90, 90, 5);
        assert_eq!(rig.robot.controller().readings(), SensorReadings::default());
    }

    #[test]
    fn one_scan_per_tick_while_conversions_complete() {
        let mut rig = Rig::unscaled();
        rig.run(10, 10, 6);
        assert_eq!(rig.adc.0.borrow().starts, 6);
        assert_eq!(rig.robot.sampler().read_smoothed(2), Ok(10));
    }
}
