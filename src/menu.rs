// SPDX-License-Identifier: Apache-2.0

//! Operator menu, run from the foreground loop whenever the display sub-task flags a refresh.
//!
//! [`Button::Page`] steps through the pages, [`Button::Action`] acts on the current one.

use crate::{
    controller::{Controller, Mode},
    display::CharDisplay,
    input::{Button, ButtonEvent, Buttons},
    pwm::DriveLines,
};

/// Menu pages, in paging order
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuPage {
    /// Mode, maneuver, readings, drive lines and speeds
    #[default]
    Status,
    /// Proportional gain
    Gain,
    /// Recovery maneuver
    Recovery,
    /// Calibration snapshots
    Calibrate,
    /// Stop or re-arm
    Run,
}

impl MenuPage {
    /// Following page, wrapping back to [`MenuPage::Status`]
    pub fn next(self) -> Self {
        match self {
            MenuPage::Status => MenuPage::Gain,
            MenuPage::Gain => MenuPage::Recovery,
            MenuPage::Recovery => MenuPage::Calibrate,
            MenuPage::Calibrate => MenuPage::Run,
            MenuPage::Run => MenuPage::Status,
        }
    }
}

/// Current page of the operator menu
#[derive(Debug, Default, Clone)]
pub struct Menu {
    page: MenuPage,
}

impl Menu {
    /// Start on the status page
    pub fn new() -> Self {
        Self::default()
    }

    /// Current page
    pub fn page(&self) -> MenuPage {
        self.page
    }

    /// Handle pending button edges, then redraw the current page
    pub fn service<B: Buttons, D: CharDisplay>(
        &mut self,
        controller: &mut Controller,
        lines: DriveLines,
        buttons: &mut B,
        display: &mut D,
    ) {
        if buttons.read_button(Button::Page) == ButtonEvent::PressedEdge {
            self.page = self.page.next();
            debug!("menu page {:?}", self.page);
        }
        if buttons.read_button(Button::Action) == ButtonEvent::PressedEdge {
            self.act(controller);
        }

        display.clear();
        match self.page {
            MenuPage::Status => Self::draw_status(controller, lines, display),
            MenuPage::Gain => {
                display.write_str("SET KP");
                display.set_cursor(0, 1);
                display.write_hex(controller.kp());
            }
            MenuPage::Recovery => {
                display.write_str("RECOVERY");
                display.set_cursor(0, 1);
                display.write_char(controller.maneuver().symbol());
            }
            MenuPage::Calibrate => {
                display.write_str(match controller.mode() {
                    Mode::CalibrateBackground => "CAL BG",
                    Mode::CalibrateLine => "CAL LINE",
                    Mode::Tracking | Mode::Stopped => "CAL DONE",
                });
                display.set_cursor(0, 1);
                display.write_hex(controller.readings().midpoint());
                display.set_cursor(3, 1);
                display.write_hex(controller.calibration().threshold);
            }
            MenuPage::Run => {
                display.write_str(if controller.mode() == Mode::Stopped {
                    "ARM"
                } else {
                    "STOP"
                });
                display.set_cursor(0, 1);
                display.write_char(controller.mode().digit());
            }
        }
    }

    /// Apply the action button to the current page
    fn act(&mut self, controller: &mut Controller) {
        match self.page {
            MenuPage::Status => {}
            MenuPage::Gain => {
                let kp = controller.cycle_kp();
                info!("kp set to {}", kp);
            }
            MenuPage::Recovery => {
                let maneuver = controller.cycle_maneuver();
                info!("recovery maneuver set to {:?}", maneuver);
            }
            MenuPage::Calibrate => controller.confirm(),
            MenuPage::Run => {
                if controller.mode() == Mode::Stopped {
                    controller.rearm();
                } else {
                    controller.stop();
                }
            }
        }
    }

    /// Row 0: mode, maneuver, right and left readings. Row 1: drive lines, right and left speeds.
    fn draw_status<D: CharDisplay>(controller: &Controller, lines: DriveLines, display: &mut D) {
        let readings = controller.readings();
        let (right_speed, left_speed) = controller.commands().speeds();

        display.write_char(controller.mode().digit());
        display.write_char(controller.maneuver().symbol());
        display.set_cursor(3, 0);
        display.write_hex(readings.right);
        display.set_cursor(6, 0);
        display.write_hex(readings.left);

        display.set_cursor(0, 1);
        display.write_hex(lines.bits());
        display.set_cursor(3, 1);
        display.write_hex(right_speed);
        display.set_cursor(6, 1);
        display.write_hex(left_speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::SensorReadings, config::ControlConfig, controller::RecoveryManeuver,
        display::LogDisplay, input::mocks::MockButtonsHandle,
    };

    struct Bench {
        menu: Menu,
        controller: Controller,
        buttons: MockButtonsHandle,
        display: LogDisplay,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                menu: Menu::new(),
                controller: Controller::new(ControlConfig::default()),
                buttons: MockButtonsHandle::default(),
                display: LogDisplay::new(),
            }
        }

        fn press(&mut self, button: Button) {
            self.buttons.press(button);
            self.service();
        }

        fn service(&mut self) {
            self.menu.service(
                &mut self.controller,
                DriveLines::default(),
                &mut self.buttons,
                &mut self.display,
            );
        }
    }

    #[test]
    fn status_page_shows_hex_values() {
        let mut bench = Bench::new();
        bench.controller.evaluate(SensorReadings::new(0x3c, 0xd2));
        bench.service();
        assert_eq!(bench.display.row(0), "0J 3c d2  ");
        assert_eq!(bench.display.row(1), "00 00 00  ");
    }

    #[test]
    fn pages_cycle_back_to_status() {
        let mut bench = Bench::new();
        for _ in 0..5 {
            bench.press(Button::Page);
        }
        assert_eq!(bench.menu.page(), MenuPage::Status);
    }

    #[test]
    fn gain_and_recovery_pages_cycle_values() {
        let mut bench = Bench::new();
        bench.press(Button::Page);
        bench.press(Button::Action);
        assert_eq!(bench.controller.kp(), 9);
        assert_eq!(bench.display.row(0), "SET KP    ");
        assert_eq!(bench.display.row(1), "09        ");

        bench.press(Button::Page);
        bench.press(Button::Action);
        assert_eq!(bench.controller.maneuver(), RecoveryManeuver::TurnRight);
        assert_eq!(bench.display.row(1), "R         ");
    }

    #[test]
    fn calibrate_page_confirms_both_snapshots() {
        let mut bench = Bench::new();
        for _ in 0..3 {
            bench.press(Button::Page);
        }
        assert_eq!(bench.menu.page(), MenuPage::Calibrate);

        bench.controller.evaluate(SensorReadings::new(200, 200));
        bench.press(Button::Action);
        assert_eq!(bench.controller.mode(), Mode::CalibrateLine);

        bench.controller.evaluate(SensorReadings::new(40, 40));
        bench.press(Button::Action);
        assert_eq!(bench.controller.mode(), Mode::Tracking);
        assert_eq!(bench.display.row(0), "CAL DONE  ");
        assert_eq!(bench.display.row(1), "28 78     ");
    }

    #[test]
    fn run_page_stops_and_rearms() {
        let mut bench = Bench::new();
        for _ in 0..4 {
            bench.press(Button::Page);
        }
        bench.press(Button::Action);
        assert_eq!(bench.controller.mode(), Mode::Stopped);
        assert_eq!(bench.display.row(0), "ARM       ");

        bench.press(Button::Action);
        assert_eq!(bench.controller.mode(), Mode::CalibrateBackground);
    }
}
