// SPDX-License-Identifier: Apache-2.0

//! Line-follow decision state machine.
//!
//! Each evaluation consumes the latest scaled readings and publishes [`MotorCommands`].
//! While tracking, the four label combinations are handled as follows:
//!
//! - both on the line: full speed ahead, slip counter reset;
//! - one side lost: the slip counter grows and the wheel on the side still seeing the line
//!   slows by `kp` per evaluation, arcing the robot back over the line;
//! - both lost: the recent history decides. Plenty of recent both-on-line entries means the
//!   robot just left a solid region (gap or junction), so the configured
//!   [`RecoveryManeuver`] is latched. Otherwise the sample is treated as noise and the
//!   previous one-side correction continues.

use crate::{
    classifier::{Calibration, Label, LabelPair, LineClassifier, SensorReadings},
    config::{ControlConfig, GAP_EVIDENCE, HISTORY_WINDOW, KP_STEPS, MAX_SPEED},
    motor::{MotorCommand, MotorCommands, Side},
};

/// Controller modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Waiting for the operator to confirm the background snapshot
    CalibrateBackground,
    /// Waiting for the operator to confirm the line snapshot
    CalibrateLine,
    /// Following the line
    Tracking,
    /// Motors off until re-armed
    Stopped,
}

impl Mode {
    /// Single digit shown on the status screen
    pub fn digit(&self) -> char {
        match self {
            Mode::CalibrateBackground => '0',
            Mode::CalibrateLine => '1',
            Mode::Tracking => '2',
            Mode::Stopped => '3',
        }
    }
}

/// What to do once the line is lost on both sides at a gap or junction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryManeuver {
    /// Drive straight across
    Jump,
    /// Pivot right: right motor reversed
    TurnRight,
    /// Pivot left: left motor reversed
    TurnLeft,
}

impl RecoveryManeuver {
    /// Next maneuver in operator cycling order
    pub fn next(self) -> Self {
        match self {
            RecoveryManeuver::Jump => RecoveryManeuver::TurnRight,
            RecoveryManeuver::TurnRight => RecoveryManeuver::TurnLeft,
            RecoveryManeuver::TurnLeft => RecoveryManeuver::Jump,
        }
    }

    /// Motor commands issued while the maneuver runs
    pub fn commands(self) -> MotorCommands {
        match self {
            RecoveryManeuver::Jump => MotorCommands::FULL_FORWARD,
            RecoveryManeuver::TurnRight => MotorCommands {
                left: MotorCommand::FULL_FORWARD,
                right: MotorCommand::FULL_REVERSE,
            },
            RecoveryManeuver::TurnLeft => MotorCommands {
                left: MotorCommand::FULL_REVERSE,
                right: MotorCommand::FULL_FORWARD,
            },
        }
    }

    /// Letter shown on the status screen
    pub fn symbol(&self) -> char {
        match self {
            RecoveryManeuver::Jump => 'J',
            RecoveryManeuver::TurnRight => 'R',
            RecoveryManeuver::TurnLeft => 'L',
        }
    }
}

/// The line-follow controller and all state it carries between evaluations
#[derive(Debug, Clone)]
pub struct Controller {
    mode: Mode,
    calibration: Calibration,
    /// Background snapshot, captured before the line snapshot
    background: u8,
    classifier: LineClassifier,
    /// Readings from the latest evaluation
    readings: SensorReadings,
    /// Slip counter: evaluations spent with one side off the line
    spent: u32,
    /// Recovery maneuver in progress
    recovering: bool,
    config: ControlConfig,
    commands: MotorCommands,
}

impl Controller {
    /// New controller awaiting background calibration, motors stopped
    pub fn new(config: ControlConfig) -> Self {
        Self {
            mode: Mode::CalibrateBackground,
            calibration: Calibration::default(),
            background: 0,
            classifier: LineClassifier::new(),
            readings: SensorReadings::default(),
            spent: 0,
            recovering: false,
            config,
            commands: MotorCommands::STOP,
        }
    }

    /// Run one control evaluation and return the commands to publish
    pub fn evaluate(&mut self, readings: SensorReadings) -> MotorCommands {
        self.readings = readings;
        self.commands = match self.mode {
            Mode::CalibrateBackground | Mode::CalibrateLine | Mode::Stopped => MotorCommands::STOP,
            Mode::Tracking => self.track(),
        };

        #[cfg(feature = "trace_control")]
        trace!(
            "readings {:?} labels {:?} spent {} recovering {} -> {:?}",
            readings,
            self.classifier.current(),
            self.spent,
            self.recovering,
            self.commands
        );
        self.commands
    }

    /// Tracking step: classify, then react to the label combination
    fn track(&mut self) -> MotorCommands {
        let pair = self.classifier.classify(self.readings, &self.calibration);
        match (pair.right, pair.left) {
            (Label::OnLine, Label::OnLine) => {
                self.spent = 0;
                self.release_latch();
                MotorCommands::FULL_FORWARD
            }
            (Label::OnLine, Label::Lost) => {
                self.release_latch();
                self.correct(Side::Right)
            }
            (Label::Lost, Label::OnLine) => {
                self.release_latch();
                self.correct(Side::Left)
            }
            (Label::Lost, Label::Lost) => self.resolve_double_loss(),
        }
    }

    /// Grow the slip counter and slow the `slow` wheel by `spent * kp`, never below zero
    fn correct(&mut self, slow: Side) -> MotorCommands {
        self.spent = self.spent.saturating_add(1);
        let penalty = self.spent.saturating_mul(u32::from(self.config.kp));
        let speed = u32::from(MAX_SPEED).saturating_sub(penalty) as u8;
        MotorCommands::slowed(slow, speed)
    }

    /// Both sensors lost: latch a recovery maneuver at a real gap, otherwise reject the sample
    fn resolve_double_loss(&mut self) -> MotorCommands {
        let vote = self.classifier.vote(HISTORY_WINDOW);
        if vote.both_on_line > GAP_EVIDENCE || self.recovering {
            if !self.recovering {
                debug!(
                    "recovery latched: {:?} ({} on-line, {} lost in window)",
                    self.config.maneuver,
                    vote.both_on_line,
                    vote.both_lost
                );
            }
            self.recovering = true;
            return self.config.maneuver.commands();
        }

        let previous = self.classifier.previous();
        match (previous.right, previous.left) {
            (Label::OnLine, Label::Lost) => {
                self.classifier.overwrite_current(previous);
                self.correct(Side::Right)
            }
            (Label::Lost, Label::OnLine) => {
                self.classifier.overwrite_current(previous);
                self.correct(Side::Left)
            }
            // Not enough evidence either way, keep driving as before
            _ => self.commands,
        }
    }

    /// Clear the recovery latch once a sensor sees the line again
    fn release_latch(&mut self) {
        if self.recovering {
            debug!("line found again, recovery released");
            self.recovering = false;
        }
    }

    /// Operator confirmation: capture the snapshot for the current calibration phase.
    ///
    /// The snapshot is the midpoint of both readings from the latest evaluation. Confirming the
    /// line snapshot derives the threshold and starts tracking. Ignored outside calibration.
    pub fn confirm(&mut self) {
        match self.mode {
            Mode::CalibrateBackground => {
                self.background = self.readings.midpoint();
                info!("background captured at {}", self.background);
                self.set_mode(Mode::CalibrateLine);
            }
            Mode::CalibrateLine => {
                self.calibration =
                    Calibration::from_snapshots(self.background, self.readings.midpoint());
                info!(
                    "line captured at {}: threshold {} target {} polarity {:?}",
                    self.calibration.line,
                    self.calibration.threshold,
                    self.calibration.target,
                    self.calibration.polarity
                );
                self.start_tracking();
            }
            Mode::Tracking | Mode::Stopped => {
                warn!("calibration confirm ignored in mode {:?}", self.mode);
            }
        }
    }

    /// Stop both motors. Reachable from every mode.
    pub fn stop(&mut self) {
        self.commands = MotorCommands::STOP;
        self.recovering = false;
        self.set_mode(Mode::Stopped);
    }

    /// Leave [`Mode::Stopped`] and start a fresh calibration. Ignored in any other mode.
    pub fn rearm(&mut self) {
        if self.mode == Mode::Stopped {
            self.set_mode(Mode::CalibrateBackground);
        } else {
            warn!("re-arm ignored in mode {:?}", self.mode);
        }
    }

    /// Enter tracking with a clean slip counter, latch and history
    fn start_tracking(&mut self) {
        self.spent = 0;
        self.recovering = false;
        self.classifier = LineClassifier::new();
        self.set_mode(Mode::Tracking);
    }

    /// Change mode, logging the transition
    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!("controller mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Step the gain through `0..KP_STEPS`, wrapping
    pub fn cycle_kp(&mut self) -> u8 {
        self.config.kp = self.config.kp.saturating_add(1) % KP_STEPS;
        self.config.kp
    }

    /// Step to the next recovery maneuver
    pub fn cycle_maneuver(&mut self) -> RecoveryManeuver {
        self.config.maneuver = self.config.maneuver.next();
        self.config.maneuver
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current calibration. All zeros until calibration completes.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Commands from the latest evaluation
    pub fn commands(&self) -> MotorCommands {
        self.commands
    }

    /// Readings from the latest evaluation
    pub fn readings(&self) -> SensorReadings {
        self.readings
    }

    /// Slip counter
    pub fn spent(&self) -> u32 {
        self.spent
    }

    /// Recovery latch
    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    /// Labels from the latest tracking evaluation
    pub fn labels(&self) -> LabelPair {
        self.classifier.current()
    }

    /// Proportional gain
    pub fn kp(&self) -> u8 {
        self.config.kp
    }

    /// Recovery maneuver
    pub fn maneuver(&self) -> RecoveryManeuver {
        self.config.maneuver
    }
}
