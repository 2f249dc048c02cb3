// SPDX-License-Identifier: Apache-2.0

//! Turns smoothed sensor readings into on-line / lost labels and remembers the recent ones.

use crate::{buffer::Ring, config::HISTORY_DEPTH};

/// Binary surface label for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Label {
    /// The sensor sees the line
    OnLine,
    /// The sensor sees background
    Lost,
}

/// Labels of both sensors from the same evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LabelPair {
    /// Left sensor
    pub left: Label,
    /// Right sensor
    pub right: Label,
}

impl LabelPair {
    /// Both sensors lost, the state of an empty history
    pub const BOTH_LOST: Self = Self::new(Label::Lost, Label::Lost);

    /// Build from `(right, left)`, matching how combinations are written in the control law
    pub const fn new(right: Label, left: Label) -> Self {
        Self { left, right }
    }

    /// Both sensors see the line
    pub fn both_on_line(&self) -> bool {
        self.left == Label::OnLine && self.right == Label::OnLine
    }

    /// Both sensors see background
    pub fn both_lost(&self) -> bool {
        self.left == Label::Lost && self.right == Label::Lost
    }
}

/// Scaled smoothed readings of both sensors
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReadings {
    /// Left sensor
    pub left: u8,
    /// Right sensor
    pub right: u8,
}

impl SensorReadings {
    /// Build from `(right, left)`
    pub const fn new(right: u8, left: u8) -> Self {
        Self { left, right }
    }

    /// Truncated mean of both readings
    pub fn midpoint(&self) -> u8 {
        ((u16::from(self.left) + u16::from(self.right)) / 2) as u8
    }
}

/// Which side of the threshold the line falls on. Fixed when the line snapshot is confirmed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// The line reads at or below the threshold: `reading > threshold` is lost
    #[default]
    LineBelow,
    /// The line reads at or above the threshold: `reading < threshold` is lost
    LineAbove,
}

/// Snapshots taken during calibration and the values derived from them.
///
/// Until calibration completes every field is zero, so tracking still runs but its labels are
/// meaningless. Completing calibration before tracking is the caller's responsibility.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Midpoint reading over known background
    pub background: u8,
    /// Midpoint reading over the line
    pub line: u8,
    /// `(background + line) / 2`
    pub threshold: u8,
    /// `(threshold + line) / 2`, kept as a setpoint for finer proportional control
    pub target: u8,
    /// Reading polarity of the line
    pub polarity: Polarity,
}

impl Calibration {
    /// Derive threshold, target and polarity from the two snapshots
    pub fn from_snapshots(background: u8, line: u8) -> Self {
        let threshold = ((u16::from(background) + u16::from(line)) / 2) as u8;
        let target = ((u16::from(threshold) + u16::from(line)) / 2) as u8;
        let polarity = if line <= background {
            Polarity::LineBelow
        } else {
            Polarity::LineAbove
        };
        Self {
            background,
            line,
            threshold,
            target,
            polarity,
        }
    }

    /// Label a single reading
    pub fn classify(&self, reading: u8) -> Label {
        let lost = match self.polarity {
            Polarity::LineBelow => reading > self.threshold,
            Polarity::LineAbove => reading < self.threshold,
        };
        if lost {
            Label::Lost
        } else {
            Label::OnLine
        }
    }
}

/// Tally of a history window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vote {
    /// Entries where both sensors were on the line
    pub both_on_line: usize,
    /// Entries where both sensors were lost
    pub both_lost: usize,
}

/// Labels both sides and keeps the last [`HISTORY_DEPTH`] pairs.
///
/// Both sides share one write pointer, so their histories never drift apart.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    history: Ring<LabelPair, HISTORY_DEPTH>,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier {
    /// Empty history, every slot [`LabelPair::BOTH_LOST`]
    pub const fn new() -> Self {
        Self {
            history: Ring::new(LabelPair::BOTH_LOST),
        }
    }

    /// Classify both readings, push the pair into the history and return it
    pub fn classify(&mut self, readings: SensorReadings, calibration: &Calibration) -> LabelPair {
        let pair = LabelPair {
            left: calibration.classify(readings.left),
            right: calibration.classify(readings.right),
        };
        self.history.push(pair);
        pair
    }

    /// Most recent pair
    pub fn current(&self) -> LabelPair {
        self.history.latest()
    }

    /// Pair from the evaluation before the current one
    pub fn previous(&self) -> LabelPair {
        self.history.back(1)
    }

    /// Replace the current pair, treating the sample that produced it as noise
    pub fn overwrite_current(&mut self, pair: LabelPair) {
        self.history.replace_latest(pair);
    }

    /// Count both-on-line and both-lost entries among the `window` most recent pairs,
    /// current pair included
    pub fn vote(&self, window: usize) -> Vote {
        self.history
            .recent(window)
            .fold(Vote::default(), |mut vote, pair| {
                if pair.both_on_line() {
                    vote.both_on_line += 1;
                }
                if pair.both_lost() {
                    vote.both_lost += 1;
                }
                vote
            })
    }
}
