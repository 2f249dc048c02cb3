// SPDX-License-Identifier: Apache-2.0

//! [RP2040](rp2040_hal) implementations of the collaborator traits.
//!
//! Pin assignment:
//!
//! - ADC0..ADC3 (GPIO 26..29): reflectance sensors, scanned round-robin as one group
//! - GPIO 10..13: left IN1, left IN2, right IN1, right IN2
//! - GPIO 14, 15: page and action buttons, active low with pull-ups

use rp2040_hal::{
    adc::{AdcFifo, AdcPin},
    gpio::{DynPinId, FunctionSio, Pin, PullDown, PullNone, PullUp, SioInput, SioOutput},
    Adc,
};

use crate::{
    config::CHANNEL_COUNT,
    context::RobotContext,
    input::EdgeButtons,
    pwm::PinPort,
    sampler::{RoundRobinFifo, RoundRobinGroup},
};

/// Motor drive line
pub type MotorPin = Pin<DynPinId, FunctionSio<SioOutput>, PullDown>;
/// Operator button input
pub type ButtonPin = Pin<DynPinId, FunctionSio<SioInput>, PullUp>;
/// Reflectance sensor input, handed over to the ADC
pub type SensorPin = AdcPin<Pin<DynPinId, FunctionSio<SioInput>, PullNone>>;
/// Sensor group scanned once per trigger
pub type FifoAdc = RoundRobinGroup<ScanFifo>;
/// The robot context as wired on the board
pub type BoardRobot = RobotContext<FifoAdc, PinPort<MotorPin>, EdgeButtons<ButtonPin>>;

/// ADC FIFO in round-robin mode, rebuilt for every scan.
///
/// Rebuilding selects ADC0 again and starts from an empty FIFO. The FIFO interrupt threshold is
/// [`CHANNEL_COUNT`], so the conversion-complete interrupt fires once a whole group is queued.
pub struct ScanFifo {
    sensors: [SensorPin; CHANNEL_COUNT],
    /// Converter while idle
    adc: Option<&'static mut Adc>,
    /// Converter while a scan is running or waiting to be read
    fifo: Option<AdcFifo<'static, u8>>,
}

impl ScanFifo {
    /// Idle converter over ADC0..ADC3, in channel order
    pub fn new(adc: &'static mut Adc, sensors: [SensorPin; CHANNEL_COUNT]) -> Self {
        Self {
            sensors,
            adc: Some(adc),
            fifo: None,
        }
    }
}

impl RoundRobinFifo for ScanFifo {
    fn restart(&mut self) {
        self.halt();
        let Some(adc) = self.adc.take() else {
            return;
        };
        let [first, second, third, fourth] = &mut self.sensors;
        let fifo = adc
            .build_fifo()
            .set_channel(first)
            .round_robin((&*first, &*second, &*third, &*fourth))
            .enable_interrupt(CHANNEL_COUNT as u8)
            .shift_8bit()
            .start();
        self.fifo = Some(fifo);
    }

    fn pause(&mut self) {
        if let Some(fifo) = self.fifo.as_mut() {
            fifo.pause();
        }
    }

    fn pop(&mut self) -> Option<u8> {
        let fifo = self.fifo.as_mut()?;
        if fifo.len() == 0 {
            return None;
        }
        Some(fifo.read())
    }

    fn halt(&mut self) {
        // Stopping waits for the conversion in flight, drains the FIFO and clears the interrupt
        if let Some(fifo) = self.fifo.take() {
            self.adc = Some(fifo.stop());
        }
    }
}
