// SPDX-License-Identifier: Apache-2.0

//! Operator buttons, polled by the input sub-task and consumed by the foreground menu.
//!
//! Debouncing is left to the hardware (Schmitt-trigger inputs); this module only latches
//! press edges between polls and reads.

use embedded_hal::digital::InputPin;

/// Operator buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Cycles through menu pages
    Page,
    /// Acts on the current page
    Action,
}

impl Button {
    /// Slot of this button in [`EdgeButtons`]
    fn index(self) -> usize {
        match self {
            Button::Page => 0,
            Button::Action => 1,
        }
    }
}

/// Result of reading a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// No press since the last read
    Idle,
    /// Pressed since the last read
    PressedEdge,
}

/// Edge-detected button input
pub trait Buttons {
    /// Sample the buttons. Called from the input sub-task.
    fn poll(&mut self);
    /// Consume the press edge of `button`, if any
    fn read_button(&mut self, button: Button) -> ButtonEvent;
}

/// [`Buttons`] over two input pins, [`Button::Page`] first
pub struct EdgeButtons<P: InputPin> {
    pins: [P; 2],
    /// Pins read low while pressed
    active_low: bool,
    /// Pressed state at the previous poll
    held: [bool; 2],
    /// A press edge was seen and not yet read
    latched: [bool; 2],
}

impl<P: InputPin> EdgeButtons<P> {
    /// Take ownership of the page and action pins
    pub fn new(pins: [P; 2], active_low: bool) -> Self {
        Self {
            pins,
            active_low,
            held: [false; 2],
            latched: [false; 2],
        }
    }
}

impl<P: InputPin> Buttons for EdgeButtons<P> {
    fn poll(&mut self) {
        for (index, pin) in self.pins.iter_mut().enumerate() {
            // A pin that cannot be read counts as released
            let pressed = match pin.is_high() {
                Ok(high) => high != self.active_low,
                Err(_) => false,
            };
            if pressed && !self.held[index] {
                self.latched[index] = true;
            }
            self.held[index] = pressed;
        }
    }

    fn read_button(&mut self, button: Button) -> ButtonEvent {
        if core::mem::take(&mut self.latched[button.index()]) {
            ButtonEvent::PressedEdge
        } else {
            ButtonEvent::Idle
        }
    }
}
