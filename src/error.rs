// SPDX-License-Identifier: Apache-2.0

//! Error values returned by the control core.

use core::fmt;

/// Errors the control core reports in-band.
///
/// Timing overruns are not represented: every sub-task is bounded so the sum fits in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Requested analog channel is outside `0..CHANNEL_COUNT`
    InvalidChannel(usize),
    /// The shared context was already borrowed when an interrupt tried to enter it
    TickReentered,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidChannel(channel) => write!(f, "invalid analog channel {channel}"),
            Error::TickReentered => {
                f.write_str("shared context re-entered before previous tick finished")
            }
        }
    }
}
