// SPDX-License-Identifier: Apache-2.0

//! Character display used for status and calibration feedback.

use crate::config::{DISPLAY_COLUMNS, DISPLAY_ROWS};

/// A small character display addressed by column and row
pub trait CharDisplay {
    /// Move the cursor. Positions outside the screen are ignored by writes.
    fn set_cursor(&mut self, column: usize, row: usize);
    /// Write `c` at the cursor and advance it one column
    fn write_char(&mut self, c: char);
    /// Blank the whole screen and home the cursor
    fn clear(&mut self);

    /// Write every character of `text` from the cursor on
    fn write_str(&mut self, text: &str) {
        for c in text.chars() {
            self.write_char(c);
        }
    }

    /// Write `value` as two lowercase hex digits
    fn write_hex(&mut self, value: u8) {
        self.write_char(hex_digit(value >> 4));
        self.write_char(hex_digit(value & 0x0f));
    }
}

/// Lowercase hex digit for the low nibble of `nibble`
pub fn hex_digit(nibble: u8) -> char {
    let nibble = nibble & 0x0f;
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'a' + nibble - 10) as char,
    }
}

/// Keeps the screen in memory and logs it on [`flush`](LogDisplay::flush).
///
/// Boards without a character LCD use this to show status over the debug probe.
#[derive(Debug, Clone)]
pub struct LogDisplay {
    cells: [[u8; DISPLAY_COLUMNS]; DISPLAY_ROWS],
    column: usize,
    row: usize,
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl LogDisplay {
    /// Blank screen, cursor home
    pub fn new() -> Self {
        Self {
            cells: [[b' '; DISPLAY_COLUMNS]; DISPLAY_ROWS],
            column: 0,
            row: 0,
        }
    }

    /// Contents of `row`, or an empty string past the last row
    pub fn row(&self, row: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|cells| core::str::from_utf8(cells).ok())
            .unwrap_or("")
    }

    /// Log every row
    pub fn flush(&self) {
        for row in 0..DISPLAY_ROWS {
            info!("lcd{}: [{}]", row, self.row(row));
        }
    }
}

impl CharDisplay for LogDisplay {
    fn set_cursor(&mut self, column: usize, row: usize) {
        self.column = column;
        self.row = row;
    }

    fn write_char(&mut self, c: char) {
        if let Some(cell) = self
            .cells
            .get_mut(self.row)
            .and_then(|cells| cells.get_mut(self.column))
        {
            *cell = if c.is_ascii() { c as u8 } else { b'?' };
        }
        self.column += 1;
    }

    fn clear(&mut self) {
        self.cells = [[b' '; DISPLAY_COLUMNS]; DISPLAY_ROWS];
        self.set_cursor(0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_two_digits() {
        let mut display = LogDisplay::new();
        display.write_hex(0xaf);
        display.write_hex(0x07);
        assert_eq!(display.row(0), "af07      ");
    }

    #[test]
    fn writes_past_the_edge_are_dropped() {
        let mut display = LogDisplay::new();
        display.set_cursor(8, 1);
        display.write_str("xyz");
        assert_eq!(display.row(1), "        xy");
        display.set_cursor(0, 5);
        display.write_char('q');
        assert_eq!(display.row(5), "");
    }

    #[test]
    fn clear_blanks_and_homes() {
        let mut display = LogDisplay::new();
        display.set_cursor(3, 1);
        display.write_char('k');
        display.clear();
        display.write_char('a');
        assert_eq!(display.row(0), "a         ");
        assert_eq!(display.row(1), "          ");
    }
}
