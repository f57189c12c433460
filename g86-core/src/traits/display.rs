//! Display driver traits for the two panels

use crate::config::TextAlign;

/// Errors that can occur writing to a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// SPI transfer failed
    Bus,
    /// Device index beyond the chain
    InvalidDevice,
    /// Digit index beyond the device
    InvalidDigit,
}

/// Chain of 8-digit 7-segment devices
pub trait SegmentDisplay {
    /// Digits per device
    const DIGITS: u8 = 8;

    /// Show `ch` on one digit
    ///
    /// - `device`: position in the chain, 0 first
    /// - `digit`: 0 is the rightmost digit
    /// - `dot`: light the decimal point
    ///
    /// Characters without a glyph are shown blank.
    fn set_char(&mut self, device: u8, digit: u8, ch: char, dot: bool) -> Result<(), DisplayError>;

    /// Brightness 0..=15
    fn set_intensity(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Blank every digit
    fn clear(&mut self) -> Result<(), DisplayError>;
}

/// Dot-matrix text panel
pub trait TextDisplay {
    /// Replace the panel contents with `text`
    fn print(&mut self, text: &str, align: TextAlign) -> Result<(), DisplayError>;

    /// Brightness 0..=15
    fn set_intensity(&mut self, level: u8) -> Result<(), DisplayError>;
}
