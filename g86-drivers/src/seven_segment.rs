//! 8-digit 7-segment panel on a MAX7219 chain
//!
//! The devices run in no-decode mode so letters can be drawn. Segment
//! bits per digit register: DP=7, A=6, B=5, C=4, D=3, E=2, F=1, G=0.

use embedded_hal::spi::SpiDevice;
use g86_core::traits::{DisplayError, SegmentDisplay};

use crate::max7219::{reg, Max7219, Max7219Error};

/// Decimal point bit
pub const DP: u8 = 0x80;

/// Brightness applied by [`SevenSegment::init`]
pub const DEFAULT_INTENSITY: u8 = 8;

/// Segment pattern for `ch`, blank when there is no sensible glyph
pub fn glyph(ch: char) -> u8 {
    match ch {
        '0' | 'O' | 'D' => 0x7E,
        '1' => 0x30,
        '2' | 'Z' | 'z' => 0x6D,
        '3' => 0x79,
        '4' => 0x33,
        '5' | 'S' | 's' => 0x5B,
        '6' => 0x5F,
        '7' => 0x70,
        '8' | 'B' => 0x7F,
        '9' => 0x7B,
        'A' | 'a' => 0x77,
        'b' => 0x1F,
        'C' => 0x4E,
        'c' => 0x0D,
        'd' => 0x3D,
        'E' | 'e' => 0x4F,
        'F' | 'f' => 0x47,
        'G' | 'g' => 0x5E,
        'H' | 'X' | 'x' => 0x37,
        'h' => 0x17,
        'I' | 'i' => 0x06,
        'J' | 'j' => 0x3C,
        'K' | 'k' => 0x57,
        'L' | 'l' => 0x0E,
        'M' | 'm' => 0x55,
        'N' | 'n' => 0x15,
        'o' => 0x1D,
        'P' | 'p' => 0x67,
        'Q' | 'q' => 0x73,
        'R' | 'r' => 0x05,
        'T' | 't' => 0x0F,
        'U' | 'V' | 'v' => 0x3E,
        'u' => 0x1C,
        'W' | 'w' => 0x2A,
        'Y' | 'y' => 0x3B,
        '-' => 0x01,
        '_' => 0x08,
        '\'' => 0x02,
        '"' => 0x22,
        '=' => 0x09,
        '°' => 0x63,
        _ => 0x00,
    }
}

impl From<Max7219Error> for DisplayError {
    fn from(err: Max7219Error) -> Self {
        match err {
            Max7219Error::Spi => DisplayError::Bus,
            Max7219Error::InvalidDevice => DisplayError::InvalidDevice,
            Max7219Error::InvalidDigit => DisplayError::InvalidDigit,
        }
    }
}

/// Chain of `N` 8-digit 7-segment devices
pub struct SevenSegment<SPI, const N: usize = 1> {
    chain: Max7219<SPI, N>,
}

impl<SPI: SpiDevice, const N: usize> SevenSegment<SPI, N> {
    pub fn new(spi: SPI) -> Self {
        Self {
            chain: Max7219::new(spi),
        }
    }

    pub fn init(&mut self) -> Result<(), DisplayError> {
        Ok(self.chain.init(DEFAULT_INTENSITY)?)
    }

    pub fn release(self) -> SPI {
        self.chain.release()
    }
}

impl<SPI: SpiDevice, const N: usize> SegmentDisplay for SevenSegment<SPI, N> {
    fn set_char(&mut self, device: u8, digit: u8, ch: char, dot: bool) -> Result<(), DisplayError> {
        if digit >= Self::DIGITS {
            return Err(DisplayError::InvalidDigit);
        }
        let data = if dot { glyph(ch) | DP } else { glyph(ch) };
        Ok(self
            .chain
            .write_device(device as usize, reg::DIGIT0 + digit, data)?)
    }

    fn set_intensity(&mut self, level: u8) -> Result<(), DisplayError> {
        Ok(self.chain.set_intensity(level)?)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        Ok(self.chain.clear()?)
    }
}
