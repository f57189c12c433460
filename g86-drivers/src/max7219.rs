//! MAX7219 LED driver chain
//!
//! Each device takes 16-bit words (register, data). Words shifted in first
//! travel furthest down the chain, so one transaction carries one word per
//! device with the last device's word first. Device 0 is the one wired to
//! the MCU.

use embedded_hal::spi::SpiDevice;

/// MAX7219 register addresses
pub mod reg {
    pub const NOOP: u8 = 0x00;
    /// Digit 0; digits 1-7 follow
    pub const DIGIT0: u8 = 0x01;
    pub const DECODE_MODE: u8 = 0x09;
    pub const INTENSITY: u8 = 0x0A;
    pub const SCAN_LIMIT: u8 = 0x0B;
    pub const SHUTDOWN: u8 = 0x0C;
    pub const DISPLAY_TEST: u8 = 0x0F;
}

/// Longest supported chain
pub const MAX_DEVICES: usize = 16;

/// Digit registers per device
pub const DIGITS: u8 = 8;

/// Highest intensity setting
pub const MAX_INTENSITY: u8 = 15;

/// Errors from the driver chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Max7219Error {
    /// SPI transfer failed
    Spi,
    /// Device index beyond the chain
    InvalidDevice,
    /// Digit index beyond 7
    InvalidDigit,
}

/// Chain of `N` MAX7219 devices
pub struct Max7219<SPI, const N: usize> {
    spi: SPI,
}

impl<SPI: SpiDevice, const N: usize> Max7219<SPI, N> {
    pub fn new(spi: SPI) -> Self {
        const { assert!(N > 0 && N <= MAX_DEVICES) };
        Self { spi }
    }

    /// Bring every device out of shutdown, blank, at `intensity`
    pub fn init(&mut self, intensity: u8) -> Result<(), Max7219Error> {
        self.write_all(reg::DISPLAY_TEST, 0)?;
        self.write_all(reg::SCAN_LIMIT, DIGITS - 1)?;
        self.write_all(reg::DECODE_MODE, 0)?;
        self.clear()?;
        self.set_intensity(intensity)?;
        self.write_all(reg::SHUTDOWN, 1)
    }

    /// Write one word per device; `words[d]` goes to device `d`
    pub fn write_words(&mut self, words: &[(u8, u8); N]) -> Result<(), Max7219Error> {
        let mut buffer = [0u8; 2 * MAX_DEVICES];
        for (device, &(register, data)) in words.iter().enumerate() {
            let offset = (N - 1 - device) * 2;
            buffer[offset] = register;
            buffer[offset + 1] = data;
        }
        self.spi
            .write(&buffer[..2 * N])
            .map_err(|_| Max7219Error::Spi)
    }

    /// Same register write on every device
    pub fn write_all(&mut self, register: u8, data: u8) -> Result<(), Max7219Error> {
        self.write_words(&[(register, data); N])
    }

    /// Write one device, the rest get a no-op
    pub fn write_device(
        &mut self,
        device: usize,
        register: u8,
        data: u8,
    ) -> Result<(), Max7219Error> {
        if device >= N {
            return Err(Max7219Error::InvalidDevice);
        }
        let mut words = [(reg::NOOP, 0); N];
        words[device] = (register, data);
        self.write_words(&words)
    }

    /// Set one digit register on every device; `data[d]` goes to device `d`
    pub fn write_digit_row(&mut self, digit: u8, data: &[u8; N]) -> Result<(), Max7219Error> {
        if digit >= DIGITS {
            return Err(Max7219Error::InvalidDigit);
        }
        let mut words = [(reg::NOOP, 0); N];
        for (word, &byte) in words.iter_mut().zip(data.iter()) {
            *word = (reg::DIGIT0 + digit, byte);
        }
        self.write_words(&words)
    }

    /// Brightness 0..=15 on every device
    pub fn set_intensity(&mut self, level: u8) -> Result<(), Max7219Error> {
        self.write_all(reg::INTENSITY, level.min(MAX_INTENSITY))
    }

    /// Blank every digit of every device
    pub fn clear(&mut self) -> Result<(), Max7219Error> {
        for digit in 0..DIGITS {
            self.write_all(reg::DIGIT0 + digit, 0)?;
        }
        Ok(())
    }

    /// Release the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}
