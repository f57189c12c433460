//! Dot-matrix text panel built from chained 8x8 MAX7219 modules
//!
//! Text is rendered into a column buffer with the 5x7 font and one blank
//! column between characters, aligned within the panel width, and clipped.
//! Module 0 is the leftmost; the MCU feeds the rightmost module first, so
//! module `m` is chain device `MODULES - 1 - m`. Within a module digit
//! register `r` holds row `r` and bit 7 is the module's leftmost column.

mod font;

pub use font::columns;

use embedded_hal::spi::SpiDevice;
use g86_core::config::TextAlign;
use g86_core::traits::{DisplayError, TextDisplay};

use crate::max7219::{Max7219, DIGITS};

/// Blank columns between characters
pub const CHAR_SPACING: usize = 1;

/// Default module count of the primary panel
pub const DEFAULT_MODULES: usize = 4;

const COLUMNS_PER_MODULE: usize = 8;
const MAX_COLUMNS: usize = crate::max7219::MAX_DEVICES * COLUMNS_PER_MODULE;

/// Width in columns of `text` as rendered
pub fn text_width(text: &str) -> usize {
    let mut width = 0;
    for (i, ch) in text.chars().enumerate() {
        if i > 0 {
            width += CHAR_SPACING;
        }
        width += columns(ch).len();
    }
    width
}

/// Chain of `MODULES` 8x8 modules forming one text line
pub struct DotMatrix<SPI, const MODULES: usize = DEFAULT_MODULES> {
    chain: Max7219<SPI, MODULES>,
    buffer: [u8; MAX_COLUMNS],
}

impl<SPI: SpiDevice, const MODULES: usize> DotMatrix<SPI, MODULES> {
    pub const WIDTH: usize = MODULES * COLUMNS_PER_MODULE;

    pub fn new(spi: SPI) -> Self {
        Self {
            chain: Max7219::new(spi),
            buffer: [0; MAX_COLUMNS],
        }
    }

    pub fn init(&mut self, intensity: u8) -> Result<(), DisplayError> {
        self.buffer = [0; MAX_COLUMNS];
        Ok(self.chain.init(intensity)?)
    }

    /// Column buffer as last rendered, bit 0 is the top row
    pub fn columns(&self) -> &[u8] {
        &self.buffer[..Self::WIDTH]
    }

    fn render(&mut self, text: &str, align: TextAlign) {
        let width = text_width(text);
        let free = Self::WIDTH.saturating_sub(width);
        let mut x = match align {
            TextAlign::Left => 0,
            TextAlign::Center => free / 2,
            TextAlign::Right => free,
        };

        self.buffer = [0; MAX_COLUMNS];
        for (i, ch) in text.chars().enumerate() {
            if i > 0 {
                x += CHAR_SPACING;
            }
            for &col in columns(ch) {
                if x >= Self::WIDTH {
                    return;
                }
                self.buffer[x] = col;
                x += 1;
            }
        }
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        for row in 0..DIGITS {
            let mut data = [0u8; MODULES];
            for (module, chunk) in self.buffer[..Self::WIDTH]
                .chunks(COLUMNS_PER_MODULE)
                .enumerate()
            {
                let mut byte = 0u8;
                for (i, &col) in chunk.iter().enumerate() {
                    if col & (1 << row) != 0 {
                        byte |= 0x80 >> i;
                    }
                }
                data[MODULES - 1 - module] = byte;
            }
            self.chain.write_digit_row(row, &data)?;
        }
        Ok(())
    }

    pub fn release(self) -> SPI {
        self.chain.release()
    }
}

impl<SPI: SpiDevice, const MODULES: usize> TextDisplay for DotMatrix<SPI, MODULES> {
    fn print(&mut self, text: &str, align: TextAlign) -> Result<(), DisplayError> {
        self.render(text, align);
        self.flush()
    }

    fn set_intensity(&mut self, level: u8) -> Result<(), DisplayError> {
        Ok(self.chain.set_intensity(level)?)
    }
}
