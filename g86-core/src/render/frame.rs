//! Eight-cell frames
//!
//! Cell 0 is the leftmost digit. Text is laid out left to right and a `.`
//! lights the decimal point of the cell before it instead of taking a cell
//! of its own.

/// Digits on the panel
pub const CELLS: usize = 8;

/// One digit: a character and its decimal point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cell {
    pub ch: char,
    pub dot: bool,
}

impl Cell {
    pub const BLANK: Cell = Cell { ch: ' ', dot: false };

    pub const fn new(ch: char) -> Self {
        Self { ch, dot: false }
    }
}

/// Full panel contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    cells: [Cell; CELLS],
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl Frame {
    pub const fn blank() -> Self {
        Self {
            cells: [Cell::BLANK; CELLS],
        }
    }

    /// Left-justified text, blank-padded, cut after eight cells
    pub fn from_text(text: &str) -> Self {
        let mut frame = Self::blank();
        let mut len = 0;

        for ch in text.chars() {
            if ch == '.' && len > 0 && !frame.cells[len - 1].dot {
                frame.cells[len - 1].dot = true;
                continue;
            }
            if len == CELLS {
                break;
            }
            frame.cells[len] = if ch == '.' {
                Cell { ch: ' ', dot: true }
            } else {
                Cell::new(ch)
            };
            len += 1;
        }

        frame
    }

    /// One position of a right-to-left scroll of `text`
    ///
    /// At step 0 the first character sits in the rightmost cell; after
    /// [`marquee_steps`] steps the text has left the panel.
    pub fn marquee(text: &str, step: usize) -> Self {
        let mut frame = Self::blank();
        for (c, cell) in frame.cells.iter_mut().enumerate() {
            let Some(pos) = (step + c).checked_sub(CELLS - 1) else {
                continue;
            };
            if let Some(ch) = text.chars().nth(pos) {
                *cell = Cell::new(ch);
            }
        }
        frame
    }

    pub fn cells(&self) -> &[Cell; CELLS] {
        &self.cells
    }
}

/// Steps for `text` to scroll fully across and off the panel
pub fn marquee_steps(text: &str) -> usize {
    text.chars().count() + CELLS
}
