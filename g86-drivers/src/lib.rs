//! Display driver implementations
//!
//! Concrete implementations of the `g86-core` display traits for MAX7219
//! based panels on a blocking embedded-hal SPI bus:
//!
//! - [`max7219::Max7219`]: daisy-chained register access
//! - [`seven_segment::SevenSegment`]: 8-digit 7-segment panel (no-decode mode)
//! - [`matrix::DotMatrix`]: chained 8x8 LED modules with a 5x7 font

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod matrix;
pub mod max7219;
pub mod seven_segment;

#[cfg(test)]
pub(crate) mod testing {
    use core::convert::Infallible;

    use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

    /// Records every SPI write, one entry per transaction
    #[derive(Default)]
    pub struct RecordingSpi {
        pub frames: Vec<Vec<u8>>,
    }

    impl ErrorType for RecordingSpi {
        type Error = Infallible;
    }

    impl SpiDevice for RecordingSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            let mut frame = Vec::new();
            for op in operations.iter() {
                if let Operation::Write(data) = op {
                    frame.extend_from_slice(data);
                }
            }
            self.frames.push(frame);
            Ok(())
        }
    }
}
