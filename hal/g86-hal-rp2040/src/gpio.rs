//! Switch inputs
//!
//! Every switch on the dashboard closes to ground, so inputs are built
//! with the internal pull-up enabled.

use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_rp::Peri;

/// Input with pull-up, for a switch or encoder phase to ground
pub struct SwitchInput<'d> {
    input: Input<'d>,
}

impl<'d> SwitchInput<'d> {
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            input: Input::new(pin, Pull::Up),
        }
    }
}

impl g86_hal::InputPin for SwitchInput<'_> {
    fn is_high(&self) -> bool {
        self.input.is_high()
    }
}
