//! Physical input decoding
//!
//! Pure state machines fed with pin levels and a millisecond clock by the
//! firmware polling task:
//!
//! - [`SwitchDecoder`]: debounced press / long press / key down events
//! - [`QuadratureDecoder`]: rotary encoder steps
//! - [`TimerInputController`]: timer buttons and toggle switches

mod encoder;
mod switch;
mod timer_buttons;

pub use encoder::{QuadratureDecoder, Rotation};
pub use switch::{
    SwitchConfig, SwitchDecoder, SwitchEvent, DEBOUNCE_MS, LONG_PRESS_MS, PRESS_MS,
};
pub use timer_buttons::{TimerInput, TimerInputController};
