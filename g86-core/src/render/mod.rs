//! Secondary (7-segment) display rendering

mod frame;
mod secondary;

pub use frame::{marquee_steps, Cell, Frame, CELLS};
pub use secondary::{
    RendererConfig, SecondaryRenderer, CYCLE_PAUSE_MS, POLL_INTERVAL_MS, SHIFT_INTERVAL_MS,
    WELCOME_TEXT,
};
