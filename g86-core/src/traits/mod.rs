//! Hardware and service abstraction traits
//!
//! These traits define the interface between core logic and the firmware.
//! The firmware implements them for the MAX7219 panels and the MQTT
//! session; tests implement them with recording fakes.

mod display;
mod publish;

pub use display::{DisplayError, SegmentDisplay, TextDisplay};
pub use publish::{PublishOutbox, TickRegistry};
