//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! Everything runs on core 0 except the secondary panel renderer.

pub mod input;
pub mod menu;
pub mod mqtt;
pub mod secondary;
pub mod tick;
pub mod wifi;

pub use input::{input_task, InputPins};
pub use menu::{menu_task, PrimaryPanel};
pub use mqtt::{mqtt_task, Broker};
pub use secondary::{secondary_task, SecondaryPanel};
pub use tick::tick_task;
