//! State shared between the primary and secondary cores
//!
//! The secondary (7-segment) renderer runs on its own core and reads the
//! display mode and pending message that the primary core writes. Both
//! live behind time-bounded locks in [`SharedState`].

mod mode;
mod shared;

pub use mode::DisplayMode;
pub use shared::{SharedState, LOCK_TIMEOUT_MS, MESSAGE_BUFFER_SIZE};
