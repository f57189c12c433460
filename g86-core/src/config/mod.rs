//! Device configuration
//!
//! Settings edited through the menu and persisted to flash as
//! postcard-serialized binary data (see the firmware `config` module).

mod types;

pub use types::*;
