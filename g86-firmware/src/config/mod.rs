//! Device configuration persistence
//!
//! Loads settings from flash, falling back to compiled-in defaults.

pub mod loader;

pub use loader::{default_config, ConfigError, ConfigPersistence};
