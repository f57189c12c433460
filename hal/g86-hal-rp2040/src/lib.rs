//! RP2040-specific HAL for the dashboard firmware
//!
//! Implements the shared `g86-hal` traits on the Pico W:
//!
//! - Flash storage driver (implements `g86_hal::FlashStorage`)
//! - Active-low switch inputs (implements `g86_hal::InputPin`)

#![no_std]

pub mod flash;
pub mod gpio;

// Re-export shared traits from g86-hal for convenience
pub use g86_hal::{FlashStorage as FlashStorageTrait, InputPin, StorageKey};
