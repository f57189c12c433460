//! Board-agnostic core logic for the dashboard firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Cross-core shared state (secondary display mode, pending message)
//! - Chronometers and their tick/publish cadence
//! - Timer button handling and active timer selection
//! - Secondary (7-segment) display renderer
//! - Switch debouncing and rotary encoder decoding
//! - Settings menu model
//! - Telemetry routing and subscription bookkeeping for both panels
//! - Device configuration types
//! - Display and publish traits implemented by the firmware

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod config;
pub mod input;
pub mod menu;
pub mod render;
pub mod routing;
pub mod state;
pub mod timer;
pub mod traits;
