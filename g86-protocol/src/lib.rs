//! G86-INFO MQTT protocol
//!
//! Everything the dashboard puts on, or takes off, the wire:
//!
//! - Topic layout (`<base>/<ECU|GPS|TM1|TM2>/<suffix>`) and validation
//! - Telemetry payload formatting for the two display panels
//! - Timer status publications (`value`, `started`, `paused`)
//! - A minimal MQTT 3.1.1 packet codec (QoS 0 client subset)
//!
//! # Topic Overview
//!
//! ```text
//! /GOLF86/ECU/RPM      ← inbound engine telemetry
//! /GOLF86/GPS/SPD      ← inbound GPS telemetry
//! /GOLF86/TM1/value    → outbound "HH-MM-SS:mmm"
//! /GOLF86/TM1/started  → outbound "true" | "false"
//! /GOLF86/TM1/paused   → outbound "true" | "false"
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod mqtt;
pub mod status;
pub mod telemetry;
pub mod topics;

pub use status::{Publication, TimerStatus};
pub use telemetry::{Message, TelemetryFormatter, MAX_MESSAGE_LEN};
pub use topics::{Group, Topic, TopicError, DEFAULT_BASE};
