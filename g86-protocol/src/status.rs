//! Timer status publications
//!
//! Each timer reports on three topics under its group:
//! `value` (`HH-MM-SS:mmm`), `started` and `paused` (`true` / `false`).

use heapless::String;

use crate::topics::{self, Group, Topic, TopicError};

/// Length of a `HH-MM-SS:mmm` value
pub const VALUE_TEXT_LEN: usize = 12;

/// Value published on reset
pub const ZERO_VALUE: &str = "00-00-00:000";

/// Timer value text
pub type ValueText = String<VALUE_TEXT_LEN>;

/// One status field of a timer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerStatus {
    /// Elapsed time as `HH-MM-SS:mmm`
    Value(ValueText),
    Started(bool),
    Paused(bool),
}

impl TimerStatus {
    /// The zeroed value published on reset
    pub fn zero() -> Self {
        let mut text = ValueText::new();
        // Fits exactly
        let _ = text.push_str(ZERO_VALUE);
        TimerStatus::Value(text)
    }

    /// Topic suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            TimerStatus::Value(_) => "value",
            TimerStatus::Started(_) => "started",
            TimerStatus::Paused(_) => "paused",
        }
    }

    /// Payload text
    pub fn payload(&self) -> &str {
        match self {
            TimerStatus::Value(text) => text.as_str(),
            TimerStatus::Started(flag) | TimerStatus::Paused(flag) => bool_text(*flag),
        }
    }
}

fn bool_text(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

/// A status update addressed to a timer group
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Publication {
    pub group: Group,
    pub status: TimerStatus,
}

impl Publication {
    pub fn new(group: Group, status: TimerStatus) -> Self {
        Self { group, status }
    }

    /// Full topic under `base`
    pub fn topic(&self, base: &str) -> Result<Topic, TopicError> {
        topics::compose(base, self.group, self.status.suffix())
    }

    pub fn payload(&self) -> &str {
        self.status.payload()
    }
}
