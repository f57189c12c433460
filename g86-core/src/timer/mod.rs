//! Dual stopwatch timers
//!
//! Two independent chronometers count elapsed milliseconds in 10 ms ticks.
//! Both may run at the same time; the toggle switches only choose which
//! one the start/pause and reset buttons act on, and which one is shown.

mod chronometer;
mod time;

pub use chronometer::{
    Chronometer, Phase, Snapshot, StartOutcome, TickReport, TimerBank, PUBLISH_EVERY_TICKS,
    TICK_INTERVAL_MS,
};
pub use time::{TimeParts, MAX_ELAPSED_MS};

use g86_protocol::Group;

use crate::state::DisplayMode;

/// Timer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    #[default]
    One,
    Two,
}

impl TimerId {
    pub const ALL: [TimerId; 2] = [TimerId::One, TimerId::Two];

    /// Array index
    pub fn index(self) -> usize {
        match self {
            TimerId::One => 0,
            TimerId::Two => 1,
        }
    }

    /// Secondary display mode showing this timer
    pub fn display_mode(self) -> DisplayMode {
        match self {
            TimerId::One => DisplayMode::Timer1,
            TimerId::Two => DisplayMode::Timer2,
        }
    }

    /// Timer shown in `mode`, if any
    pub fn from_mode(mode: DisplayMode) -> Option<Self> {
        match mode {
            DisplayMode::Timer1 => Some(TimerId::One),
            DisplayMode::Timer2 => Some(TimerId::Two),
            DisplayMode::Welcome | DisplayMode::Mqtt => None,
        }
    }

    /// Topic group for status publications
    pub fn group(self) -> Group {
        match self {
            TimerId::One => Group::Tm1,
            TimerId::Two => Group::Tm2,
        }
    }
}
