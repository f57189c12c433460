//! Chronometer state machine
//!
//! Idle --start--> Running --pause--> Paused --start--> Running
//! Any --reset--> Idle
//!
//! Ticks arrive from a periodic task every [`TICK_INTERVAL_MS`]. A tick
//! that lands after a pause or reset is ignored, so stopping the tick
//! source never races with the counter.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use g86_protocol::{Publication, TimerStatus};

use super::time::{TimeParts, MAX_ELAPSED_MS};
use super::TimerId;
use crate::traits::PublishOutbox;

/// Tick period
pub const TICK_INTERVAL_MS: u32 = 10;

/// Publish the value on every Nth tick (every 100 ms)
pub const PUBLISH_EVERY_TICKS: u32 = 10;

/// Chronometer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartOutcome {
    /// Left Idle
    Started,
    /// Left Paused, elapsed time kept
    Resumed,
    /// Was already running, nothing changed
    AlreadyRunning,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub elapsed_ms: u32,
    /// This tick is due for a value publication
    pub publish: bool,
}

/// Point-in-time view of a chronometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub phase: Phase,
    pub elapsed_ms: u32,
}

impl Snapshot {
    pub fn started(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn paused(&self) -> bool {
        self.phase == Phase::Paused
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Inner {
    phase: Phase,
    elapsed_ms: u32,
    ticks: u32,
}

/// One stopwatch
///
/// All transitions run inside a short critical section, so the tick task,
/// the button handler and the renderer on the other core always see a
/// consistent phase and value.
pub struct Chronometer<M: RawMutex> {
    inner: Mutex<M, Cell<Inner>>,
}

impl<M: RawMutex> Default for Chronometer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Chronometer<M> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Inner {
                phase: Phase::Idle,
                elapsed_ms: 0,
                ticks: 0,
            })),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        self.inner.lock(|cell| {
            let mut inner = cell.get();
            let result = f(&mut inner);
            cell.set(inner);
            result
        })
    }

    fn read(&self) -> Inner {
        self.inner.lock(|cell| cell.get())
    }

    /// Start from Idle or resume from Paused
    pub fn start(&self) -> StartOutcome {
        self.update(|inner| match inner.phase {
            Phase::Idle => {
                inner.phase = Phase::Running;
                inner.ticks = 0;
                StartOutcome::Started
            }
            Phase::Paused => {
                inner.phase = Phase::Running;
                StartOutcome::Resumed
            }
            Phase::Running => StartOutcome::AlreadyRunning,
        })
    }

    /// Stop accumulating; returns the held value if it was running
    pub fn pause(&self) -> Option<u32> {
        self.update(|inner| {
            if inner.phase != Phase::Running {
                return None;
            }
            inner.phase = Phase::Paused;
            Some(inner.elapsed_ms)
        })
    }

    /// Zero the value and return to Idle from any phase
    pub fn reset(&self) {
        self.update(|inner| *inner = Inner::default());
    }

    /// Advance by one tick
    ///
    /// Returns `None` unless running. The value saturates at
    /// [`MAX_ELAPSED_MS`] and the chronometer stays in Running.
    pub fn tick(&self) -> Option<TickReport> {
        self.update(|inner| {
            if inner.phase != Phase::Running {
                return None;
            }
            inner.elapsed_ms = inner
                .elapsed_ms
                .saturating_add(TICK_INTERVAL_MS)
                .min(MAX_ELAPSED_MS);
            inner.ticks = inner.ticks.wrapping_add(1);
            Some(TickReport {
                elapsed_ms: inner.elapsed_ms,
                publish: inner.ticks % PUBLISH_EVERY_TICKS == 0,
            })
        })
    }

    pub fn phase(&self) -> Phase {
        self.read().phase
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.read().elapsed_ms
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.read();
        Snapshot {
            phase: inner.phase,
            elapsed_ms: inner.elapsed_ms,
        }
    }

    /// Elapsed time split into clock fields
    pub fn parts(&self) -> TimeParts {
        TimeParts::from_millis(self.elapsed_ms())
    }
}

/// Both timers
pub struct TimerBank<M: RawMutex> {
    timers: [Chronometer<M>; 2],
}

impl<M: RawMutex> Default for TimerBank<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> TimerBank<M> {
    pub const fn new() -> Self {
        Self {
            timers: [Chronometer::new(), Chronometer::new()],
        }
    }

    pub fn get(&self, id: TimerId) -> &Chronometer<M> {
        &self.timers[id.index()]
    }

    /// Tick handler for one timer
    ///
    /// Publishes the value every [`PUBLISH_EVERY_TICKS`] ticks.
    pub fn tick(&self, id: TimerId, outbox: &mut impl PublishOutbox) -> Option<TickReport> {
        let report = self.get(id).tick()?;
        log_trace!("{:?} tick {}", id, report.elapsed_ms);
        if report.publish {
            let value = TimeParts::from_millis(report.elapsed_ms).wire_text();
            outbox.publish(Publication::new(id.group(), TimerStatus::Value(value)));
        }
        Some(report)
    }
}
