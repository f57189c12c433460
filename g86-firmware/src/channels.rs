//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks on both cores.
//! Everything here uses `CriticalSectionRawMutex`, which is safe across
//! the two RP2040 cores.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU32, Ordering};

use g86_core::menu::NavAction;
use g86_core::routing::Panel;
use g86_core::state::SharedState;
use g86_core::timer::{TimerBank, TimerId};
use g86_core::traits::{PublishOutbox, TickRegistry};
use g86_protocol::{Message, Publication, Topic};

/// Outbound publications waiting for the MQTT session
const PUBLISH_CHANNEL_SIZE: usize = 16;

/// Encoder and push switch actions for the menu
const NAV_CHANNEL_SIZE: usize = 8;

/// Subscription changes from the menu
const SUBSCRIPTION_CHANNEL_SIZE: usize = 4;

/// Secondary display mode and pending message (read on core 1)
pub static SHARED: SharedState<CriticalSectionRawMutex> = SharedState::new();

/// Both chronometers
pub static TIMERS: TimerBank<CriticalSectionRawMutex> = TimerBank::new();

/// Timer status publications for the broker
pub static PUBLISH_CHANNEL: Channel<CriticalSectionRawMutex, Publication, PUBLISH_CHANNEL_SIZE> =
    Channel::new();

/// Publications dropped because the queue was full
pub static DROPPED_PUBLICATIONS: AtomicU32 = AtomicU32::new(0);

/// Navigation actions for the menu task
pub static NAV_CHANNEL: Channel<CriticalSectionRawMutex, NavAction, NAV_CHANNEL_SIZE> =
    Channel::new();

/// Replace the topic feeding `panel`
#[derive(Debug, Clone)]
pub struct SubscriptionChange {
    pub panel: Panel,
    pub topic: Topic,
}

pub static SUBSCRIPTION_CHANNEL: Channel<
    CriticalSectionRawMutex,
    SubscriptionChange,
    SUBSCRIPTION_CHANNEL_SIZE,
> = Channel::new();

/// Latest formatted message for the dot-matrix panel
pub static PRIMARY_MESSAGE: Signal<CriticalSectionRawMutex, Message> = Signal::new();

/// MQTT session state changes (true = connected)
pub static MQTT_ONLINE: Signal<CriticalSectionRawMutex, bool> = Signal::new();

/// Per-timer tick control: true starts the 10 ms ticker, false stops it
pub static TICK_CONTROL: [Signal<CriticalSectionRawMutex, bool>; 2] =
    [Signal::new(), Signal::new()];

/// [`PublishOutbox`] over [`PUBLISH_CHANNEL`]
///
/// Never waits; a full queue drops the publication.
pub struct ChannelOutbox;

impl PublishOutbox for ChannelOutbox {
    fn publish(&mut self, publication: Publication) {
        if PUBLISH_CHANNEL.try_send(publication).is_err() {
            DROPPED_PUBLICATIONS.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// [`TickRegistry`] over [`TICK_CONTROL`]
pub struct TickSignals;

impl TickRegistry for TickSignals {
    fn register(&mut self, timer: TimerId) {
        TICK_CONTROL[timer.index()].signal(true);
    }

    fn deregister(&mut self, timer: TimerId) {
        TICK_CONTROL[timer.index()].signal(false);
    }
}
