//! Chronometer tick tasks
//!
//! One task per timer. A timer's ticker runs only between `register` and
//! `deregister` (see [`crate::channels::TickSignals`]); each tick advances
//! the chronometer and, every tenth tick, queues its value for the broker.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use g86_core::timer::{TimerId, TICK_INTERVAL_MS};

use crate::channels::{ChannelOutbox, TICK_CONTROL, TIMERS};

#[embassy_executor::task(pool_size = 2)]
pub async fn tick_task(id: TimerId) {
    info!("Tick task {:?} started", id);
    let control = &TICK_CONTROL[id.index()];

    loop {
        // Idle until registered
        while !control.wait().await {}
        debug!("{:?} ticking", id);

        let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));
        loop {
            match select(ticker.next(), control.wait()).await {
                Either::First(()) => {
                    if TIMERS.tick(id, &mut ChannelOutbox).is_none() {
                        // Paused or reset without a deregister reaching us
                        break;
                    }
                }
                Either::Second(true) => {}
                Either::Second(false) => break,
            }
        }
        debug!("{:?} stopped", id);
    }
}
