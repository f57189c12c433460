//! 7-segment panel task, runs on core 1

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI1;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::Timer;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use g86_core::render::{RendererConfig, SecondaryRenderer};
use g86_drivers::seven_segment::SevenSegment;

use crate::channels::{SHARED, TIMERS};

pub type SecondaryPanel =
    SevenSegment<ExclusiveDevice<Spi<'static, SPI1, Blocking>, Output<'static>, NoDelay>>;

#[embassy_executor::task]
pub async fn secondary_task(mut panel: SecondaryPanel) {
    info!("Secondary display task started");

    if let Err(e) = panel.init() {
        error!("7-segment init failed: {:?}", e);
    }

    let mut renderer = SecondaryRenderer::new(RendererConfig::default());
    loop {
        let delay_ms = renderer.step(&SHARED, &TIMERS, &mut panel).await;
        Timer::after_millis(delay_ms as u64).await;
    }
}
