//! G86-INFO - Golf '86 dashboard firmware
//!
//! Raspberry Pi Pico W firmware driving two dashboard panels from MQTT
//! telemetry: a 32x8 dot-matrix line with a settings menu, and an 8-digit
//! 7-segment display that doubles as a two-channel stopwatch.
//!
//! # Pinout
//!
//! | Function              | Pin                         |
//! |-----------------------|-----------------------------|
//! | Dot-matrix (SPI0)     | CLK GP18, DIN GP19, CS GP17 |
//! | 7-segment (SPI1)      | CLK GP10, DIN GP11, CS GP13 |
//! | Start/pause, reset    | GP2, GP3                    |
//! | Timer 1/2 select      | GP4, GP5                    |
//! | Encoder A, B, switch  | GP6, GP7, GP8               |
//!
//! All switch inputs are active low with internal pull-ups.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{Executor, Spawner};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_time::Timer;
use embedded_hal_bus::spi::ExclusiveDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use g86_core::routing::Subscriptions;
use g86_core::timer::TimerId;
use g86_drivers::matrix::DotMatrix;
use g86_drivers::seven_segment::SevenSegment;
use g86_hal_rp2040::flash::Rp2040FlashStorage;
use g86_hal_rp2040::gpio::SwitchInput;
use g86_protocol::DEFAULT_BASE;

use crate::channels::MQTT_ONLINE;
use crate::config::ConfigPersistence;
use crate::tasks::wifi::{self, Credentials, WifiPins};
use crate::tasks::{Broker, InputPins};

mod channels;
mod config;
mod tasks;

/// MAX7219 serial clock
const DISPLAY_SPI_HZ: u32 = 1_000_000;

const CORE1_STACK_SIZE: usize = 8192;

static mut CORE1_STACK: Stack<CORE1_STACK_SIZE> = Stack::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

fn display_spi_config() -> SpiConfig {
    let mut config = SpiConfig::default();
    config.frequency = DISPLAY_SPI_HZ;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("G86-INFO firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // 7-segment panel renders on core 1
    let spi1 = Spi::new_blocking_txonly(p.SPI1, p.PIN_10, p.PIN_11, display_spi_config());
    let cs1 = Output::new(p.PIN_13, Level::High);
    let secondary = SevenSegment::new(ExclusiveDevice::new_no_delay(spi1, cs1).unwrap());

    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| spawner.spawn(tasks::secondary_task(secondary)).unwrap());
        },
    );
    info!("Core 1 started");

    let mut persistence = ConfigPersistence::new(Rp2040FlashStorage::new(p.FLASH, p.DMA_CH1));
    let config = persistence.load_or_default().await;
    info!(
        "Config: brightness={}, broker={}:{}",
        config.brightness,
        config.mqtt_server.as_str(),
        config.mqtt_port
    );

    let spi0 = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, display_spi_config());
    let cs0 = Output::new(p.PIN_17, Level::High);
    let primary = DotMatrix::new(ExclusiveDevice::new_no_delay(spi0, cs0).unwrap());

    let inputs = InputPins {
        start_pause: SwitchInput::new(p.PIN_2),
        reset: SwitchInput::new(p.PIN_3),
        select_one: SwitchInput::new(p.PIN_4),
        select_two: SwitchInput::new(p.PIN_5),
        encoder_a: SwitchInput::new(p.PIN_6),
        encoder_b: SwitchInput::new(p.PIN_7),
        encoder_switch: SwitchInput::new(p.PIN_8),
    };

    let broker = Broker::from_config(&config);
    let subscriptions = Subscriptions::from_config(&config, DEFAULT_BASE);
    let credentials = Credentials::from_config(&config);

    spawner.spawn(tasks::tick_task(TimerId::One)).unwrap();
    spawner.spawn(tasks::tick_task(TimerId::Two)).unwrap();
    spawner.spawn(tasks::input_task(inputs)).unwrap();
    spawner
        .spawn(tasks::menu_task(primary, config, persistence))
        .unwrap();

    info!("All tasks spawned");

    if !credentials.is_configured() {
        warn!("No WiFi SSID configured, running offline");
        MQTT_ONLINE.signal(false);
        loop {
            Timer::after_secs(60).await;
            trace!("Main loop heartbeat");
        }
    }

    let pins = WifiPins {
        pwr: p.PIN_23,
        dio: p.PIN_24,
        cs: p.PIN_25,
        clk: p.PIN_29,
        pio: p.PIO0,
        dma: p.DMA_CH0,
    };
    let (stack, control) = wifi::init(spawner, pins).await;
    spawner
        .spawn(tasks::mqtt_task(stack, broker, subscriptions))
        .unwrap();

    // The radio control handle stays on this task for the life of the link
    wifi::supervise(control, stack, credentials).await
}
