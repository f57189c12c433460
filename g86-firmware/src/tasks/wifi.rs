//! WiFi bring-up and link supervision
//!
//! Brings up the CYW43439 over PIO SPI, starts the embassy-net stack with
//! DHCP, and keeps the station joined. Joining is retried a bounded number
//! of times; running out of attempts resets the board.

use cyw43::{aligned_bytes, Control, JoinOptions};
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::{bind_interrupts, Peri};
use embassy_time::{with_timeout, Duration, Timer};
use heapless::String;
use static_cell::StaticCell;

use g86_core::config::{DeviceConfig, MAX_PASSWORD_LEN, MAX_SSID_LEN};

pub const JOIN_ATTEMPTS: u32 = 30;
pub const JOIN_RETRY_DELAY_MS: u64 = 1000;
const JOIN_TIMEOUT_S: u64 = 10;

/// Sockets: MQTT TCP, DNS, DHCP
const STACK_SOCKETS: usize = 4;

bind_interrupts!(struct PioIrqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

/// Pins wired to the CYW43439 on the Pico W
pub struct WifiPins {
    pub pwr: Peri<'static, PIN_23>,
    pub dio: Peri<'static, PIN_24>,
    pub cs: Peri<'static, PIN_25>,
    pub clk: Peri<'static, PIN_29>,
    pub pio: Peri<'static, PIO0>,
    pub dma: Peri<'static, DMA_CH0>,
}

/// Station credentials
#[derive(Clone)]
pub struct Credentials {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
}

impl Credentials {
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            ssid: config.wifi_ssid.clone(),
            password: config.wifi_password.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }

    fn join_options(&self) -> JoinOptions<'_> {
        if self.password.is_empty() {
            JoinOptions::new_open()
        } else {
            JoinOptions::new(self.password.as_bytes())
        }
    }
}

type WifiSpi = PioSpi<'static, PIO0, 0, DMA_CH0>;

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, cyw43::SpiBus<Output<'static>, WifiSpi>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Start the radio and the network stack
///
/// Spawns the driver and stack runners. The returned [`Control`] has to be
/// handed to [`supervise`] to actually join the network.
pub async fn init(spawner: Spawner, pins: WifiPins) -> (Stack<'static>, Control<'static>) {
    let fw = aligned_bytes!("../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");
    let nvram = aligned_bytes!("../../cyw43-firmware/nvram_rp2040.bin");

    let pwr = Output::new(pins.pwr, Level::Low);
    let cs = Output::new(pins.cs, Level::High);
    let mut pio = Pio::new(pins.pio, PioIrqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        pins.dio,
        pins.clk,
        pins.dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw, nvram).await;
    spawner.spawn(cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    let mut rng = RoscRng;
    let seed = rng.next_u64();

    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    info!("WiFi radio up");
    (stack, control)
}

/// Join the network, then rejoin whenever the link drops
///
/// Never returns. Exhausting [`JOIN_ATTEMPTS`] resets the board.
pub async fn supervise(mut control: Control<'static>, stack: Stack<'static>, credentials: Credentials) -> ! {
    loop {
        join(&mut control, &credentials).await;

        stack.wait_config_up().await;
        if let Some(config) = stack.config_v4() {
            let ip = config.address.address().octets();
            info!("DHCP address {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
        }

        stack.wait_link_down().await;
        warn!("WiFi link lost");
    }
}

async fn join(control: &mut Control<'static>, credentials: &Credentials) {
    for attempt in 1..=JOIN_ATTEMPTS {
        info!(
            "Joining {} (attempt {}/{})",
            credentials.ssid.as_str(),
            attempt,
            JOIN_ATTEMPTS
        );

        let result = with_timeout(
            Duration::from_secs(JOIN_TIMEOUT_S),
            control.join(credentials.ssid.as_str(), credentials.join_options()),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                info!("WiFi joined");
                return;
            }
            Ok(Err(_)) => warn!("Join rejected"),
            Err(_) => warn!("Join timed out after {} s", JOIN_TIMEOUT_S),
        }

        // Clears the driver's join state before the next attempt
        control.leave().await;
        Timer::after_millis(JOIN_RETRY_DELAY_MS).await;
    }

    error!("WiFi join failed {} times, resetting", JOIN_ATTEMPTS);
    Timer::after_millis(100).await;
    cortex_m::peripheral::SCB::sys_reset();
}
