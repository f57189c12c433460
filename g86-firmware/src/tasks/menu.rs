//! Dot-matrix panel and settings menu
//!
//! Shows the welcome text until the first MQTT session result, then the
//! latest primary telemetry message, or `..N/A..` while offline. While the
//! menu is open the panel shows the menu line instead. Committed menu
//! changes are applied, persisted, and forwarded to the MQTT session.

use defmt::*;
use embassy_futures::select::{select4, Either4};
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Instant, Timer};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use g86_core::config::{DeviceConfig, TextAlign, TopicSelection};
use g86_core::menu::{Menu, MenuEffect};
use g86_core::routing::Panel;
use g86_core::state::DisplayMode;
use g86_core::traits::TextDisplay;
use g86_drivers::matrix::DotMatrix;
use g86_protocol::{Message, DEFAULT_BASE};

use crate::channels::{
    SubscriptionChange, MQTT_ONLINE, NAV_CHANNEL, PRIMARY_MESSAGE, SHARED,
    SUBSCRIPTION_CHANNEL,
};
use crate::config::ConfigPersistence;

pub const WELCOME_TEXT: &str = "Golf'86";
pub const OFFLINE_TEXT: &str = "..N/A..";

pub type PrimaryPanel =
    DotMatrix<ExclusiveDevice<Spi<'static, SPI0, Blocking>, Output<'static>, NoDelay>>;

/// What the panel shows while the menu is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum View {
    Welcome,
    Offline,
    Telemetry,
}

/// Panel wrapper that skips redundant redraws
struct Screen {
    panel: PrimaryPanel,
    shown: Option<(Message, TextAlign)>,
}

impl Screen {
    fn show(&mut self, text: &str, align: TextAlign) {
        if let Some((shown, shown_align)) = &self.shown {
            if shown.as_str() == text && *shown_align == align {
                return;
            }
        }
        match self.panel.print(text, align) {
            Ok(()) => {
                let mut copy = Message::new();
                let _ = copy.push_str(text);
                self.shown = Some((copy, align));
            }
            Err(e) => {
                warn!("Dot-matrix write failed: {:?}", e);
                self.shown = None;
            }
        }
    }

    fn set_intensity(&mut self, level: u8) {
        if let Err(e) = self.panel.set_intensity(level) {
            warn!("Dot-matrix intensity failed: {:?}", e);
        }
    }
}

#[embassy_executor::task]
pub async fn menu_task(
    mut panel: PrimaryPanel,
    mut config: DeviceConfig,
    mut persistence: ConfigPersistence<'static>,
) {
    info!("Menu task started");

    if let Err(e) = panel.init(config.brightness) {
        error!("Dot-matrix init failed: {:?}", e);
    }
    let mut screen = Screen { panel, shown: None };
    let mut menu = Menu::new();
    let mut view = View::Welcome;
    let mut message = Message::new();

    loop {
        if menu.is_open() {
            screen.show(&menu.line(), config.align);
        } else {
            let text = match view {
                View::Welcome => WELCOME_TEXT,
                View::Offline => OFFLINE_TEXT,
                View::Telemetry => message.as_str(),
            };
            screen.show(text, config.align);
        }

        let remaining = menu.timeout_remaining(Instant::now().as_millis() as u32);
        let idle_timeout = async move {
            match remaining {
                Some(ms) => Timer::after_millis(ms as u64).await,
                None => core::future::pending().await,
            }
        };
        let event = select4(
            NAV_CHANNEL.receive(),
            PRIMARY_MESSAGE.wait(),
            MQTT_ONLINE.wait(),
            idle_timeout,
        )
        .await;
        let now_ms = Instant::now().as_millis() as u32;

        let effect = match event {
            Either4::First(action) => menu.navigate(action, &config, now_ms),
            Either4::Second(text) => {
                message = text;
                if view != View::Offline {
                    view = View::Telemetry;
                }
                None
            }
            Either4::Third(online) => {
                view = match (online, message.is_empty()) {
                    (false, _) => View::Offline,
                    (true, true) => View::Welcome,
                    (true, false) => View::Telemetry,
                };
                debug!("Primary view {:?}", view);
                None
            }
            Either4::Fourth(()) => None,
        };

        // Other wakeups must not hold the menu open
        for effect in [effect, menu.poll_timeout(now_ms)].into_iter().flatten() {
            apply_effect(effect, &mut config, &mut persistence, &mut screen).await;
        }
    }
}

async fn apply_effect(
    effect: MenuEffect,
    config: &mut DeviceConfig,
    persistence: &mut ConfigPersistence<'static>,
    screen: &mut Screen,
) {
    debug!("Menu {:?}", effect);
    let changed = effect.apply(config);

    match effect {
        MenuEffect::Opened | MenuEffect::Closed | MenuEffect::SetAlign(_) => {}
        MenuEffect::SetPrimaryTopic(selection) => {
            if changed {
                resubscribe(Panel::Primary, selection).await;
            }
        }
        MenuEffect::SetSecondaryTopic(selection) => {
            if changed {
                resubscribe(Panel::Secondary, selection).await;
            }
        }
        MenuEffect::SetBrightness(level) => screen.set_intensity(level),
    }

    if effect.shows_secondary_telemetry() && !SHARED.set_mode(DisplayMode::Mqtt).await {
        warn!("Secondary mode change timed out");
    }

    if changed {
        if let Err(e) = persistence.save(config).await {
            error!("Failed to save config: {:?}", e);
        }
    }
}

async fn resubscribe(panel: Panel, selection: TopicSelection) {
    let Some(topic) = selection.topic(DEFAULT_BASE) else {
        return;
    };
    info!("{:?} topic {}", panel, topic.as_str());
    SUBSCRIPTION_CHANNEL
        .send(SubscriptionChange { panel, topic })
        .await;
}
