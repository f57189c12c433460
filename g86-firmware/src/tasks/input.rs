//! Switch and encoder polling
//!
//! Polls the timer switches, the two toggle positions, and the menu
//! encoder with its push switch. Timer events go straight to the
//! [`TimerInputController`]; encoder events are queued for the menu task.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use g86_core::input::{
    QuadratureDecoder, Rotation, SwitchConfig, SwitchDecoder, SwitchEvent, TimerInput,
    TimerInputController,
};
use g86_core::menu::NavAction;
use g86_hal_rp2040::gpio::SwitchInput;
use g86_hal_rp2040::InputPin;

use crate::channels::{ChannelOutbox, TickSignals, NAV_CHANNEL, SHARED, TIMERS};

/// Poll period; fast enough for the encoder
pub const POLL_INTERVAL_MS: u64 = 2;

/// Pins read by [`input_task`]
pub struct InputPins {
    pub start_pause: SwitchInput<'static>,
    pub reset: SwitchInput<'static>,
    pub select_one: SwitchInput<'static>,
    pub select_two: SwitchInput<'static>,
    pub encoder_a: SwitchInput<'static>,
    pub encoder_b: SwitchInput<'static>,
    pub encoder_switch: SwitchInput<'static>,
}

struct TimerSwitch {
    input: TimerInput,
    decoder: SwitchDecoder,
}

impl TimerSwitch {
    const fn new(input: TimerInput, config: SwitchConfig) -> Self {
        Self {
            input,
            decoder: SwitchDecoder::new(config),
        }
    }
}

#[embassy_executor::task]
pub async fn input_task(pins: InputPins) {
    info!("Input task started");

    let mut controller = TimerInputController::new();
    let mut switches = [
        TimerSwitch::new(TimerInput::StartPause, SwitchConfig::button()),
        TimerSwitch::new(TimerInput::Reset, SwitchConfig::button()),
        TimerSwitch::new(TimerInput::SelectOne, SwitchConfig::toggle()),
        TimerSwitch::new(TimerInput::SelectTwo, SwitchConfig::toggle()),
    ];
    let mut encoder = QuadratureDecoder::new();
    let mut encoder_switch = SwitchDecoder::new(SwitchConfig::button());

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    loop {
        ticker.next().await;
        let now_ms = Instant::now().as_millis() as u32;

        let levels = [
            pins.start_pause.is_active(),
            pins.reset.is_active(),
            pins.select_one.is_active(),
            pins.select_two.is_active(),
        ];
        for (switch, active) in switches.iter_mut().zip(levels) {
            if let Some(event) = switch.decoder.update(active, now_ms) {
                debug!("{:?} {:?}", switch.input, event);
                controller
                    .handle(
                        switch.input,
                        event,
                        &TIMERS,
                        &SHARED,
                        &mut ChannelOutbox,
                        &mut TickSignals,
                    )
                    .await;
            }
        }

        let turned = match encoder.update(pins.encoder_a.is_high(), pins.encoder_b.is_high()) {
            Some(Rotation::Clockwise) => Some(NavAction::Inc),
            Some(Rotation::CounterClockwise) => Some(NavAction::Dec),
            None => None,
        };
        let pushed = match encoder_switch.update(pins.encoder_switch.is_active(), now_ms) {
            Some(SwitchEvent::Press) => Some(NavAction::Sel),
            Some(SwitchEvent::LongPress) => Some(NavAction::Esc),
            _ => None,
        };
        for action in [turned, pushed].into_iter().flatten() {
            if NAV_CHANNEL.try_send(action).is_err() {
                warn!("Menu busy, dropped {:?}", action);
            }
        }
    }
}
