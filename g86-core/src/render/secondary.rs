//! Secondary display render loop
//!
//! The firmware calls [`SecondaryRenderer::step`] forever on the second
//! core and sleeps for the returned number of milliseconds in between.
//! Each step reads the display mode and does one of:
//!
//! - `Welcome`: advance the banner marquee by one position
//! - `Mqtt`: show the pending message, if any, and consume it
//! - `Timer1` / `Timer2`: show the live readout of that timer
//!
//! Frames are only written to the panel when they change.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::frame::{marquee_steps, Frame, CELLS};
use crate::state::{DisplayMode, SharedState};
use crate::timer::{TimerBank, TimerId};
use crate::traits::SegmentDisplay;

/// Mode poll period
pub const POLL_INTERVAL_MS: u32 = 10;

/// Marquee shift period
pub const SHIFT_INTERVAL_MS: u32 = 250;

/// Pause after each marquee pass
pub const CYCLE_PAUSE_MS: u32 = 1000;

/// Banner shown in welcome mode
pub const WELCOME_TEXT: &str = "GOLF'86";

/// Render timing and banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    pub poll_ms: u32,
    pub shift_ms: u32,
    pub cycle_pause_ms: u32,
    pub welcome_text: &'static str,
    /// Re-check the mode between marquee shifts instead of finishing the pass
    pub welcome_interruptible: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            poll_ms: POLL_INTERVAL_MS,
            shift_ms: SHIFT_INTERVAL_MS,
            cycle_pause_ms: CYCLE_PAUSE_MS,
            welcome_text: WELCOME_TEXT,
            welcome_interruptible: false,
        }
    }
}

/// 7-segment render state machine
///
/// By default a marquee pass runs to completion (including the pause)
/// before the mode is looked at again, so switching away from the welcome
/// banner can take up to one full pass: fifteen shifts plus the pause.
#[derive(Debug, Clone)]
pub struct SecondaryRenderer {
    config: RendererConfig,
    last_mode: DisplayMode,
    /// Next marquee position while a pass is in progress
    marquee_step: Option<usize>,
    shown: Option<Frame>,
}

impl SecondaryRenderer {
    pub const fn new(config: RendererConfig) -> Self {
        Self {
            config,
            last_mode: DisplayMode::Welcome,
            marquee_step: None,
            shown: None,
        }
    }

    /// A marquee pass is in progress
    pub fn in_marquee(&self) -> bool {
        self.marquee_step.is_some()
    }

    /// Mode used by the last step
    pub fn last_mode(&self) -> DisplayMode {
        self.last_mode
    }

    /// Render one step; returns the delay before the next one in ms
    pub async fn step<M: RawMutex, D: SegmentDisplay>(
        &mut self,
        shared: &SharedState<M>,
        timers: &TimerBank<M>,
        display: &mut D,
    ) -> u32 {
        if let Some(step) = self.marquee_step {
            if !self.config.welcome_interruptible {
                return self.advance_marquee(step, display);
            }
        }

        // A lock timeout keeps rendering the previous mode
        let mode = shared.mode().await.unwrap_or(self.last_mode);
        if mode != self.last_mode {
            log_debug!("Secondary renderer: {}", mode.as_str());
            self.last_mode = mode;
        }

        match mode {
            DisplayMode::Welcome => {
                let step = self.marquee_step.unwrap_or(0);
                self.advance_marquee(step, display)
            }
            DisplayMode::Mqtt => {
                self.marquee_step = None;
                if let Some(message) = shared.take_message().await {
                    self.show(Frame::from_text(&message), display);
                }
                self.config.poll_ms
            }
            DisplayMode::Timer1 | DisplayMode::Timer2 => {
                self.marquee_step = None;
                let id = if mode == DisplayMode::Timer1 {
                    TimerId::One
                } else {
                    TimerId::Two
                };
                let text = timers.get(id).parts().display_text();
                self.show(Frame::from_text(&text), display);
                self.config.poll_ms
            }
        }
    }

    fn advance_marquee<D: SegmentDisplay>(&mut self, step: usize, display: &mut D) -> u32 {
        let text = self.config.welcome_text;
        if step >= marquee_steps(text) {
            self.marquee_step = None;
            return self.config.cycle_pause_ms;
        }
        self.show(Frame::marquee(text, step), display);
        self.marquee_step = Some(step + 1);
        self.config.shift_ms
    }

    /// Write `frame` if it differs from what is on the panel
    ///
    /// Cell `c` goes to digit `7 - c`, digit 0 being the rightmost.
    fn show<D: SegmentDisplay>(&mut self, frame: Frame, display: &mut D) {
        if self.shown == Some(frame) {
            return;
        }

        for (c, cell) in frame.cells().iter().enumerate() {
            let digit = (CELLS - 1 - c) as u8;
            if let Err(e) = display.set_char(0, digit, cell.ch, cell.dot) {
                log_warn!("Secondary display write failed: {:?}", e);
                // Unknown panel contents, rewrite everything next time
                self.shown = None;
                return;
            }
        }
        self.shown = Some(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TICK_INTERVAL_MS;
    use crate::traits::DisplayError;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type Bank = TimerBank<CriticalSectionRawMutex>;
    type State = SharedState<CriticalSectionRawMutex>;

    struct RecordingDisplay {
        digits: [(char, bool); 8],
        writes: usize,
        fail: bool,
    }

    impl RecordingDisplay {
        fn new() -> Self {
            Self {
                digits: [(' ', false); 8],
                writes: 0,
                fail: false,
            }
        }

        /// Panel contents left to right
        fn text(&self) -> String {
            self.digits.iter().rev().map(|&(ch, _)| ch).collect()
        }
    }

    impl SegmentDisplay for RecordingDisplay {
        fn set_char(
            &mut self,
            device: u8,
            digit: u8,
            ch: char,
            dot: bool,
        ) -> Result<(), DisplayError> {
            if self.fail {
                return Err(DisplayError::Bus);
            }
            assert_eq!(device, 0);
            self.digits[digit as usize] = (ch, dot);
            self.writes += 1;
            Ok(())
        }

        fn set_intensity(&mut self, _level: u8) -> Result<(), DisplayError> {
            Ok(())
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            self.digits = [(' ', false); 8];
            Ok(())
        }
    }

    struct Rig {
        renderer: SecondaryRenderer,
        shared: State,
        timers: Bank,
        display: RecordingDisplay,
    }

    impl Rig {
        fn new(config: RendererConfig) -> Self {
            Self {
                renderer: SecondaryRenderer::new(config),
                shared: State::new(),
                timers: Bank::new(),
                display: RecordingDisplay::new(),
            }
        }

        fn step(&mut self) -> u32 {
            block_on(
                self.renderer
                    .step(&self.shared, &self.timers, &mut self.display),
            )
        }

        fn set_mode(&self, mode: DisplayMode) {
            assert!(block_on(self.shared.set_mode(mode)));
        }
    }

    #[test]
    fn test_welcome_marquee_pass() {
        let mut rig = Rig::new(RendererConfig::default());

        assert_eq!(rig.step(), SHIFT_INTERVAL_MS);
        assert_eq!(rig.display.text(), "       G");
        assert_eq!(rig.display.digits[0].0, 'G');
        assert!(rig.renderer.in_marquee());

        for _ in 1..15 {
            assert_eq!(rig.step(), SHIFT_INTERVAL_MS);
        }
        assert_eq!(rig.display.text(), "        ");

        assert_eq!(rig.step(), CYCLE_PAUSE_MS);
        assert!(!rig.renderer.in_marquee());

        // Next pass starts over
        assert_eq!(rig.step(), SHIFT_INTERVAL_MS);
        assert_eq!(rig.display.text(), "       G");
    }

    #[test]
    fn test_marquee_finishes_before_mode_change() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.step();
        rig.set_mode(DisplayMode::Timer1);

        for _ in 1..15 {
            assert_eq!(rig.step(), SHIFT_INTERVAL_MS);
        }
        assert_eq!(rig.step(), CYCLE_PAUSE_MS);
        assert_eq!(rig.renderer.last_mode(), DisplayMode::Welcome);

        assert_eq!(rig.step(), POLL_INTERVAL_MS);
        assert_eq!(rig.display.text(), "00-00-00");
    }

    #[test]
    fn test_interruptible_marquee() {
        let mut rig = Rig::new(RendererConfig {
            welcome_interruptible: true,
            ..RendererConfig::default()
        });
        rig.step();
        rig.step();
        rig.set_mode(DisplayMode::Timer2);

        assert_eq!(rig.step(), POLL_INTERVAL_MS);
        assert!(!rig.renderer.in_marquee());
        assert_eq!(rig.display.text(), "00-00-00");
    }

    #[test]
    fn test_mqtt_message_left_justified_and_consumed() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.set_mode(DisplayMode::Mqtt);
        block_on(rig.shared.set_message("45kmh"));

        assert_eq!(rig.step(), POLL_INTERVAL_MS);
        assert_eq!(rig.display.text(), "45kmh   ");
        assert_eq!(rig.display.digits[7].0, '4');
        assert!(!block_on(rig.shared.is_available()));

        // Nothing new: frame retained, no writes
        let writes = rig.display.writes;
        rig.step();
        assert_eq!(rig.display.writes, writes);
        assert_eq!(rig.display.text(), "45kmh   ");
    }

    #[test]
    fn test_mqtt_decimal_point() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.set_mode(DisplayMode::Mqtt);
        block_on(rig.shared.set_message("12.8V"));
        rig.step();

        assert_eq!(rig.display.text(), "128V    ");
        assert_eq!(rig.display.digits[6], ('2', true));
    }

    #[test]
    fn test_timer_readout() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.timers.get(TimerId::One).start();
        for _ in 0..(12_340 / TICK_INTERVAL_MS) {
            rig.timers.get(TimerId::One).tick();
        }
        rig.set_mode(DisplayMode::Timer1);

        assert_eq!(rig.step(), POLL_INTERVAL_MS);
        assert_eq!(rig.display.text(), "00-12-34");

        rig.timers.get(TimerId::One).tick();
        rig.step();
        assert_eq!(rig.display.text(), "00-12-35");
    }

    #[test]
    fn test_every_tick_shown_on_next_poll() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.set_mode(DisplayMode::Timer1);
        rig.timers.get(TimerId::One).start();
        rig.step();

        // Ticks only count; the poll alone carries them to the panel
        for i in 1..=150u32 {
            rig.timers.get(TimerId::One).tick();
            assert_eq!(rig.step(), TICK_INTERVAL_MS);
            let ms = i * TICK_INTERVAL_MS;
            let expected = format!("00-{:02}-{:02}", ms / 1000, ms % 1000 / 10);
            assert_eq!(rig.display.text(), expected);
        }

        rig.timers.get(TimerId::One).pause();
        rig.step();
        assert_eq!(rig.display.text(), "00-01-50");
    }

    #[test]
    fn test_only_changed_frames_written() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.set_mode(DisplayMode::Timer2);
        rig.step();
        assert_eq!(rig.display.writes, 8);
        rig.step();
        rig.step();
        assert_eq!(rig.display.writes, 8);
    }

    #[test]
    fn test_lock_timeout_keeps_last_mode() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.set_mode(DisplayMode::Timer1);
        rig.step();

        let guard = block_on(rig.shared.mode.lock());
        rig.timers.get(TimerId::One).start();
        rig.timers.get(TimerId::One).tick();
        let delay = block_on(
            rig.renderer
                .step(&rig.shared, &rig.timers, &mut rig.display),
        );
        assert_eq!(delay, POLL_INTERVAL_MS);
        drop(guard);

        assert_eq!(rig.renderer.last_mode(), DisplayMode::Timer1);
        assert_eq!(rig.display.text(), "00-00-01");
    }

    #[test]
    fn test_write_failure_retried() {
        let mut rig = Rig::new(RendererConfig::default());
        rig.set_mode(DisplayMode::Timer1);
        rig.display.fail = true;
        rig.step();
        assert_eq!(rig.display.writes, 0);

        rig.display.fail = false;
        rig.step();
        assert_eq!(rig.display.writes, 8);
        assert_eq!(rig.display.text(), "00-00-00");
    }
}
