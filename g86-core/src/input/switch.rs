//! Switch debouncing and press classification

/// Contact must be stable this long before it counts
pub const DEBOUNCE_MS: u32 = 50;

/// Holds shorter than this are presses
pub const PRESS_MS: u32 = 500;

/// Holds at least this long are long presses
pub const LONG_PRESS_MS: u32 = 1000;

/// Event produced by a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchEvent {
    /// Contact closed and stable; toggle switches only care about this
    Down,
    /// Short press, reported on release
    Press,
    /// Held past the long press time, reported while still held
    LongPress,
}

/// Switch timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchConfig {
    pub debounce_ms: u32,
    pub press_ms: u32,
    pub long_press_ms: u32,
    /// Report long presses. Without it every release is a press.
    pub long_press: bool,
}

impl SwitchConfig {
    /// Momentary button with long press
    pub const fn button() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            press_ms: PRESS_MS,
            long_press_ms: LONG_PRESS_MS,
            long_press: true,
        }
    }

    /// Position switch, only key down matters
    pub const fn toggle() -> Self {
        Self {
            long_press: false,
            ..Self::button()
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self::button()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Bouncing { since: u32 },
    Held { since: u32, long_sent: bool },
}

/// Debounced switch
///
/// Call [`update`](Self::update) with the contact state on every poll.
/// With long press enabled, a release between the press and long press
/// times is treated as an abandoned hold and produces nothing.
#[derive(Debug, Clone)]
pub struct SwitchDecoder {
    config: SwitchConfig,
    state: State,
}

impl SwitchDecoder {
    pub const fn new(config: SwitchConfig) -> Self {
        Self {
            config,
            state: State::Idle,
        }
    }

    /// Feed the contact state (`true` = closed) at `now_ms`
    pub fn update(&mut self, active: bool, now_ms: u32) -> Option<SwitchEvent> {
        match self.state {
            State::Idle => {
                if active {
                    self.state = State::Bouncing { since: now_ms };
                }
                None
            }
            State::Bouncing { since } => {
                if !active {
                    self.state = State::Idle;
                    return None;
                }
                if now_ms.wrapping_sub(since) < self.config.debounce_ms {
                    return None;
                }
                self.state = State::Held {
                    since,
                    long_sent: false,
                };
                Some(SwitchEvent::Down)
            }
            State::Held { since, long_sent } => {
                let held = now_ms.wrapping_sub(since);
                if active {
                    if self.config.long_press && !long_sent && held >= self.config.long_press_ms {
                        self.state = State::Held {
                            since,
                            long_sent: true,
                        };
                        return Some(SwitchEvent::LongPress);
                    }
                    return None;
                }

                self.state = State::Idle;
                if long_sent || (self.config.long_press && held >= self.config.press_ms) {
                    return None;
                }
                Some(SwitchEvent::Press)
            }
        }
    }
}
