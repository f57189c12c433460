//! Telemetry payload formatting
//!
//! Raw payloads from the ECU bridge and the GPS tracker are turned into
//! short display strings: units appended, clock and date shortened. Both
//! panels share the same transform.

use heapless::String;

use crate::topics;

/// Message buffer size (one byte kept for the terminator on the wire side)
pub const MESSAGE_BUFFER_SIZE: usize = 128;

/// Longest formatted message
pub const MAX_MESSAGE_LEN: usize = MESSAGE_BUFFER_SIZE - 1;

/// Minimum interval between colon blink toggles
pub const COLON_BLINK_MS: u32 = 1000;

/// A formatted display message
pub type Message = String<MAX_MESSAGE_LEN>;

/// Copy `text` into a message, truncating on a char boundary
///
/// Returns the message and whether anything was cut off.
pub fn bounded(text: &str) -> (Message, bool) {
    let mut message = Message::new();
    for ch in text.chars() {
        if message.push(ch).is_err() {
            return (message, true);
        }
    }
    (message, false)
}

/// Blink state of the clock colon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColonBlink {
    visible: bool,
    last_toggle_ms: u32,
}

impl Default for ColonBlink {
    fn default() -> Self {
        Self::new()
    }
}

impl ColonBlink {
    pub const fn new() -> Self {
        Self {
            visible: true,
            last_toggle_ms: 0,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility if a full blink interval has passed
    fn update(&mut self, now_ms: u32) {
        if now_ms.wrapping_sub(self.last_toggle_ms) >= COLON_BLINK_MS {
            self.visible = !self.visible;
            self.last_toggle_ms = now_ms;
        }
    }
}

/// Formats inbound telemetry for display
///
/// Holds the colon blink state, so one formatter should serve all the
/// messages of a panel.
#[derive(Debug, Clone, Default)]
pub struct TelemetryFormatter {
    blink: ColonBlink,
}

impl TelemetryFormatter {
    pub const fn new() -> Self {
        Self {
            blink: ColonBlink::new(),
        }
    }

    pub fn blink(&self) -> &ColonBlink {
        &self.blink
    }

    /// Format `payload` received on `topic`
    ///
    /// `now_ms` drives the clock colon blink. Topics without a
    /// `<group>/<value>` tail pass through unchanged.
    pub fn format(&mut self, topic: &str, payload: &str, now_ms: u32) -> Message {
        let payload = payload.trim();
        let Some((group, value)) = topics::tail(topic) else {
            return finish(bounded(payload));
        };

        let formatted = match (group, value) {
            ("GPS", "TME") => {
                let clock = format_clock(payload, self.blink.visible);
                // Evaluated after formatting so the first message always shows the colon
                self.blink.update(now_ms);
                clock
            }
            ("GPS", "DTE") => format_date(payload),
            ("GPS", "SPD") => format_speed(payload),
            ("GPS", "ALT") => with_unit(payload, "m"),
            ("ECU", "TPS" | "VE1" | "TAE") => with_unit(payload, "%"),
            ("ECU", "MAT" | "CAD") => with_unit(payload, "C"),
            ("ECU", "BAT") => with_unit(payload, "V"),
            ("ECU", "DWL") => with_unit(payload, "ms"),
            _ => bounded(payload),
        };

        finish(formatted)
    }
}

fn finish((message, truncated): (Message, bool)) -> Message {
    if truncated {
        log_warn!("Message truncated to {} bytes", MAX_MESSAGE_LEN);
    }
    message
}

fn with_unit(payload: &str, unit: &str) -> (Message, bool) {
    let (mut message, truncated) = bounded(payload);
    if truncated || message.push_str(unit).is_err() {
        return (message, true);
    }
    (message, false)
}

/// `HH:MM:SS` to `HH:MM`, colon blanked when hidden
fn format_clock(payload: &str, colon_visible: bool) -> (Message, bool) {
    let bytes = payload.as_bytes();
    let valid = bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());

    if !valid {
        log_warn!("Invalid time payload: {}", payload);
        return bounded(payload);
    }

    let mut message = Message::new();
    // Five ASCII bytes always fit
    let _ = message.push_str(&payload[..2]);
    let _ = message.push(if colon_visible { ':' } else { ' ' });
    let _ = message.push_str(&payload[3..5]);
    (message, false)
}

/// `dd.mm.yyyy` to `dd/mm`
fn format_date(payload: &str) -> (Message, bool) {
    let mut digits: String<16> = String::new();
    for ch in payload.chars().filter(|&c| c != '.') {
        if !ch.is_ascii_digit() || digits.push(ch).is_err() {
            log_warn!("Invalid date payload: {}", payload);
            return bounded(payload);
        }
    }
    if digits.len() < 4 {
        log_warn!("Invalid date payload: {}", payload);
        return bounded(payload);
    }

    let mut message = Message::new();
    let _ = message.push_str(&digits[..2]);
    let _ = message.push('/');
    let _ = message.push_str(&digits[2..4]);
    (message, false)
}

/// Speed truncated toward zero, with `kmh`
fn format_speed(payload: &str) -> (Message, bool) {
    use core::fmt::Write;

    let kmh = match payload.parse::<f32>() {
        Ok(speed) if speed.is_finite() => speed as i32,
        _ => {
            log_debug!("Unparsable speed: {}", payload);
            0
        }
    };

    let mut message = Message::new();
    let _ = write!(message, "{}kmh", kmh);
    (message, false)
}
