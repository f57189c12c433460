//! Elapsed time conversion and formatting

use core::fmt::Write;

use heapless::String;

use g86_protocol::status::ValueText;

/// Elapsed time ceiling, a little over 11 hours
///
/// Keeps the hour field at two digits in both text formats.
pub const MAX_ELAPSED_MS: u32 = 40_000_000;

/// Elapsed time split into clock fields
///
/// Hours are not wrapped at 24; the ceiling keeps them below 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeParts {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub hundredths: u32,
    pub millis: u32,
}

impl TimeParts {
    pub fn from_millis(elapsed_ms: u32) -> Self {
        let total_s = elapsed_ms / 1000;
        Self {
            hours: total_s / 3600,
            minutes: (total_s / 60) % 60,
            seconds: total_s % 60,
            hundredths: (elapsed_ms / 10) % 100,
            millis: elapsed_ms % 1000,
        }
    }

    pub fn from_centiseconds(elapsed_cs: u32) -> Self {
        let total_s = elapsed_cs / 100;
        Self {
            hours: total_s / 3600,
            minutes: (total_s / 60) % 60,
            seconds: total_s % 60,
            hundredths: elapsed_cs % 100,
            millis: (elapsed_cs % 100) * 10,
        }
    }

    /// Eight display cells
    ///
    /// `HH-MM-SS` once an hour has passed, `MM-SS-hh` before that so short
    /// runs keep sub-second precision.
    pub fn display_text(&self) -> String<8> {
        let mut text = String::new();
        let _ = if self.hours > 0 {
            write!(
                text,
                "{:02}-{:02}-{:02}",
                self.hours % 100,
                self.minutes,
                self.seconds
            )
        } else {
            write!(
                text,
                "{:02}-{:02}-{:02}",
                self.minutes, self.seconds, self.hundredths
            )
        };
        text
    }

    /// `HH-MM-SS:mmm` as published on the `value` topic
    pub fn wire_text(&self) -> ValueText {
        let mut text = ValueText::new();
        let _ = write!(
            text,
            "{:02}-{:02}-{:02}:{:03}",
            self.hours % 100,
            self.minutes,
            self.seconds,
            self.millis
        );
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_centiseconds_literal() {
        let parts = TimeParts::from_centiseconds(12345);
        assert_eq!(
            (parts.hours, parts.minutes, parts.seconds, parts.hundredths),
            (0, 2, 3, 45)
        );
    }

    #[test]
    fn test_from_millis_literal() {
        let parts = TimeParts::from_millis(12345);
        assert_eq!(parts.hours, 0);
        assert_eq!(parts.minutes, 0);
        assert_eq!(parts.seconds, 12);
        assert_eq!(parts.hundredths, 34);
        assert_eq!(parts.millis, 345);
    }

    #[test]
    fn test_display_text_short_run() {
        let parts = TimeParts::from_millis(123_450);
        assert_eq!(parts.display_text().as_str(), "02-03-45");
    }

    #[test]
    fn test_display_text_over_an_hour() {
        let parts = TimeParts::from_millis(3_723_450);
        assert_eq!(parts.display_text().as_str(), "01-02-03");
    }

    #[test]
    fn test_hours_not_wrapped() {
        let parts = TimeParts::from_millis(MAX_ELAPSED_MS);
        assert_eq!(parts.hours, 11);
        assert_eq!(parts.wire_text().as_str(), "11-06-40:000");
    }

    #[test]
    fn test_wire_text() {
        assert_eq!(TimeParts::from_millis(0).wire_text().as_str(), "00-00-00:000");
        assert_eq!(
            TimeParts::from_millis(3_723_456).wire_text().as_str(),
            "01-02-03:456"
        );
    }

    proptest! {
        #[test]
        fn test_conversion_recomposes(ms in 0u32..=MAX_ELAPSED_MS) {
            let parts = TimeParts::from_millis(ms);
            prop_assert!(parts.minutes < 60);
            prop_assert!(parts.seconds < 60);
            prop_assert!(parts.hundredths < 100);
            prop_assert_eq!(parts.hundredths, parts.millis / 10);
            let recomposed =
                ((parts.hours * 60 + parts.minutes) * 60 + parts.seconds) * 1000 + parts.millis;
            prop_assert_eq!(recomposed, ms);
        }

        #[test]
        fn test_text_widths(ms in 0u32..=MAX_ELAPSED_MS) {
            let parts = TimeParts::from_millis(ms);
            prop_assert_eq!(parts.display_text().len(), 8);
            prop_assert_eq!(parts.wire_text().len(), 12);
        }
    }
}
