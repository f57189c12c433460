//! Topic layout
//!
//! All dashboard traffic lives under one base (`/GOLF86` by default):
//! `<base>/<group>/<suffix>`, where the group is one of `ECU`, `GPS`,
//! `TM1` or `TM2`. Topics are composed into a fixed 64-byte buffer.

use core::fmt::Write;

use heapless::String;

/// Topic buffer size (including the terminator the broker never sees)
pub const TOPIC_BUFFER_SIZE: usize = 64;

/// Longest topic that fits the buffer
pub const MAX_TOPIC_LEN: usize = TOPIC_BUFFER_SIZE - 1;

/// Default topic base
pub const DEFAULT_BASE: &str = "/GOLF86";

/// A composed topic
pub type Topic = String<MAX_TOPIC_LEN>;

/// Engine values published by the Speeduino bridge
///
/// - RPM: engine speed
/// - TPS: throttle position (%)
/// - VE1: volumetric efficiency (%)
/// - O2P: primary O2 sensor
/// - AFT: air-fuel ratio target
/// - MAT: manifold air temperature
/// - CAD: coolant temperature
/// - MAP: manifold absolute pressure
/// - BAT: battery voltage
/// - ADV: ignition advance
/// - PW1: injector pulse width
/// - SPK: spark
/// - DWL: dwell time
/// - ILL: idle load
/// - BAR: barometric pressure
/// - TAE: warm-up enrichment (%)
/// - NER: next error code
/// - ENG: engine status
pub const ECU_VALUES: [&str; 18] = [
    "RPM", "TPS", "VE1", "O2P", "AFT", "MAT", "CAD", "MAP", "BAT", "ADV", "PW1", "SPK", "DWL",
    "ILL", "BAR", "TAE", "NER", "ENG",
];

/// GPS values published by the tracker
pub const GPS_VALUES: [&str; 8] = ["SPD", "TME", "DTE", "LAT", "LNG", "ALT", "CRS", "QTY"];

/// Errors from topic composition or validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TopicError {
    /// Composed topic does not fit the buffer
    TooLong,
    /// Control character in topic
    InvalidCharacter,
    /// `#` wildcard anywhere but the last position
    MisplacedWildcard,
    /// Empty topic
    Empty,
}

/// Second-to-last topic segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Group {
    Ecu,
    Gps,
    Tm1,
    Tm2,
}

impl Group {
    /// Topic segment text
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Ecu => "ECU",
            Group::Gps => "GPS",
            Group::Tm1 => "TM1",
            Group::Tm2 => "TM2",
        }
    }

    /// Parse a topic segment
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "ECU" => Some(Group::Ecu),
            "GPS" => Some(Group::Gps),
            "TM1" => Some(Group::Tm1),
            "TM2" => Some(Group::Tm2),
            _ => None,
        }
    }

    /// Selectable telemetry values for this group
    ///
    /// Timer groups have nothing to subscribe to.
    pub fn values(self) -> &'static [&'static str] {
        match self {
            Group::Ecu => &ECU_VALUES,
            Group::Gps => &GPS_VALUES,
            Group::Tm1 | Group::Tm2 => &[],
        }
    }
}

/// Compose `<base>/<group>/<suffix>`
pub fn compose(base: &str, group: Group, suffix: &str) -> Result<Topic, TopicError> {
    let mut topic = Topic::new();
    write!(topic, "{}/{}/{}", base, group.as_str(), suffix).map_err(|_| {
        log_warn!(
            "Topic too long ({} chars, max {})",
            base.len() + group.as_str().len() + suffix.len() + 2,
            MAX_TOPIC_LEN
        );
        TopicError::TooLong
    })?;
    Ok(topic)
}

/// Check a topic for characters that must never reach the broker
///
/// Tab, CR and LF are tolerated; any other control character is rejected,
/// as is a `#` that is not the final character.
pub fn validate(topic: &str) -> Result<(), TopicError> {
    if topic.is_empty() {
        return Err(TopicError::Empty);
    }

    let bytes = topic.as_bytes();
    for (i, &byte) in bytes.iter().enumerate() {
        if byte < 32 && !matches!(byte, b'\t' | b'\n' | b'\r') {
            return Err(TopicError::InvalidCharacter);
        }
        if byte == b'#' && i + 1 != bytes.len() {
            return Err(TopicError::MisplacedWildcard);
        }
    }
    Ok(())
}

/// Split off the last two segments: `(group, value)`
///
/// `/GOLF86/GPS/SPD` yields `("GPS", "SPD")`. Topics with fewer than two
/// separators yield `None`.
pub fn tail(topic: &str) -> Option<(&str, &str)> {
    let last_slash = topic.rfind('/')?;
    let value = &topic[last_slash + 1..];
    let head = &topic[..last_slash];
    let second_slash = head.rfind('/')?;
    Some((&head[second_slash + 1..], value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compose_timer_topic() {
        let topic = compose(DEFAULT_BASE, Group::Tm1, "value").unwrap();
        assert_eq!(topic.as_str(), "/GOLF86/TM1/value");
    }

    #[test]
    fn test_compose_too_long() {
        let long_suffix = "x".repeat(60);
        assert_eq!(
            compose(DEFAULT_BASE, Group::Ecu, &long_suffix),
            Err(TopicError::TooLong)
        );
    }

    #[test]
    fn test_compose_exactly_fits() {
        // "/GOLF86/ECU/" is 12 chars
        let suffix = "y".repeat(MAX_TOPIC_LEN - 12);
        let topic = compose(DEFAULT_BASE, Group::Ecu, &suffix).unwrap();
        assert_eq!(topic.len(), MAX_TOPIC_LEN);
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate("/GOLF86/ECU/RPM"), Ok(()));
        assert_eq!(validate("/GOLF86/#"), Ok(()));
        assert_eq!(validate("/GOLF86/#/RPM"), Err(TopicError::MisplacedWildcard));
        assert_eq!(validate("/GOLF86\u{1}"), Err(TopicError::InvalidCharacter));
        assert_eq!(validate("/GOLF86\t"), Ok(()));
        assert_eq!(validate(""), Err(TopicError::Empty));
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("/GOLF86/GPS/SPD"), Some(("GPS", "SPD")));
        assert_eq!(tail("GPS/SPD"), None);
        assert_eq!(tail("/SPD"), None);
        assert_eq!(tail("a/b/"), Some(("b", "")));
    }

    #[test]
    fn test_group_segments() {
        for group in [Group::Ecu, Group::Gps, Group::Tm1, Group::Tm2] {
            assert_eq!(Group::from_segment(group.as_str()), Some(group));
        }
        assert_eq!(Group::from_segment("ecu"), None);
        assert_eq!(Group::Ecu.values().len(), 18);
        assert_eq!(Group::Gps.values()[0], "SPD");
        assert!(Group::Tm2.values().is_empty());
    }

    proptest! {
        #[test]
        fn test_composed_topics_validate_and_split(
            group_idx in 0usize..2,
            value_idx in 0usize..8,
        ) {
            let group = [Group::Ecu, Group::Gps][group_idx];
            let value = group.values()[value_idx];
            let topic = compose(DEFAULT_BASE, group, value).unwrap();
            prop_assert_eq!(validate(&topic), Ok(()));
            prop_assert_eq!(tail(&topic), Some((group.as_str(), value)));
        }
    }
}
