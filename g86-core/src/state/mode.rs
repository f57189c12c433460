//! Secondary display mode

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What the secondary display is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayMode {
    /// Scrolling welcome banner
    #[default]
    Welcome,
    /// Telemetry for the secondary topic
    Mqtt,
    /// Live readout of timer 1
    Timer1,
    /// Live readout of timer 2
    Timer2,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Welcome => "WELCOME",
            DisplayMode::Mqtt => "MQTT",
            DisplayMode::Timer1 => "TIMER1",
            DisplayMode::Timer2 => "TIMER2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "WELCOME" => Some(DisplayMode::Welcome),
            "MQTT" => Some(DisplayMode::Mqtt),
            "TIMER1" => Some(DisplayMode::Timer1),
            "TIMER2" => Some(DisplayMode::Timer2),
            _ => None,
        }
    }

    /// Whether this mode shows a timer readout
    pub fn is_timer(self) -> bool {
        matches!(self, DisplayMode::Timer1 | DisplayMode::Timer2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for mode in [
            DisplayMode::Welcome,
            DisplayMode::Mqtt,
            DisplayMode::Timer1,
            DisplayMode::Timer2,
        ] {
            assert_eq!(DisplayMode::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(DisplayMode::from_name("TIMER3"), None);
        assert_eq!(DisplayMode::from_name("mqtt"), None);
    }

    #[test]
    fn test_is_timer() {
        assert!(!DisplayMode::Welcome.is_timer());
        assert!(!DisplayMode::Mqtt.is_timer());
        assert!(DisplayMode::Timer1.is_timer());
        assert!(DisplayMode::Timer2.is_timer());
    }
}
