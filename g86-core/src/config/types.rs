//! Configuration type definitions

use heapless::String;

use g86_protocol::topics::{self, Group, Topic};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bump when [`DeviceConfig`] changes shape
pub const CONFIG_VERSION: u8 = 1;

/// Maximum broker host name length
pub const MAX_SERVER_LEN: usize = 40;

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Highest display brightness
pub const MAX_BRIGHTNESS: u8 = 15;

/// Dot-matrix brightness at first boot
pub const DEFAULT_BRIGHTNESS: u8 = 5;

/// Default broker port
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Text alignment on the dot-matrix panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub const ALL: [TextAlign; 3] = [TextAlign::Left, TextAlign::Center, TextAlign::Right];

    /// One-letter menu code
    pub fn code(self) -> &'static str {
        match self {
            TextAlign::Left => "L",
            TextAlign::Center => "C",
            TextAlign::Right => "R",
        }
    }

    pub fn index(self) -> u8 {
        match self {
            TextAlign::Left => 0,
            TextAlign::Center => 1,
            TextAlign::Right => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Telemetry source a panel can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TopicGroup {
    #[default]
    Ecu,
    Gps,
}

impl TopicGroup {
    pub fn group(self) -> Group {
        match self {
            TopicGroup::Ecu => Group::Ecu,
            TopicGroup::Gps => Group::Gps,
        }
    }

    /// Value codes selectable in this group
    pub fn values(self) -> &'static [&'static str] {
        self.group().values()
    }
}

/// A telemetry value selected for a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopicSelection {
    pub group: TopicGroup,
    /// Index into the group's value list
    pub index: u8,
}

impl TopicSelection {
    pub const fn new(group: TopicGroup, index: u8) -> Self {
        Self { group, index }
    }

    /// Three-letter value code, `None` for an out-of-range index
    pub fn value_code(&self) -> Option<&'static str> {
        let code = self.group.values().get(self.index as usize).copied();
        if code.is_none() {
            log_error!("Invalid {:?} value index {}", self.group, self.index);
        }
        code
    }

    /// Subscription topic under `base`
    pub fn topic(&self, base: &str) -> Option<Topic> {
        let code = self.value_code()?;
        topics::compose(base, self.group.group(), code).ok()
    }
}

/// Persistent device settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    /// Layout version, see [`CONFIG_VERSION`]
    pub version: u8,
    /// Dot-matrix brightness (0-15)
    pub brightness: u8,
    /// Dot-matrix text alignment
    pub align: TextAlign,
    /// Broker host name or dotted IPv4 address
    pub mqtt_server: String<MAX_SERVER_LEN>,
    pub mqtt_port: u16,
    pub wifi_ssid: String<MAX_SSID_LEN>,
    pub wifi_password: String<MAX_PASSWORD_LEN>,
    /// Telemetry shown on the dot-matrix panel
    pub primary_topic: TopicSelection,
    /// Telemetry shown on the 7-segment panel
    pub secondary_topic: TopicSelection,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut mqtt_server = String::new();
        let _ = mqtt_server.push_str("localhost");

        Self {
            version: CONFIG_VERSION,
            brightness: DEFAULT_BRIGHTNESS,
            align: TextAlign::Left,
            mqtt_server,
            mqtt_port: DEFAULT_MQTT_PORT,
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            primary_topic: TopicSelection::new(TopicGroup::Ecu, 0),
            secondary_topic: TopicSelection::new(TopicGroup::Gps, 0),
        }
    }
}

impl DeviceConfig {
    /// Repair out-of-range values from an older or damaged record
    ///
    /// Returns `true` if anything was changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        if self.brightness > MAX_BRIGHTNESS {
            log_warn!("Brightness {} clamped", self.brightness);
            self.brightness = MAX_BRIGHTNESS;
            changed = true;
        }
        for selection in [&mut self.primary_topic, &mut self.secondary_topic] {
            if selection.value_code().is_none() {
                selection.index = 0;
                changed = true;
            }
        }
        if self.mqtt_server.is_empty() {
            let _ = self.mqtt_server.push_str("localhost");
            changed = true;
        }
        if self.mqtt_port == 0 {
            self.mqtt_port = DEFAULT_MQTT_PORT;
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g86_protocol::DEFAULT_BASE;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.brightness, 5);
        assert_eq!(config.align, TextAlign::Left);
        assert_eq!(config.mqtt_server.as_str(), "localhost");
        assert_eq!(config.mqtt_port, 1883);
        assert_eq!(config.primary_topic.value_code(), Some("RPM"));
        assert_eq!(config.secondary_topic.value_code(), Some("SPD"));
    }

    #[test]
    fn test_selection_topic() {
        let selection = TopicSelection::new(TopicGroup::Ecu, 8);
        assert_eq!(
            selection.topic(DEFAULT_BASE).unwrap().as_str(),
            "/GOLF86/ECU/BAT"
        );
    }

    #[test]
    fn test_invalid_index_rejected() {
        let selection = TopicSelection::new(TopicGroup::Gps, 8);
        assert_eq!(selection.value_code(), None);
        assert_eq!(selection.topic(DEFAULT_BASE), None);
    }

    #[test]
    fn test_sanitize() {
        let mut config = DeviceConfig {
            brightness: 40,
            mqtt_port: 0,
            secondary_topic: TopicSelection::new(TopicGroup::Gps, 99),
            ..DeviceConfig::default()
        };
        config.mqtt_server.clear();

        assert!(config.sanitize());
        assert_eq!(config.brightness, MAX_BRIGHTNESS);
        assert_eq!(config.mqtt_port, DEFAULT_MQTT_PORT);
        assert_eq!(config.secondary_topic.index, 0);
        assert_eq!(config.mqtt_server.as_str(), "localhost");

        assert!(!config.sanitize());
    }

    #[test]
    fn test_align_codes() {
        for align in TextAlign::ALL {
            assert_eq!(TextAlign::from_index(align.index()), Some(align));
        }
        assert_eq!(TextAlign::Center.code(), "C");
        assert_eq!(TextAlign::from_index(3), None);
    }
}
