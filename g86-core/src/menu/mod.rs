//! Settings menu
//!
//! Driven by the rotary encoder (Inc / Dec) and its push switch (Sel on
//! press, Esc on long press). The menu owns no hardware: it turns
//! navigation actions into a text line for the dot-matrix panel and into
//! [`MenuEffect`]s the firmware applies, persists and acts on.
//!
//! ```text
//! Closed --any--> Header --Inc/Sel--> Browsing(item) --Sel--> Editing(item, value)
//!   ^               |                    |   ^                    |
//!   +-----Esc-------+--------Esc---------+   +-----Sel/Esc--------+
//! ```
//!
//! Three seconds without input closes the menu from any state. While
//! editing, fast encoder turns step by more than one value.

use core::fmt::Write;

use heapless::String;

use crate::config::{DeviceConfig, TextAlign, TopicGroup, TopicSelection, MAX_BRIGHTNESS};

/// Idle time before the menu closes itself
pub const MENU_TIMEOUT_MS: u32 = 3000;

/// Shown when the menu opens
pub const MENU_HEADER: &str = "Menu>>>";

/// Largest edit step is `1 << MAX_STEP_SHIFT`
const MAX_STEP_SHIFT: u32 = 3;

/// A rendered menu line
pub type MenuLine = String<16>;

/// Navigation input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavAction {
    /// Encoder clockwise
    Inc,
    /// Encoder counter-clockwise
    Dec,
    /// Push switch press
    Sel,
    /// Push switch long press
    Esc,
}

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuItem {
    PrimaryEcu,
    PrimaryGps,
    SecondaryEcu,
    SecondaryGps,
    Position,
    Brightness,
}

impl MenuItem {
    pub const ALL: [MenuItem; 6] = [
        MenuItem::PrimaryEcu,
        MenuItem::PrimaryGps,
        MenuItem::SecondaryEcu,
        MenuItem::SecondaryGps,
        MenuItem::Position,
        MenuItem::Brightness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::PrimaryEcu => "P:ECU",
            MenuItem::PrimaryGps => "P:GPS",
            MenuItem::SecondaryEcu => "S:ECU",
            MenuItem::SecondaryGps => "S:GPS",
            MenuItem::Position => "POS",
            MenuItem::Brightness => "BRT",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|&item| item == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Topic group edited by this item
    fn topic_group(self) -> Option<TopicGroup> {
        match self {
            MenuItem::PrimaryEcu | MenuItem::SecondaryEcu => Some(TopicGroup::Ecu),
            MenuItem::PrimaryGps | MenuItem::SecondaryGps => Some(TopicGroup::Gps),
            MenuItem::Position | MenuItem::Brightness => None,
        }
    }

    /// Number of selectable values
    fn value_count(self) -> u8 {
        match self.topic_group() {
            Some(group) => group.values().len() as u8,
            None if self == MenuItem::Position => TextAlign::ALL.len() as u8,
            None => MAX_BRIGHTNESS + 1,
        }
    }

    /// Current value of this item in `config`
    fn current(self, config: &DeviceConfig) -> u8 {
        let selection = match self {
            MenuItem::PrimaryEcu | MenuItem::PrimaryGps => config.primary_topic,
            MenuItem::SecondaryEcu | MenuItem::SecondaryGps => config.secondary_topic,
            MenuItem::Position => return config.align.index(),
            MenuItem::Brightness => return config.brightness.min(MAX_BRIGHTNESS),
        };
        // Editing the other group starts from its first value
        if Some(selection.group) == self.topic_group() && selection.index < self.value_count() {
            selection.index
        } else {
            0
        }
    }
}

/// A committed change or a visibility change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuEffect {
    Opened,
    Closed,
    SetPrimaryTopic(TopicSelection),
    SetSecondaryTopic(TopicSelection),
    SetAlign(TextAlign),
    SetBrightness(u8),
}

impl MenuEffect {
    /// Write the change into `config`; `true` if it changed anything
    pub fn apply(&self, config: &mut DeviceConfig) -> bool {
        match *self {
            MenuEffect::Opened | MenuEffect::Closed => false,
            MenuEffect::SetPrimaryTopic(selection) => {
                replace(&mut config.primary_topic, selection)
            }
            MenuEffect::SetSecondaryTopic(selection) => {
                replace(&mut config.secondary_topic, selection)
            }
            MenuEffect::SetAlign(align) => replace(&mut config.align, align),
            MenuEffect::SetBrightness(level) => {
                replace(&mut config.brightness, level.min(MAX_BRIGHTNESS))
            }
        }
    }

    /// The secondary panel should switch to telemetry
    pub fn shows_secondary_telemetry(&self) -> bool {
        matches!(self, MenuEffect::SetSecondaryTopic(_))
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuState {
    Closed,
    Header,
    Browsing(MenuItem),
    Editing(MenuItem, u8),
}

/// Menu state machine
#[derive(Debug, Clone)]
pub struct Menu {
    state: MenuState,
    last_input_ms: u32,
    /// Previous Inc/Dec while editing, for the turn rate
    last_turn_ms: Option<u32>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub const fn new() -> Self {
        Self {
            state: MenuState::Closed,
            last_input_ms: 0,
            last_turn_ms: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state != MenuState::Closed
    }

    /// Apply one navigation action
    pub fn navigate(
        &mut self,
        action: NavAction,
        config: &DeviceConfig,
        now_ms: u32,
    ) -> Option<MenuEffect> {
        self.last_input_ms = now_ms;
        let turning = matches!(
            (self.state, action),
            (MenuState::Editing(..), NavAction::Inc | NavAction::Dec)
        );
        if !turning {
            self.last_turn_ms = None;
        }

        let (next, effect) = match (self.state, action) {
            (MenuState::Closed, _) => (MenuState::Header, Some(MenuEffect::Opened)),

            (MenuState::Header, NavAction::Inc | NavAction::Sel) => {
                (MenuState::Browsing(MenuItem::ALL[0]), None)
            }
            (MenuState::Header, NavAction::Dec) => {
                (MenuState::Browsing(MenuItem::ALL[MenuItem::ALL.len() - 1]), None)
            }
            (MenuState::Header | MenuState::Browsing(_), NavAction::Esc) => {
                (MenuState::Closed, Some(MenuEffect::Closed))
            }

            (MenuState::Browsing(item), NavAction::Inc) => (MenuState::Browsing(item.next()), None),
            (MenuState::Browsing(item), NavAction::Dec) => (MenuState::Browsing(item.prev()), None),
            (MenuState::Browsing(item), NavAction::Sel) => {
                (MenuState::Editing(item, item.current(config)), None)
            }

            (MenuState::Editing(item, value), NavAction::Inc) => {
                let delta = self.turn_delta(now_ms);
                (MenuState::Editing(item, step(item, value, delta, true)), None)
            }
            (MenuState::Editing(item, value), NavAction::Dec) => {
                let delta = self.turn_delta(now_ms);
                (MenuState::Editing(item, step(item, value, delta, false)), None)
            }
            (MenuState::Editing(item, value), NavAction::Sel) => {
                (MenuState::Browsing(item), commit(item, value))
            }
            (MenuState::Editing(item, _), NavAction::Esc) => (MenuState::Browsing(item), None),
        };

        self.state = next;
        effect
    }

    /// Edit step for a turn at `now_ms`
    ///
    /// The turn rate in detents per second picks the step: below 8/s one
    /// value, then doubling every 8/s up to `1 << MAX_STEP_SHIFT`.
    fn turn_delta(&mut self, now_ms: u32) -> u8 {
        let rate = match self.last_turn_ms.replace(now_ms) {
            Some(prev) => 1000 / now_ms.wrapping_sub(prev).max(1),
            None => 0,
        };
        1u8 << (rate >> 3).min(MAX_STEP_SHIFT)
    }

    /// Time left before the idle timeout, `None` while closed
    pub fn timeout_remaining(&self, now_ms: u32) -> Option<u32> {
        if !self.is_open() {
            return None;
        }
        let idle = now_ms.wrapping_sub(self.last_input_ms);
        Some(MENU_TIMEOUT_MS.saturating_sub(idle))
    }

    /// Close the menu after [`MENU_TIMEOUT_MS`] without input
    pub fn poll_timeout(&mut self, now_ms: u32) -> Option<MenuEffect> {
        if self.is_open() && now_ms.wrapping_sub(self.last_input_ms) >= MENU_TIMEOUT_MS {
            log_debug!("Menu timeout");
            self.state = MenuState::Closed;
            return Some(MenuEffect::Closed);
        }
        None
    }

    /// Text for the dot-matrix panel; empty while closed
    pub fn line(&self) -> MenuLine {
        let mut line = MenuLine::new();
        let _ = match self.state {
            MenuState::Closed => Ok(()),
            MenuState::Header => line.push_str(MENU_HEADER),
            MenuState::Browsing(item) => line.push_str(item.label()),
            MenuState::Editing(item, value) => {
                write_value(&mut line, item, value);
                Ok(())
            }
        };
        line
    }
}

fn step(item: MenuItem, value: u8, delta: u8, up: bool) -> u8 {
    let count = item.value_count();
    if item == MenuItem::Brightness {
        // Brightness stops at the ends
        return if up {
            value.saturating_add(delta).min(count - 1)
        } else {
            value.saturating_sub(delta)
        };
    }
    let delta = delta % count;
    if up {
        (value + delta) % count
    } else {
        (value + count - delta) % count
    }
}

fn commit(item: MenuItem, value: u8) -> Option<MenuEffect> {
    let effect = match item {
        MenuItem::PrimaryEcu => {
            MenuEffect::SetPrimaryTopic(TopicSelection::new(TopicGroup::Ecu, value))
        }
        MenuItem::PrimaryGps => {
            MenuEffect::SetPrimaryTopic(TopicSelection::new(TopicGroup::Gps, value))
        }
        MenuItem::SecondaryEcu => {
            MenuEffect::SetSecondaryTopic(TopicSelection::new(TopicGroup::Ecu, value))
        }
        MenuItem::SecondaryGps => {
            MenuEffect::SetSecondaryTopic(TopicSelection::new(TopicGroup::Gps, value))
        }
        MenuItem::Position => match TextAlign::from_index(value) {
            Some(align) => MenuEffect::SetAlign(align),
            None => {
                log_error!("Invalid alignment index {}", value);
                return None;
            }
        },
        MenuItem::Brightness => MenuEffect::SetBrightness(value.min(MAX_BRIGHTNESS)),
    };
    log_info!("Menu commit {:?}", effect);
    Some(effect)
}

fn write_value(line: &mut MenuLine, item: MenuItem, value: u8) {
    let _ = match item.topic_group() {
        Some(group) => {
            let code = group.values().get(value as usize).copied();
            line.push_str(code.unwrap_or("---"))
        }
        None if item == MenuItem::Position => {
            let code = TextAlign::from_index(value).map(TextAlign::code).unwrap_or("?");
            write!(line, "P:{}", code).map_err(|_| ())
        }
        None => write!(line, "B:{}", value).map_err(|_| ()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use g86_protocol::topics::ECU_VALUES;

    fn open_at(menu: &mut Menu, item: MenuItem, config: &DeviceConfig) {
        menu.navigate(NavAction::Sel, config, 0);
        menu.navigate(NavAction::Sel, config, 0);
        while menu.line().as_str() != item.label() {
            menu.navigate(NavAction::Inc, config, 0);
        }
    }

    #[test]
    fn test_open_shows_header() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        assert!(!menu.is_open());
        assert_eq!(menu.line().as_str(), "");

        assert_eq!(
            menu.navigate(NavAction::Inc, &config, 0),
            Some(MenuEffect::Opened)
        );
        assert_eq!(menu.line().as_str(), MENU_HEADER);

        menu.navigate(NavAction::Inc, &config, 10);
        assert_eq!(menu.line().as_str(), "P:ECU");
        menu.navigate(NavAction::Dec, &config, 20);
        assert_eq!(menu.line().as_str(), "BRT");
    }

    #[test]
    fn test_any_action_opens_on_header() {
        let config = DeviceConfig::default();
        for action in [NavAction::Inc, NavAction::Dec, NavAction::Sel, NavAction::Esc] {
            let mut menu = Menu::new();
            assert_eq!(menu.navigate(action, &config, 0), Some(MenuEffect::Opened));
            assert_eq!(menu.line().as_str(), MENU_HEADER);
        }

        let mut menu = Menu::new();
        menu.navigate(NavAction::Esc, &config, 0);
        menu.navigate(NavAction::Sel, &config, 10);
        assert_eq!(menu.line().as_str(), "P:ECU");

        let mut menu = Menu::new();
        menu.navigate(NavAction::Sel, &config, 0);
        assert_eq!(menu.navigate(NavAction::Esc, &config, 10), Some(MenuEffect::Closed));
        assert!(!menu.is_open());
    }

    #[test]
    fn test_edit_secondary_gps() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::SecondaryGps, &config);

        menu.navigate(NavAction::Sel, &config, 0);
        // Default secondary topic is GPS/SPD
        assert_eq!(menu.line().as_str(), "SPD");
        menu.navigate(NavAction::Inc, &config, 0);
        assert_eq!(menu.line().as_str(), "TME");

        let effect = menu.navigate(NavAction::Sel, &config, 0).unwrap();
        assert_eq!(
            effect,
            MenuEffect::SetSecondaryTopic(TopicSelection::new(TopicGroup::Gps, 1))
        );
        assert!(effect.shows_secondary_telemetry());
        assert_eq!(menu.line().as_str(), "S:GPS");
    }

    #[test]
    fn test_list_wraps() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::PrimaryEcu, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        menu.navigate(NavAction::Dec, &config, 0);
        assert_eq!(menu.line().as_str(), "ENG");
        menu.navigate(NavAction::Inc, &config, 500);
        assert_eq!(menu.line().as_str(), "RPM");
    }

    #[test]
    fn test_other_group_starts_at_first_value() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        // Primary is ECU/RPM, so editing P:GPS starts at SPD
        open_at(&mut menu, MenuItem::PrimaryGps, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        assert_eq!(menu.line().as_str(), "SPD");
    }

    #[test]
    fn test_brightness_clamps() {
        let mut config = DeviceConfig::default();
        config.brightness = 14;
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::Brightness, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        assert_eq!(menu.line().as_str(), "B:14");
        menu.navigate(NavAction::Inc, &config, 0);
        menu.navigate(NavAction::Inc, &config, 500);
        assert_eq!(menu.line().as_str(), "B:15");

        let effect = menu.navigate(NavAction::Sel, &config, 0).unwrap();
        assert!(effect.apply(&mut config));
        assert_eq!(config.brightness, 15);
        assert!(!effect.apply(&mut config));
    }

    #[test]
    fn test_position_edit() {
        let mut config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::Position, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        assert_eq!(menu.line().as_str(), "P:L");
        menu.navigate(NavAction::Dec, &config, 0);
        assert_eq!(menu.line().as_str(), "P:R");

        let effect = menu.navigate(NavAction::Sel, &config, 0).unwrap();
        assert!(effect.apply(&mut config));
        assert_eq!(config.align, TextAlign::Right);
    }

    #[test]
    fn test_escape_cancels_edit_then_closes() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::PrimaryEcu, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        menu.navigate(NavAction::Inc, &config, 0);

        assert_eq!(menu.navigate(NavAction::Esc, &config, 0), None);
        assert_eq!(menu.line().as_str(), "P:ECU");
        assert_eq!(
            menu.navigate(NavAction::Esc, &config, 0),
            Some(MenuEffect::Closed)
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn test_timeout_closes() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        menu.navigate(NavAction::Sel, &config, 1000);
        assert_eq!(menu.poll_timeout(3999), None);
        assert_eq!(menu.poll_timeout(4000), Some(MenuEffect::Closed));
        assert!(!menu.is_open());
        assert_eq!(menu.poll_timeout(9000), None);
    }

    #[test]
    fn test_timeout_not_reset_by_time_passing() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        menu.navigate(NavAction::Sel, &config, 0);

        // Checked on every wakeup, however frequent
        let mut closed_at = None;
        for now in (0..=4000).step_by(50) {
            if menu.poll_timeout(now).is_some() {
                closed_at = Some(now);
                break;
            }
        }
        assert_eq!(closed_at, Some(MENU_TIMEOUT_MS));
    }

    #[test]
    fn test_timeout_remaining_counts_down() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        assert_eq!(menu.timeout_remaining(0), None);

        menu.navigate(NavAction::Sel, &config, 1000);
        assert_eq!(menu.timeout_remaining(1000), Some(3000));
        assert_eq!(menu.timeout_remaining(2500), Some(1500));
        assert_eq!(menu.timeout_remaining(5000), Some(0));

        menu.navigate(NavAction::Inc, &config, 2000);
        assert_eq!(menu.timeout_remaining(2500), Some(2500));
    }

    #[test]
    fn test_timeout_across_clock_wrap() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        menu.navigate(NavAction::Sel, &config, u32::MAX - 999);
        assert_eq!(menu.timeout_remaining(1000), Some(1000));
        assert_eq!(menu.poll_timeout(1999), None);
        assert_eq!(menu.poll_timeout(2000), Some(MenuEffect::Closed));
    }

    #[test]
    fn test_slow_turns_step_by_one() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::PrimaryEcu, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        for (i, now) in [200, 400, 600].into_iter().enumerate() {
            menu.navigate(NavAction::Inc, &config, now);
            assert_eq!(menu.line().as_str(), ECU_VALUES[i + 1]);
        }
    }

    #[test]
    fn test_fast_turns_accelerate() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::PrimaryEcu, &config);
        menu.navigate(NavAction::Sel, &config, 0);

        // First turn has no rate yet
        menu.navigate(NavAction::Inc, &config, 1000);
        assert_eq!(menu.line().as_str(), "TPS");
        // 100 ms apart is 10/s: two values
        menu.navigate(NavAction::Inc, &config, 1100);
        assert_eq!(menu.line().as_str(), "O2P");
        // 20 ms apart is 50/s: capped at eight
        menu.navigate(NavAction::Inc, &config, 1120);
        assert_eq!(menu.line().as_str(), "SPK");
        // Backwards at the same rate wraps past the start
        menu.navigate(NavAction::Dec, &config, 1140);
        assert_eq!(menu.line().as_str(), "O2P");
        menu.navigate(NavAction::Dec, &config, 1160);
        assert_eq!(menu.line().as_str(), "ILL");
    }

    #[test]
    fn test_fast_turns_clamp_brightness() {
        let mut config = DeviceConfig::default();
        config.brightness = 10;
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::Brightness, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        menu.navigate(NavAction::Inc, &config, 100);
        menu.navigate(NavAction::Inc, &config, 110);
        assert_eq!(menu.line().as_str(), "B:15");
        menu.navigate(NavAction::Dec, &config, 120);
        menu.navigate(NavAction::Dec, &config, 130);
        menu.navigate(NavAction::Dec, &config, 140);
        assert_eq!(menu.line().as_str(), "B:0");
    }

    #[test]
    fn test_rate_resets_when_edit_restarts() {
        let config = DeviceConfig::default();
        let mut menu = Menu::new();
        open_at(&mut menu, MenuItem::PrimaryEcu, &config);
        menu.navigate(NavAction::Sel, &config, 0);
        menu.navigate(NavAction::Inc, &config, 10);
        menu.navigate(NavAction::Esc, &config, 20);
        menu.navigate(NavAction::Sel, &config, 30);
        // Quick after the previous turn, but the first of this edit
        menu.navigate(NavAction::Inc, &config, 40);
        assert_eq!(menu.line().as_str(), "TPS");
    }
}
