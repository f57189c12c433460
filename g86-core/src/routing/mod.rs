//! Telemetry routing between the two panels
//!
//! Each panel follows one MQTT topic. A single broker session carries
//! both, so a topic shared by the two panels is subscribed once and only
//! dropped when neither panel follows it any more.

use embassy_sync::blocking_mutex::raw::RawMutex;
use g86_protocol::{Message, TelemetryFormatter, Topic};

use crate::config::DeviceConfig;
use crate::state::SharedState;

/// Which panel a subscription feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Panel {
    /// Dot-matrix
    Primary,
    /// 7-segment
    Secondary,
}

/// Broker requests needed after a panel changes topic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDiff {
    pub unsubscribe: Option<Topic>,
    pub subscribe: Option<Topic>,
}

impl SubscriptionDiff {
    pub fn is_empty(&self) -> bool {
        self.unsubscribe.is_none() && self.subscribe.is_none()
    }
}

/// Topic feeding each panel
///
/// An empty topic means the panel follows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    primary: Topic,
    secondary: Topic,
}

impl Subscriptions {
    pub fn new(primary: Topic, secondary: Topic) -> Self {
        Self { primary, secondary }
    }

    pub fn from_config(config: &DeviceConfig, base: &str) -> Self {
        Self {
            primary: config.primary_topic.topic(base).unwrap_or_default(),
            secondary: config.secondary_topic.topic(base).unwrap_or_default(),
        }
    }

    pub fn topic(&self, panel: Panel) -> &Topic {
        match panel {
            Panel::Primary => &self.primary,
            Panel::Secondary => &self.secondary,
        }
    }

    fn slot(&mut self, panel: Panel) -> &mut Topic {
        match panel {
            Panel::Primary => &mut self.primary,
            Panel::Secondary => &mut self.secondary,
        }
    }

    fn other(&self, panel: Panel) -> &Topic {
        match panel {
            Panel::Primary => &self.secondary,
            Panel::Secondary => &self.primary,
        }
    }

    /// Whether `panel` follows `topic`
    pub fn feeds(&self, panel: Panel, topic: &str) -> bool {
        let own = self.topic(panel);
        !own.is_empty() && own.as_str() == topic
    }

    /// Distinct non-empty topics, one SUBSCRIBE each
    pub fn distinct(&self) -> impl Iterator<Item = &Topic> {
        let secondary = (self.secondary != self.primary).then_some(&self.secondary);
        core::iter::once(&self.primary)
            .chain(secondary)
            .filter(|topic| !topic.is_empty())
    }

    /// Point `panel` at `topic` and work out what the broker must be told
    ///
    /// The old topic is only unsubscribed when the other panel does not
    /// follow it, and the new one is only subscribed when the other panel
    /// is not already subscribed to it.
    pub fn change(&mut self, panel: Panel, topic: Topic) -> SubscriptionDiff {
        let other = self.other(panel).clone();
        let old = core::mem::replace(self.slot(panel), topic);
        let new = self.topic(panel);

        if old == *new {
            return SubscriptionDiff::default();
        }
        SubscriptionDiff {
            unsubscribe: (old != other && !old.is_empty()).then_some(old),
            subscribe: (*new != other && !new.is_empty()).then(|| new.clone()),
        }
    }
}

/// Formats inbound telemetry and hands it to the panels
///
/// The secondary panel's copy is staged in [`SharedState`] for the
/// renderer on the other core. The primary panel's copy is returned to
/// the caller, which owns the dot-matrix path.
pub struct TelemetryRouter {
    formatter: TelemetryFormatter,
    subscriptions: Subscriptions,
}

impl TelemetryRouter {
    pub fn new(subscriptions: Subscriptions) -> Self {
        Self {
            formatter: TelemetryFormatter::new(),
            subscriptions,
        }
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Forwarded to [`Subscriptions::change`]
    pub fn change(&mut self, panel: Panel, topic: Topic) -> SubscriptionDiff {
        self.subscriptions.change(panel, topic)
    }

    /// Route one inbound publication
    ///
    /// Formats at most once, even when both panels follow the topic.
    /// Returns the primary panel's message, if it follows the topic.
    pub async fn route<M: RawMutex>(
        &mut self,
        topic: &str,
        payload: &str,
        now_ms: u32,
        shared: &SharedState<M>,
    ) -> Option<Message> {
        let primary = self.subscriptions.feeds(Panel::Primary, topic);
        let secondary = self.subscriptions.feeds(Panel::Secondary, topic);
        if !primary && !secondary {
            log_debug!("Ignoring message on {}", topic);
            return None;
        }

        let message = self.formatter.format(topic, payload, now_ms);
        log_trace!("{} -> {}", topic, message.as_str());

        if secondary && !shared.set_message(&message).await {
            log_warn!("Secondary message dropped, slot busy");
        }
        primary.then_some(message)
    }
}
