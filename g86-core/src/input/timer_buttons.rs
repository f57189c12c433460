//! Timer buttons and toggle switches
//!
//! Two momentary buttons (start/pause, reset) act on the active timer.
//! Two toggle positions choose the active timer. Switching the active
//! timer only takes over the secondary display when it is already showing
//! a timer; welcome and telemetry views are left alone.

use embassy_sync::blocking_mutex::raw::RawMutex;

use g86_protocol::{Publication, TimerStatus};

use super::SwitchEvent;
use crate::state::SharedState;
use crate::timer::{StartOutcome, TimeParts, TimerBank, TimerId};
use crate::traits::{PublishOutbox, TickRegistry};

/// Which physical input produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerInput {
    StartPause,
    Reset,
    /// Toggle in the timer 1 position
    SelectOne,
    /// Toggle in the timer 2 position
    SelectTwo,
}

/// Routes timer input events to the chronometers
///
/// Owned by the polling task; the active timer is never shared.
#[derive(Debug, Clone, Default)]
pub struct TimerInputController {
    active: TimerId,
}

impl TimerInputController {
    pub const fn new() -> Self {
        Self {
            active: TimerId::One,
        }
    }

    /// Timer the start/pause and reset buttons act on
    pub fn active(&self) -> TimerId {
        self.active
    }

    /// Handle one switch event
    ///
    /// Buttons react to [`SwitchEvent::Press`], toggles to
    /// [`SwitchEvent::Down`]; everything else is ignored.
    pub async fn handle<M: RawMutex>(
        &mut self,
        input: TimerInput,
        event: SwitchEvent,
        timers: &TimerBank<M>,
        shared: &SharedState<M>,
        outbox: &mut impl PublishOutbox,
        ticks: &mut impl TickRegistry,
    ) {
        match (input, event) {
            (TimerInput::StartPause, SwitchEvent::Press) => {
                self.start_or_pause(timers, shared, outbox, ticks).await
            }
            (TimerInput::Reset, SwitchEvent::Press) => self.reset(timers, outbox, ticks),
            (TimerInput::SelectOne, SwitchEvent::Down) => self.select(TimerId::One, shared).await,
            (TimerInput::SelectTwo, SwitchEvent::Down) => self.select(TimerId::Two, shared).await,
            _ => {}
        }
    }

    async fn start_or_pause<M: RawMutex>(
        &mut self,
        timers: &TimerBank<M>,
        shared: &SharedState<M>,
        outbox: &mut impl PublishOutbox,
        ticks: &mut impl TickRegistry,
    ) {
        let id = self.active;
        let chrono = timers.get(id);
        let group = id.group();

        if let Some(held_ms) = chrono.pause() {
            ticks.deregister(id);
            log_info!("{:?} paused at {} ms", id, held_ms);
            outbox.publish(Publication::new(group, TimerStatus::Paused(true)));
            outbox.publish(Publication::new(group, TimerStatus::Started(false)));
            let value = TimeParts::from_millis(held_ms).wire_text();
            outbox.publish(Publication::new(group, TimerStatus::Value(value)));
            return;
        }

        let outcome = chrono.start();
        if outcome == StartOutcome::AlreadyRunning {
            return;
        }

        ticks.register(id);
        log_info!("{:?} {:?}", id, outcome);
        // Best effort: on a lock timeout the renderer keeps its mode
        shared.set_mode(id.display_mode()).await;
        outbox.publish(Publication::new(group, TimerStatus::Started(true)));
        if outcome == StartOutcome::Resumed {
            outbox.publish(Publication::new(group, TimerStatus::Paused(false)));
        }
    }

    fn reset<M: RawMutex>(
        &mut self,
        timers: &TimerBank<M>,
        outbox: &mut impl PublishOutbox,
        ticks: &mut impl TickRegistry,
    ) {
        let id = self.active;
        ticks.deregister(id);
        timers.get(id).reset();
        log_info!("{:?} reset", id);

        let group = id.group();
        outbox.publish(Publication::new(group, TimerStatus::zero()));
        outbox.publish(Publication::new(group, TimerStatus::Started(false)));
        outbox.publish(Publication::new(group, TimerStatus::Paused(false)));
    }

    async fn select<M: RawMutex>(&mut self, id: TimerId, shared: &SharedState<M>) {
        self.active = id;
        log_debug!("Active timer {:?}", id);

        let Some(mode) = shared.mode().await else {
            return;
        };
        if mode.is_timer() && mode != id.display_mode() {
            shared.set_mode(id.display_mode()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DisplayMode;
    use crate::timer::Phase;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use g86_protocol::Group;

    type Bank = TimerBank<CriticalSectionRawMutex>;
    type State = SharedState<CriticalSectionRawMutex>;

    #[derive(Default)]
    struct RecordingOutbox {
        sent: Vec<Publication>,
    }

    impl PublishOutbox for RecordingOutbox {
        fn publish(&mut self, publication: Publication) {
            self.sent.push(publication);
        }
    }

    impl RecordingOutbox {
        fn pairs(&self) -> Vec<(Group, &'static str, String)> {
            self.sent
                .iter()
                .map(|p| (p.group, p.status.suffix(), p.payload().to_string()))
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingTicks {
        running: [bool; 2],
    }

    impl TickRegistry for RecordingTicks {
        fn register(&mut self, timer: TimerId) {
            self.running[timer.index()] = true;
        }

        fn deregister(&mut self, timer: TimerId) {
            self.running[timer.index()] = false;
        }
    }

    struct Rig {
        controller: TimerInputController,
        timers: Bank,
        shared: State,
        outbox: RecordingOutbox,
        ticks: RecordingTicks,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                controller: TimerInputController::new(),
                timers: Bank::new(),
                shared: State::new(),
                outbox: RecordingOutbox::default(),
                ticks: RecordingTicks::default(),
            }
        }

        fn send(&mut self, input: TimerInput, event: SwitchEvent) {
            block_on(self.controller.handle(
                input,
                event,
                &self.timers,
                &self.shared,
                &mut self.outbox,
                &mut self.ticks,
            ));
        }

        fn press(&mut self, input: TimerInput) {
            self.send(input, SwitchEvent::Press);
        }

        fn mode(&self) -> DisplayMode {
            block_on(self.shared.mode()).unwrap()
        }
    }

    #[test]
    fn test_start_from_idle() {
        let mut rig = Rig::new();
        rig.press(TimerInput::StartPause);

        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Running);
        assert!(rig.ticks.running[0]);
        assert_eq!(rig.mode(), DisplayMode::Timer1);
        assert_eq!(
            rig.outbox.pairs(),
            vec![(Group::Tm1, "started", "true".to_string())]
        );

        // Tick source drives the value in 10 ms steps
        rig.timers.tick(TimerId::One, &mut rig.outbox);
        rig.timers.tick(TimerId::One, &mut rig.outbox);
        assert_eq!(rig.timers.get(TimerId::One).elapsed_ms(), 20);
    }

    #[test]
    fn test_pause_publishes_final_value() {
        let mut rig = Rig::new();
        rig.press(TimerInput::StartPause);
        for _ in 0..7 {
            rig.timers.tick(TimerId::One, &mut rig.outbox);
        }
        rig.outbox.sent.clear();

        rig.press(TimerInput::StartPause);
        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Paused);
        assert!(!rig.ticks.running[0]);
        assert_eq!(
            rig.outbox.pairs(),
            vec![
                (Group::Tm1, "paused", "true".to_string()),
                (Group::Tm1, "started", "false".to_string()),
                (Group::Tm1, "value", "00-00-00:070".to_string()),
            ]
        );
    }

    #[test]
    fn test_resume_keeps_value() {
        let mut rig = Rig::new();
        rig.press(TimerInput::StartPause);
        rig.timers.tick(TimerId::One, &mut rig.outbox);
        rig.press(TimerInput::StartPause);
        rig.outbox.sent.clear();

        rig.press(TimerInput::StartPause);
        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Running);
        assert_eq!(rig.timers.get(TimerId::One).elapsed_ms(), 10);
        assert_eq!(
            rig.outbox.pairs(),
            vec![
                (Group::Tm1, "started", "true".to_string()),
                (Group::Tm1, "paused", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_reset_from_running() {
        let mut rig = Rig::new();
        rig.press(TimerInput::StartPause);
        rig.timers.tick(TimerId::One, &mut rig.outbox);
        rig.outbox.sent.clear();

        rig.press(TimerInput::Reset);
        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Idle);
        assert_eq!(rig.timers.get(TimerId::One).elapsed_ms(), 0);
        assert!(!rig.ticks.running[0]);
        assert_eq!(
            rig.outbox.pairs(),
            vec![
                (Group::Tm1, "value", "00-00-00:000".to_string()),
                (Group::Tm1, "started", "false".to_string()),
                (Group::Tm1, "paused", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_keeps_welcome_and_mqtt() {
        let mut rig = Rig::new();
        rig.send(TimerInput::SelectTwo, SwitchEvent::Down);
        assert_eq!(rig.controller.active(), TimerId::Two);
        assert_eq!(rig.mode(), DisplayMode::Welcome);

        block_on(rig.shared.set_mode(DisplayMode::Mqtt));
        rig.send(TimerInput::SelectOne, SwitchEvent::Down);
        assert_eq!(rig.controller.active(), TimerId::One);
        assert_eq!(rig.mode(), DisplayMode::Mqtt);
    }

    #[test]
    fn test_select_switches_between_timers() {
        let mut rig = Rig::new();
        rig.press(TimerInput::StartPause);
        assert_eq!(rig.mode(), DisplayMode::Timer1);

        rig.send(TimerInput::SelectTwo, SwitchEvent::Down);
        assert_eq!(rig.mode(), DisplayMode::Timer2);

        // Timer 1 keeps running in the background
        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Running);
    }

    #[test]
    fn test_buttons_follow_active_timer() {
        let mut rig = Rig::new();
        rig.send(TimerInput::SelectTwo, SwitchEvent::Down);
        rig.press(TimerInput::StartPause);

        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Idle);
        assert_eq!(rig.timers.get(TimerId::Two).phase(), Phase::Running);
        assert!(rig.ticks.running[1]);
        assert_eq!(rig.mode(), DisplayMode::Timer2);
        assert_eq!(rig.outbox.sent[0].group, Group::Tm2);
    }

    #[test]
    fn test_irrelevant_events_ignored() {
        let mut rig = Rig::new();
        rig.send(TimerInput::StartPause, SwitchEvent::Down);
        rig.send(TimerInput::StartPause, SwitchEvent::LongPress);
        rig.send(TimerInput::SelectTwo, SwitchEvent::Press);

        assert_eq!(rig.controller.active(), TimerId::One);
        assert_eq!(rig.timers.get(TimerId::One).phase(), Phase::Idle);
        assert!(rig.outbox.sent.is_empty());
    }
}
