//! Lock-guarded display mode and message slot

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};

use g86_protocol::telemetry;
use g86_protocol::Message;

use super::DisplayMode;

/// Bounded wait for either lock
pub const LOCK_TIMEOUT_MS: u64 = 100;

/// Message slot size including the terminator
pub const MESSAGE_BUFFER_SIZE: usize = telemetry::MESSAGE_BUFFER_SIZE;

#[derive(Debug)]
struct PendingMessage {
    text: Message,
    available: bool,
}

/// Display mode and pending message shared across cores
///
/// Every accessor waits at most [`LOCK_TIMEOUT_MS`] for its lock. On
/// timeout the operation is abandoned, a warning is logged and the stored
/// value is left untouched; callers get `false` / `None` and carry on with
/// whatever they had. No accessor holds more than one lock.
pub struct SharedState<M: RawMutex> {
    pub(crate) mode: Mutex<M, DisplayMode>,
    message: Mutex<M, PendingMessage>,
}

impl<M: RawMutex> Default for SharedState<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> SharedState<M> {
    /// Starts in [`DisplayMode::Welcome`] with no message pending
    pub const fn new() -> Self {
        Self {
            mode: Mutex::new(DisplayMode::Welcome),
            message: Mutex::new(PendingMessage {
                text: Message::new(),
                available: false,
            }),
        }
    }

    async fn lock_mode(&self) -> Option<MutexGuard<'_, M, DisplayMode>> {
        match with_timeout(Duration::from_millis(LOCK_TIMEOUT_MS), self.mode.lock()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                log_warn!("Mode lock timeout");
                None
            }
        }
    }

    async fn lock_message(&self) -> Option<MutexGuard<'_, M, PendingMessage>> {
        match with_timeout(Duration::from_millis(LOCK_TIMEOUT_MS), self.message.lock()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                log_warn!("Message lock timeout");
                None
            }
        }
    }

    /// Switch the display mode
    pub async fn set_mode(&self, mode: DisplayMode) -> bool {
        match self.lock_mode().await {
            Some(mut guard) => {
                if *guard != mode {
                    log_debug!("Display mode {} -> {}", guard.as_str(), mode.as_str());
                }
                *guard = mode;
                true
            }
            None => false,
        }
    }

    /// Current display mode, `None` on lock timeout
    pub async fn mode(&self) -> Option<DisplayMode> {
        self.lock_mode().await.map(|guard| *guard)
    }

    /// Compare against the current mode under the lock
    ///
    /// A lock timeout compares unequal.
    pub async fn mode_equals(&self, candidate: DisplayMode) -> bool {
        self.lock_mode()
            .await
            .map(|guard| *guard == candidate)
            .unwrap_or(false)
    }

    /// Stage a message for the renderer and mark it available
    ///
    /// Text longer than the slot is cut on a char boundary.
    pub async fn set_message(&self, text: &str) -> bool {
        let (bounded, truncated) = telemetry::bounded(text);
        if truncated {
            log_warn!(
                "Message truncated from {} to {} bytes",
                text.len(),
                bounded.len()
            );
        }

        match self.lock_message().await {
            Some(mut guard) => {
                guard.text = bounded;
                guard.available = true;
                true
            }
            None => false,
        }
    }

    /// Copy of the pending message, if one is available
    pub async fn message(&self) -> Option<Message> {
        let guard = self.lock_message().await?;
        guard.available.then(|| guard.text.clone())
    }

    /// Whether a message is waiting; `false` on lock timeout
    pub async fn is_available(&self) -> bool {
        self.lock_message()
            .await
            .map(|guard| guard.available)
            .unwrap_or(false)
    }

    /// Mark the pending message consumed
    pub async fn clear_available(&self) -> bool {
        match self.lock_message().await {
            Some(mut guard) => {
                guard.available = false;
                true
            }
            None => false,
        }
    }

    /// Read and consume the pending message under one lock
    pub async fn take_message(&self) -> Option<Message> {
        let mut guard = self.lock_message().await?;
        if !guard.available {
            return None;
        }
        guard.available = false;
        Some(guard.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type State = SharedState<CriticalSectionRawMutex>;

    #[test]
    fn test_initial_state() {
        let state = State::new();
        assert_eq!(block_on(state.mode()), Some(DisplayMode::Welcome));
        assert!(!block_on(state.is_available()));
        assert_eq!(block_on(state.message()), None);
    }

    #[test]
    fn test_mode_roundtrip() {
        let state = State::new();
        for mode in [
            DisplayMode::Mqtt,
            DisplayMode::Timer1,
            DisplayMode::Timer2,
            DisplayMode::Welcome,
        ] {
            assert!(block_on(state.set_mode(mode)));
            assert_eq!(block_on(state.mode()), Some(mode));
            assert!(block_on(state.mode_equals(mode)));
        }
        assert!(!block_on(state.mode_equals(DisplayMode::Mqtt)));
    }

    #[test]
    fn test_message_roundtrip() {
        let state = State::new();
        assert!(block_on(state.set_message("45kmh")));
        assert!(block_on(state.is_available()));
        assert_eq!(block_on(state.message()).unwrap().as_str(), "45kmh");

        // Reading does not consume
        assert!(block_on(state.is_available()));
        assert!(block_on(state.clear_available()));
        assert!(!block_on(state.is_available()));
        assert_eq!(block_on(state.message()), None);
    }

    #[test]
    fn test_take_message_consumes() {
        let state = State::new();
        block_on(state.set_message("12.8V"));
        assert_eq!(block_on(state.take_message()).unwrap().as_str(), "12.8V");
        assert_eq!(block_on(state.take_message()), None);
    }

    #[test]
    fn test_message_truncated_to_capacity() {
        let state = State::new();
        let long = "x".repeat(MESSAGE_BUFFER_SIZE + 20);
        assert!(block_on(state.set_message(&long)));
        assert!(block_on(state.is_available()));
        let message = block_on(state.message()).unwrap();
        assert_eq!(message.len(), MESSAGE_BUFFER_SIZE - 1);
    }

    #[test]
    fn test_mode_lock_timeout_keeps_value() {
        let state = State::new();
        block_on(state.set_mode(DisplayMode::Timer1));

        let guard = block_on(state.mode.lock());
        assert!(!block_on(state.set_mode(DisplayMode::Mqtt)));
        assert_eq!(block_on(state.mode()), None);
        assert!(!block_on(state.mode_equals(DisplayMode::Timer1)));
        drop(guard);

        assert_eq!(block_on(state.mode()), Some(DisplayMode::Timer1));
    }

    #[test]
    fn test_message_lock_timeout_keeps_value() {
        let state = State::new();
        block_on(state.set_message("old"));

        let guard = block_on(state.message.lock());
        assert!(!block_on(state.set_message("new")));
        assert!(!block_on(state.clear_available()));
        drop(guard);

        assert_eq!(block_on(state.take_message()).unwrap().as_str(), "old");
    }
}
