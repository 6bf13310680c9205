//! Connection state tracking, reconnect policy and delegate dispatch.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::native::{SocketErrorCode, TransportState};
use crate::session::{DebugInfo, TransportDelegate};
use crate::{BASE_RECONNECT_DELAY_MS, MAX_RECONNECT_ATTEMPTS, NOTIFICATION_CHANNEL_CAPACITY};

/// Reconnection policy configuration.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Maximum number of reconnection attempts.
    pub max_attempts: u32,

    /// Base delay between attempts (exponential backoff applied).
    pub base_delay: Duration,

    /// Maximum delay between attempts.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_RECONNECT_DELAY_MS),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    /// Check if more attempts are allowed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Shared slot holding the bound delegate.
#[derive(Clone, Default)]
pub(crate) struct DelegateSlot(Arc<RwLock<Option<Arc<dyn TransportDelegate>>>>);

impl DelegateSlot {
    pub(crate) fn set(&self, delegate: Option<Arc<dyn TransportDelegate>>) {
        *self.0.write() = delegate;
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn TransportDelegate>> {
        self.0.read().clone()
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.0.read().is_some()
    }
}

/// A notification waiting to be delivered.
#[derive(Debug, Clone)]
pub(crate) enum Notification {
    Debug(DebugInfo),
    State(TransportState),
    Error(SocketErrorCode),
}

/// Records the native state and forwards notifications to the delegate on a
/// dedicated thread, so delegates never run on the network runtime.
#[derive(Clone)]
pub(crate) struct Notifier {
    state: Arc<RwLock<TransportState>>,
    tx: Sender<Notification>,
}

impl Notifier {
    /// Spawn the dispatch thread. It exits once every `Notifier` clone is
    /// dropped and the queue is drained.
    pub(crate) fn spawn(
        state: Arc<RwLock<TransportState>>,
        delegate: DelegateSlot,
    ) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(NOTIFICATION_CHANNEL_CAPACITY);

        thread::Builder::new()
            .name("transport-notify".into())
            .spawn(move || dispatch_loop(rx, delegate))?;

        Ok(Self { state, tx })
    }

    pub(crate) fn state(&self, state: TransportState) {
        {
            let mut current = self.state.write();
            if *current == state {
                return;
            }
            *current = state;
        }
        self.send(Notification::State(state));
    }

    pub(crate) fn error(&self, code: SocketErrorCode) {
        self.send(Notification::Error(code));
    }

    pub(crate) fn debug(&self, info: DebugInfo) {
        // Diagnostics are best effort.
        if self.tx.try_send(Notification::Debug(info)).is_err() {
            trace!("Notification queue full, dropping debug info");
        }
    }

    fn send(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            warn!("Failed to queue notification: {}", e);
        }
    }
}

fn dispatch_loop(rx: Receiver<Notification>, delegate: DelegateSlot) {
    debug!("Notification dispatcher starting");

    for notification in rx {
        // Re-read the slot per notification so a detached delegate stops
        // receiving immediately.
        let Some(delegate) = delegate.get() else {
            trace!(?notification, "No delegate bound, dropping notification");
            continue;
        };

        match notification {
            Notification::Debug(info) => delegate.on_debug(&info),
            Notification::State(state) => delegate.on_state_changed(state.code()),
            Notification::Error(code) => delegate.on_error(code.code()),
        }
    }

    debug!("Notification dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_reconnect_policy_delays() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(10));
    }

    #[test]
    fn test_reconnect_policy_should_retry() {
        let policy = ReconnectPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<i64>>,
        errors: Mutex<Vec<i64>>,
    }

    impl TransportDelegate for Recorder {
        fn on_debug(&self, _info: &DebugInfo) {}

        fn on_state_changed(&self, state_code: i64) {
            self.states.lock().push(state_code);
        }

        fn on_error(&self, error_code: i64) {
            self.errors.lock().push(error_code);
        }
    }

    #[test]
    fn test_notifier_delivers_in_order_and_skips_repeats() {
        let recorder = Arc::new(Recorder::default());
        let slot = DelegateSlot::default();
        slot.set(Some(recorder.clone()));

        let state = Arc::new(RwLock::new(TransportState::Ready));
        let notifier = Notifier::spawn(Arc::clone(&state), slot).unwrap();
        notifier.state(TransportState::Pending);
        notifier.state(TransportState::Pending);
        notifier.error(SocketErrorCode::ConnectSocket);
        notifier.state(TransportState::Error);
        drop(notifier);

        for _ in 0..200 {
            if recorder.states.lock().len() == 2 && recorder.errors.lock().len() == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(*recorder.states.lock(), vec![1, 4]);
        assert_eq!(*recorder.errors.lock(), vec![203]);
        assert_eq!(*state.read(), TransportState::Error);
    }
}
