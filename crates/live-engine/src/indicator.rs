//! Observer contract and the status indicator it drives.

use parking_lot::RwLock;
use tracing::{debug, warn};

use live_ipc::{LiveError, LiveState};

/// Receives state and error notifications from a [`Live`](crate::Live)
/// controller.
///
/// Called from the transport's notification thread, never while the
/// controller's lock is held.
pub trait LiveObserver: Send + Sync {
    fn on_state_changed(&self, state: LiveState);

    fn on_error(&self, error: LiveError) {
        warn!(code = error.code(), "Live session error: {}", error);
    }
}

/// Indicator tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    /// Normal progress colour.
    Active,
    /// Failure colour.
    Warning,
}

impl Tint {
    pub fn hex(self) -> &'static str {
        match self {
            Self::Active => "#fb3064",
            Self::Warning => "#f7df48",
        }
    }
}

/// How the status indicator renders a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorStyle {
    /// Ring fill, 0.0 to 1.0.
    pub progress: f32,
    /// Whether the ring spins.
    pub indeterminate: bool,
    pub tint: Tint,
}

impl IndicatorStyle {
    pub fn for_state(state: LiveState) -> Self {
        match state {
            LiveState::Ready | LiveState::Stopped => Self {
                progress: 0.0,
                indeterminate: false,
                tint: Tint::Active,
            },
            LiveState::Pending | LiveState::Retrying => Self {
                progress: 0.3,
                indeterminate: true,
                tint: Tint::Active,
            },
            LiveState::Started => Self {
                progress: 1.0,
                indeterminate: false,
                tint: Tint::Active,
            },
            LiveState::Failed => Self {
                progress: 1.0,
                indeterminate: false,
                tint: Tint::Warning,
            },
        }
    }
}

/// Observer that keeps the indicator style for the latest state.
#[derive(Debug)]
pub struct StatusIndicator {
    current: RwLock<(LiveState, IndicatorStyle)>,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self {
            current: RwLock::new((LiveState::Ready, IndicatorStyle::for_state(LiveState::Ready))),
        }
    }

    pub fn state(&self) -> LiveState {
        self.current.read().0
    }

    pub fn style(&self) -> IndicatorStyle {
        self.current.read().1
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveObserver for StatusIndicator {
    fn on_state_changed(&self, state: LiveState) {
        let style = IndicatorStyle::for_state(state);
        debug!(%state, progress = style.progress, tint = style.tint.hex(), "Indicator updated");
        *self.current.write() = (state, style);
    }
}
