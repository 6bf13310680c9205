//! Events sent from the live engine to the host.

use serde::{Deserialize, Serialize};

use crate::state::{LiveError, LiveState};

/// Events that the engine can send to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiveEvent {
    /// Engine is ready to accept commands.
    Ready,

    /// Session state changed.
    StateChanged(LiveState),

    /// Session reported an error.
    Error(LiveError),

    /// Reply to `GetState`.
    Status {
        state: LiveState,
        network_reachable: bool,
        is_running: bool,
    },

    /// A command could not be carried out locally.
    CommandFailed { message: String },

    /// Engine has shut down.
    Shutdown,
}
