//! Typed state, error, configuration and command messages for the live
//! session controller.
//!
//! The state and error vocabularies here are the stable contract consumers
//! see; transport-native codes are translated into them at the engine
//! boundary.

mod commands;
mod config;
mod events;
mod state;

pub use commands::LiveCommand;
pub use config::{AudioConfiguration, ConfigError, Dimensions, Orientation, VideoConfiguration};
pub use events::LiveEvent;
pub use state::{LiveError, LiveState, ReachabilityStatus};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for commands (host → engine).
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Channel capacity for events (engine → host).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded command channel.
pub fn command_channel() -> (Sender<LiveCommand>, Receiver<LiveCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<LiveEvent>, Receiver<LiveEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
