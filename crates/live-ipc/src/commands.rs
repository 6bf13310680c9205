//! Commands sent from the host to the live engine.

use serde::{Deserialize, Serialize};

use crate::config::{AudioConfiguration, Orientation, VideoConfiguration};

/// Commands that a host can send to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LiveCommand {
    /// Start publishing with the given stream key or full RTMP URL.
    Start {
        stream_key: String,
        orientation: Orientation,
    },

    /// Stop the current session.
    Stop,

    /// Pause or resume local capture without tearing the session down.
    SetRunning(bool),

    /// Replace the audio configuration used by the next session.
    SetAudioConfiguration(AudioConfiguration),

    /// Replace the video configuration used by the next session.
    SetVideoConfiguration(VideoConfiguration),

    /// Request the current state and reachability.
    GetState,

    /// Stop any session and shut the engine down.
    Shutdown,
}
