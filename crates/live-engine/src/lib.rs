//! Live session controller.
//!
//! [`Live`] owns at most one transport session, translates its native
//! state and error codes into [`LiveState`] and [`LiveError`], and
//! republishes them to a weakly held [`LiveObserver`]. [`Engine`] drives a
//! controller from the command and event channels in `live-ipc`.

mod error;
mod indicator;
mod live;
mod mapping;
mod orchestrator;
mod reachability;

pub use error::LiveControlError;
pub use indicator::{IndicatorStyle, LiveObserver, StatusIndicator, Tint};
pub use live::{Live, LiveOptions};
pub use mapping::{
    audio_bit_rate_preset, audio_sample_rate_preset, build_stream_url, live_error_from_code,
    live_state_from_code, transport_audio_config, transport_video_config, BASE_VIDEO_QUALITY,
    MUX_API_PRODUCTION_HOSTNAME, MUX_RTMP_PRODUCTION_URL,
};
pub use orchestrator::Engine;
pub use reachability::{ReachabilityMonitor, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_PORT};

pub use live_ipc::{LiveError, LiveState};

/// Result type for controller commands.
pub type LiveResult<T> = Result<T, LiveControlError>;
