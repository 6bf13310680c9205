//! Transport session contract and an RTMP-backed implementation.
//!
//! The live controller treats the capture, encode and publish engine as a
//! black box behind [`TransportSession`]. This crate defines that contract,
//! the transport's native codes and presets, and [`RtmpSession`], which
//! publishes encoded packets with `rml_rtmp`.

mod config;
mod connection;
mod error;
mod native;
mod rtmp;
mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{TransportAudioConfig, TransportVideoConfig};
pub use connection::ReconnectPolicy;
pub use error::TransportError;
pub use native::{
    AudioBitRate, AudioSampleRate, CameraPosition, SocketErrorCode, TransportState, VideoQuality,
};
pub use rtmp::{RtmpPacket, RtmpSession, RtmpTransportFactory, StreamTarget};
pub use session::{DebugInfo, PreviewSurface, TransportDelegate, TransportFactory, TransportSession};

/// Channel capacity for outgoing packets.
pub const PACKET_CHANNEL_CAPACITY: usize = 30;

/// Channel capacity for queued delegate notifications.
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Maximum reconnection attempts.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Base reconnect delay in milliseconds.
pub const BASE_RECONNECT_DELAY_MS: u64 = 1000;

/// Port used when a stream URL does not name one.
pub const DEFAULT_RTMP_PORT: u16 = 1935;
