//! Transport-native state codes, error codes and encoder presets.
//!
//! Sessions report state and errors as raw integer codes; these enums name
//! the values the transport itself emits. Consumers must still accept codes
//! outside these tables.

use serde::{Deserialize, Serialize};

/// Native session state, reported to delegates by ordinal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Ready,
    Pending,
    Start,
    Stop,
    Error,
    Refresh,
}

impl TransportState {
    /// Raw code delivered through `TransportDelegate::on_state_changed`.
    pub fn code(self) -> i64 {
        match self {
            Self::Ready => 0,
            Self::Pending => 1,
            Self::Start => 2,
            Self::Stop => 3,
            Self::Error => 4,
            Self::Refresh => 5,
        }
    }
}

/// Native socket error codes, reported through `TransportDelegate::on_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketErrorCode {
    /// Preview could not be set up.
    Preview,

    /// The stream URL could not be turned into connection parameters.
    GetStreamInfo,

    /// TCP connect or RTMP handshake failed.
    ConnectSocket,

    /// The server rejected the connect or publish request.
    Verification,

    /// Reconnecting gave up.
    ReconnectTimeout,
}

impl SocketErrorCode {
    pub fn code(self) -> i64 {
        match self {
            Self::Preview => 201,
            Self::GetStreamInfo => 202,
            Self::ConnectSocket => 203,
            Self::Verification => 204,
            Self::ReconnectTimeout => 205,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            201 => Some(Self::Preview),
            202 => Some(Self::GetStreamInfo),
            203 => Some(Self::ConnectSocket),
            204 => Some(Self::Verification),
            205 => Some(Self::ReconnectTimeout),
            _ => None,
        }
    }
}

/// Audio bit rate presets accepted by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioBitRate {
    Kbps32,
    Kbps64,
    Kbps96,
    Kbps128,
    #[default]
    Default,
}

impl AudioBitRate {
    /// Bits per second the encoder runs at for this preset.
    pub fn bits_per_second(self) -> u32 {
        match self {
            Self::Kbps32 => 32_000,
            Self::Kbps64 => 64_000,
            Self::Kbps96 | Self::Default => 96_000,
            Self::Kbps128 => 128_000,
        }
    }
}

/// Audio sample rate presets accepted by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioSampleRate {
    Hz16000,
    Hz44100,
    Hz48000,
    #[default]
    Default,
}

impl AudioSampleRate {
    pub fn hertz(self) -> u32 {
        match self {
            Self::Hz16000 => 16_000,
            Self::Hz44100 | Self::Default => 44_100,
            Self::Hz48000 => 48_000,
        }
    }
}

/// Video quality presets the transport derives its default video
/// configuration from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoQuality {
    Low1,
    Low2,
    Low3,
    Medium1,
    Medium2,
    #[default]
    Medium3,
    High1,
    High2,
    High3,
}

impl VideoQuality {
    /// Portrait frame size, frame rate and bit rate (bps) for this preset.
    pub(crate) fn parameters(self) -> (u32, u32, u32, u32) {
        match self {
            Self::Low1 => (360, 640, 15, 500_000),
            Self::Low2 => (360, 640, 24, 600_000),
            Self::Low3 => (360, 640, 30, 800_000),
            Self::Medium1 => (540, 960, 15, 800_000),
            Self::Medium2 => (540, 960, 24, 800_000),
            Self::Medium3 => (540, 960, 30, 1_000_000),
            Self::High1 => (720, 1280, 15, 1_000_000),
            Self::High2 => (720, 1280, 24, 1_200_000),
            Self::High3 => (720, 1280, 30, 1_200_000),
        }
    }
}

/// Which camera the capture pipeline uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraPosition {
    #[default]
    Front,
    Back,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_are_ordinals() {
        let states = [
            TransportState::Ready,
            TransportState::Pending,
            TransportState::Start,
            TransportState::Stop,
            TransportState::Error,
            TransportState::Refresh,
        ];
        for (i, state) in states.iter().enumerate() {
            assert_eq!(state.code(), i as i64);
        }
    }

    #[test]
    fn test_socket_error_codes() {
        assert_eq!(SocketErrorCode::GetStreamInfo.code(), 202);
        assert_eq!(SocketErrorCode::ReconnectTimeout.code(), 205);
        assert_eq!(
            SocketErrorCode::from_code(204),
            Some(SocketErrorCode::Verification)
        );
        assert_eq!(SocketErrorCode::from_code(42), None);
    }

    #[test]
    fn test_default_presets() {
        assert_eq!(AudioBitRate::Default.bits_per_second(), 96_000);
        assert_eq!(AudioSampleRate::Default.hertz(), 44_100);
        assert_eq!(VideoQuality::default(), VideoQuality::Medium3);
    }
}
