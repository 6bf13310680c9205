//! Translation between the controller's vocabulary and the transport's.
//!
//! Configuration values are quantized down to the presets the transport
//! accepts, and native state/error codes are mapped into [`LiveState`] and
//! [`LiveError`] with safe defaults for codes outside the tables.

use live_ipc::{AudioConfiguration, LiveError, LiveState, Orientation, VideoConfiguration};
use live_transport::{
    AudioBitRate, AudioSampleRate, SocketErrorCode, TransportAudioConfig, TransportVideoConfig,
    VideoQuality,
};

/// Hostname of the ingest provisioning API, also used for reachability.
pub const MUX_API_PRODUCTION_HOSTNAME: &str = "api.mux.com";

/// Base URL a bare stream key is appended to.
pub const MUX_RTMP_PRODUCTION_URL: &str = "rtmp://global-live.mux.com:5222/app/";

/// Marker identifying a stream key that is already a full URL.
const RTMP_SCHEME: &str = "rtmp://";

/// Video preset the transport configuration starts from.
pub const BASE_VIDEO_QUALITY: VideoQuality = VideoQuality::Medium3;

/// Quantize an audio bit rate (bps) to the first preset at or above it.
pub fn audio_bit_rate_preset(bit_rate: u32) -> AudioBitRate {
    if bit_rate <= 32_000 {
        AudioBitRate::Kbps32
    } else if bit_rate <= 64_000 {
        AudioBitRate::Kbps64
    } else if bit_rate <= 96_000 {
        AudioBitRate::Kbps96
    } else if bit_rate <= 128_000 {
        AudioBitRate::Kbps128
    } else {
        AudioBitRate::Default
    }
}

/// Quantize an audio sample rate (Hz) to the first preset at or above it.
pub fn audio_sample_rate_preset(sample_rate: f64) -> AudioSampleRate {
    if sample_rate <= 16_000.0 {
        AudioSampleRate::Hz16000
    } else if sample_rate <= 44_100.0 {
        AudioSampleRate::Hz44100
    } else if sample_rate <= 48_000.0 {
        AudioSampleRate::Hz48000
    } else {
        AudioSampleRate::Default
    }
}

/// Full URL to publish to for a stream key.
///
/// A key that already contains `rtmp://` is used verbatim, which lets
/// callers point at alternate ingest endpoints.
pub fn build_stream_url(stream_key: &str) -> String {
    if stream_key.contains(RTMP_SCHEME) {
        stream_key.to_string()
    } else {
        format!("{}{}", MUX_RTMP_PRODUCTION_URL, stream_key)
    }
}

/// Audio parameters for a new transport session.
pub fn transport_audio_config(config: &AudioConfiguration) -> TransportAudioConfig {
    let mut audio = TransportAudioConfig::default();
    if let Some(channels) = config.channels_count {
        audio.channels = channels;
    }
    audio.bit_rate = audio_bit_rate_preset(config.bit_rate);
    audio.sample_rate = audio_sample_rate_preset(config.sample_rate);
    audio
}

/// Video parameters for a new transport session.
pub fn transport_video_config(
    config: &VideoConfiguration,
    orientation: Orientation,
) -> TransportVideoConfig {
    let mut video = TransportVideoConfig::for_quality(BASE_VIDEO_QUALITY, orientation);
    if let Some(dimensions) = config.dimensions {
        video.width = dimensions.width;
        video.height = dimensions.height;
    }
    video.frame_rate = config.frame_rate;
    video.max_frame_rate = config.max_frame_rate;
    video.min_frame_rate = config.min_frame_rate;
    video.bit_rate = config.bit_rate;
    video.max_bit_rate = config.max_bit_rate;
    video.min_bit_rate = config.min_bit_rate;
    if let Some(interval) = config.max_key_frame_interval {
        video.max_keyframe_interval = interval;
    }
    video
}

/// Map a native state code by ordinal. Unknown codes map to `Ready`.
pub fn live_state_from_code(code: i64) -> LiveState {
    LiveState::from_ordinal(code).unwrap_or(LiveState::Ready)
}

/// Map a native error code. Unknown codes map to `Unknown`.
pub fn live_error_from_code(code: i64) -> LiveError {
    match SocketErrorCode::from_code(code) {
        Some(SocketErrorCode::GetStreamInfo) | Some(SocketErrorCode::ConnectSocket) => {
            LiveError::StreamingInfoFailure
        }
        Some(SocketErrorCode::Verification) => LiveError::VerificationFailure,
        Some(SocketErrorCode::ReconnectTimeout) => LiveError::Timeout,
        Some(SocketErrorCode::Preview) | None => LiveError::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_ipc::Dimensions;
    use live_transport::TransportState;
    use proptest::prelude::*;

    fn bit_rate_rank(preset: AudioBitRate) -> u8 {
        match preset {
            AudioBitRate::Kbps32 => 0,
            AudioBitRate::Kbps64 => 1,
            AudioBitRate::Kbps96 => 2,
            AudioBitRate::Kbps128 => 3,
            AudioBitRate::Default => 4,
        }
    }

    fn sample_rate_rank(preset: AudioSampleRate) -> u8 {
        match preset {
            AudioSampleRate::Hz16000 => 0,
            AudioSampleRate::Hz44100 => 1,
            AudioSampleRate::Hz48000 => 2,
            AudioSampleRate::Default => 3,
        }
    }

    #[test]
    fn test_audio_bit_rate_thresholds() {
        assert_eq!(audio_bit_rate_preset(0), AudioBitRate::Kbps32);
        assert_eq!(audio_bit_rate_preset(32_000), AudioBitRate::Kbps32);
        assert_eq!(audio_bit_rate_preset(32_001), AudioBitRate::Kbps64);
        assert_eq!(audio_bit_rate_preset(64_000), AudioBitRate::Kbps64);
        assert_eq!(audio_bit_rate_preset(96_000), AudioBitRate::Kbps96);
        assert_eq!(audio_bit_rate_preset(128_000), AudioBitRate::Kbps128);
        assert_eq!(audio_bit_rate_preset(128_001), AudioBitRate::Default);
        assert_eq!(audio_bit_rate_preset(999_999_999), AudioBitRate::Default);
    }

    #[test]
    fn test_audio_sample_rate_thresholds() {
        assert_eq!(audio_sample_rate_preset(8_000.0), AudioSampleRate::Hz16000);
        assert_eq!(audio_sample_rate_preset(16_000.0), AudioSampleRate::Hz16000);
        assert_eq!(audio_sample_rate_preset(22_050.0), AudioSampleRate::Hz44100);
        assert_eq!(audio_sample_rate_preset(44_100.0), AudioSampleRate::Hz44100);
        assert_eq!(audio_sample_rate_preset(48_000.0), AudioSampleRate::Hz48000);
        assert_eq!(audio_sample_rate_preset(48_001.0), AudioSampleRate::Default);
    }

    proptest! {
        #[test]
        fn prop_bit_rate_preset_is_monotonic(a in any::<u32>(), b in any::<u32>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(bit_rate_rank(audio_bit_rate_preset(lo)) <= bit_rate_rank(audio_bit_rate_preset(hi)));
            prop_assert_eq!(audio_bit_rate_preset(a), audio_bit_rate_preset(a));
        }

        #[test]
        fn prop_sample_rate_preset_is_monotonic(a in 0.0f64..200_000.0, b in 0.0f64..200_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(sample_rate_rank(audio_sample_rate_preset(lo)) <= sample_rate_rank(audio_sample_rate_preset(hi)));
        }

        #[test]
        fn prop_bit_rate_preset_never_exceeds_request(rate in 0u32..=128_000) {
            prop_assert!(audio_bit_rate_preset(rate).bits_per_second() >= rate);
        }
    }

    #[test]
    fn test_build_stream_url() {
        assert_eq!(
            build_stream_url("abc123"),
            "rtmp://global-live.mux.com:5222/app/abc123"
        );
        assert_eq!(
            build_stream_url("rtmp://custom.example/app/xyz"),
            "rtmp://custom.example/app/xyz"
        );
    }

    #[test]
    fn test_state_mapping() {
        for state in LiveState::ALL {
            assert_eq!(live_state_from_code(state.ordinal()), state);
        }
        assert_eq!(live_state_from_code(TransportState::Refresh.code()), LiveState::Retrying);
        assert_eq!(live_state_from_code(6), LiveState::Ready);
        assert_eq!(live_state_from_code(-1), LiveState::Ready);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            live_error_from_code(SocketErrorCode::GetStreamInfo.code()),
            LiveError::StreamingInfoFailure
        );
        assert_eq!(
            live_error_from_code(SocketErrorCode::ConnectSocket.code()),
            LiveError::StreamingInfoFailure
        );
        assert_eq!(
            live_error_from_code(SocketErrorCode::Verification.code()),
            LiveError::VerificationFailure
        );
        assert_eq!(
            live_error_from_code(SocketErrorCode::ReconnectTimeout.code()),
            LiveError::Timeout
        );
        assert_eq!(
            live_error_from_code(SocketErrorCode::Preview.code()),
            LiveError::Unknown
        );
        assert_eq!(live_error_from_code(0), LiveError::Unknown);
        assert_eq!(live_error_from_code(-7), LiveError::Unknown);
    }

    #[test]
    fn test_transport_audio_config() {
        let audio = transport_audio_config(&AudioConfiguration {
            bit_rate: 64_000,
            sample_rate: 48_000.0,
            channels_count: Some(1),
        });
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.bit_rate, AudioBitRate::Kbps64);
        assert_eq!(audio.sample_rate, AudioSampleRate::Hz48000);

        let audio = transport_audio_config(&AudioConfiguration::default());
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.bit_rate, AudioBitRate::Kbps96);
    }

    #[test]
    fn test_transport_video_config() {
        let video = transport_video_config(&VideoConfiguration::default(), Orientation::Portrait);
        assert_eq!((video.width, video.height), (540, 960));
        assert_eq!(video.frame_rate, 30);
        assert_eq!(video.min_frame_rate, 15);
        assert_eq!(video.bit_rate, 800_000);
        assert_eq!(video.max_bit_rate, 96_000);
        assert_eq!(video.min_bit_rate, 600_000);
        assert_eq!(video.max_keyframe_interval, 60);

        let config = VideoConfiguration {
            dimensions: Some(Dimensions::new(1280, 720)),
            max_key_frame_interval: Some(1),
            ..Default::default()
        };
        let video = transport_video_config(&config, Orientation::LandscapeLeft);
        assert_eq!((video.width, video.height), (1280, 720));
        assert_eq!(video.max_keyframe_interval, 1);
        assert_eq!(video.orientation, Orientation::LandscapeLeft);
    }
}
