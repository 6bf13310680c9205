//! Encoder parameters in the form the transport accepts.

use live_ipc::Orientation;

use crate::native::{AudioBitRate, AudioSampleRate, VideoQuality};

/// Audio encoder parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportAudioConfig {
    /// Number of channels.
    pub channels: u32,

    /// Bit rate preset.
    pub bit_rate: AudioBitRate,

    /// Sample rate preset.
    pub sample_rate: AudioSampleRate,
}

impl Default for TransportAudioConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            bit_rate: AudioBitRate::Default,
            sample_rate: AudioSampleRate::Default,
        }
    }
}

/// Video encoder parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportVideoConfig {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    pub frame_rate: u32,
    pub max_frame_rate: u32,
    pub min_frame_rate: u32,

    /// Bit rates in bits per second.
    pub bit_rate: u32,
    pub max_bit_rate: u32,
    pub min_bit_rate: u32,

    /// Maximum number of frames between key frames.
    pub max_keyframe_interval: u32,

    /// Orientation the output is rendered for.
    pub orientation: Orientation,

    /// Preset these values were derived from.
    pub quality: VideoQuality,
}

impl TransportVideoConfig {
    /// Default configuration for a quality preset.
    ///
    /// Frame size is swapped for landscape orientations. Rate bounds and the
    /// key frame interval follow from the preset frame rate and bit rate.
    pub fn for_quality(quality: VideoQuality, orientation: Orientation) -> Self {
        let (width, height, frame_rate, bit_rate) = quality.parameters();
        let (width, height) = if orientation.is_landscape() {
            (height, width)
        } else {
            (width, height)
        };

        Self {
            width,
            height,
            frame_rate,
            max_frame_rate: frame_rate,
            min_frame_rate: (frame_rate / 2).max(1),
            bit_rate,
            max_bit_rate: bit_rate / 5 * 6,
            min_bit_rate: bit_rate / 2,
            max_keyframe_interval: frame_rate * 2,
            orientation,
            quality,
        }
    }
}

impl Default for TransportVideoConfig {
    fn default() -> Self {
        Self::for_quality(VideoQuality::default(), Orientation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium3_portrait() {
        let config = TransportVideoConfig::for_quality(VideoQuality::Medium3, Orientation::Portrait);
        assert_eq!((config.width, config.height), (540, 960));
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.min_frame_rate, 15);
        assert_eq!(config.bit_rate, 1_000_000);
        assert_eq!(config.max_bit_rate, 1_200_000);
        assert_eq!(config.min_bit_rate, 500_000);
        assert_eq!(config.max_keyframe_interval, 60);
    }

    #[test]
    fn test_landscape_swaps_size() {
        let config =
            TransportVideoConfig::for_quality(VideoQuality::High3, Orientation::LandscapeRight);
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.orientation, Orientation::LandscapeRight);
    }

    #[test]
    fn test_audio_default() {
        let config = TransportAudioConfig::default();
        assert_eq!(config.channels, 2);
        assert_eq!(config.bit_rate, AudioBitRate::Default);
    }
}
