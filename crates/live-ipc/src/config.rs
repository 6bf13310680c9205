//! Audio and video configuration requested by the caller.
//!
//! These are read once when a session is created. Changing them while a
//! session is live has no effect until the next `start`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems found by [`AudioConfiguration::validate`] and
/// [`VideoConfiguration::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("sample rate must be a positive finite number, got {0}")]
    InvalidSampleRate(f64),

    #[error("min frame rate {min} exceeds max frame rate {max}")]
    FrameRateRange { min: u32, max: u32 },

    #[error("min bit rate {min} exceeds max bit rate {max}")]
    BitRateRange { min: u32, max: u32 },
}

/// Audio encoding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfiguration {
    /// Bit rate in bits per second.
    pub bit_rate: u32,

    /// Sample rate in hertz.
    pub sample_rate: f64,

    /// Number of channels; the transport default is used when unset.
    pub channels_count: Option<u32>,
}

impl Default for AudioConfiguration {
    fn default() -> Self {
        Self {
            bit_rate: 96_000,
            sample_rate: 44_100.0,
            channels_count: None,
        }
    }
}

impl AudioConfiguration {
    /// Check the configuration for values no encoder preset can honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_rate == 0 {
            return Err(ConfigError::Zero { field: "audio bit rate" });
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels_count == Some(0) {
            return Err(ConfigError::Zero { field: "channel count" });
        }
        Ok(())
    }
}

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Video encoding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfiguration {
    /// Frames per second.
    pub frame_rate: u32,

    /// Upper bound for adaptive frame rate.
    pub max_frame_rate: u32,

    /// Lower bound for adaptive frame rate.
    pub min_frame_rate: u32,

    /// Bit rate in bits per second.
    pub bit_rate: u32,

    /// Upper bound for adaptive bit rate.
    pub max_bit_rate: u32,

    /// Lower bound for adaptive bit rate.
    pub min_bit_rate: u32,

    /// Output size; the transport preset size is used when unset.
    pub dimensions: Option<Dimensions>,

    /// Maximum frames between key frames; 1 means key frames only.
    pub max_key_frame_interval: Option<u32>,
}

impl Default for VideoConfiguration {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            max_frame_rate: 30,
            min_frame_rate: 15,
            bit_rate: 800_000,
            max_bit_rate: 96_000,
            min_bit_rate: 600_000,
            dimensions: None,
            max_key_frame_interval: None,
        }
    }
}

impl VideoConfiguration {
    /// Check the configuration for values no encoder preset can honour.
    ///
    /// The shipped defaults carry a max bit rate below the min bit rate, so
    /// the bit rate range is only checked once either bound differs from
    /// those defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("frame rate", self.frame_rate),
            ("max frame rate", self.max_frame_rate),
            ("min frame rate", self.min_frame_rate),
            ("video bit rate", self.bit_rate),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }

        if self.min_frame_rate > self.max_frame_rate {
            return Err(ConfigError::FrameRateRange {
                min: self.min_frame_rate,
                max: self.max_frame_rate,
            });
        }

        let defaults = Self::default();
        let custom_bounds = self.max_bit_rate != defaults.max_bit_rate
            || self.min_bit_rate != defaults.min_bit_rate;
        if custom_bounds && self.min_bit_rate > self.max_bit_rate {
            return Err(ConfigError::BitRateRange {
                min: self.min_bit_rate,
                max: self.max_bit_rate,
            });
        }

        if let Some(dimensions) = self.dimensions {
            if dimensions.width == 0 || dimensions.height == 0 {
                return Err(ConfigError::Zero { field: "dimensions" });
            }
        }

        if self.max_key_frame_interval == Some(0) {
            return Err(ConfigError::Zero {
                field: "max key frame interval",
            });
        }

        Ok(())
    }
}

/// Interface orientation the capture output is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl Orientation {
    /// Returns true for either landscape orientation.
    pub fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_defaults() {
        let config = AudioConfiguration::default();
        assert_eq!(config.bit_rate, 96_000);
        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(config.channels_count, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_video_defaults() {
        let config = VideoConfiguration::default();
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.max_frame_rate, 30);
        assert_eq!(config.min_frame_rate, 15);
        assert_eq!(config.dimensions, None);
        assert_eq!(config.max_key_frame_interval, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_audio_validation() {
        let config = AudioConfiguration {
            bit_rate: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "audio bit rate"
            })
        );

        let config = AudioConfiguration {
            sample_rate: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleRate(_))
        ));

        let config = AudioConfiguration {
            channels_count: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_video_validation() {
        let config = VideoConfiguration {
            min_frame_rate: 60,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::FrameRateRange { min: 60, max: 30 })
        );

        let config = VideoConfiguration {
            dimensions: Some(Dimensions::new(0, 720)),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = VideoConfiguration {
            max_bit_rate: 1_000_000,
            min_bit_rate: 2_000_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BitRateRange { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VideoConfiguration =
            serde_json::from_str(r#"{ "frame_rate": 24, "dimensions": { "width": 1280, "height": 720 } }"#)
                .unwrap();
        assert_eq!(config.frame_rate, 24);
        assert_eq!(config.min_frame_rate, 15);
        assert_eq!(config.dimensions, Some(Dimensions::new(1280, 720)));
    }

    #[test]
    fn test_orientation() {
        assert!(Orientation::LandscapeLeft.is_landscape());
        assert!(!Orientation::PortraitUpsideDown.is_landscape());
        assert_eq!(Orientation::default(), Orientation::Portrait);
    }
}
