//! Concrete stream format descriptions used for link negotiation.

use crate::frame::PixelFormat;
use crate::rational::Rational;
use crate::sample::{ChannelLayout, SampleFormat};
use std::fmt;

/// Broad media category of a stream or stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MediaType {
    /// Video frames.
    Video,
    /// Audio samples.
    Audio,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Concrete video stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    /// Pixel format.
    pub pixel: PixelFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Sample aspect ratio; zero when unknown.
    pub sample_aspect: Rational,
}

impl VideoFormat {
    /// Create a video format with square pixels.
    pub fn new(pixel: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            pixel,
            width,
            height,
            sample_aspect: Rational::zero(),
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel)
    }
}

/// Concrete audio stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample format.
    pub sample: SampleFormat,
    /// Channel layout.
    pub layout: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Create an audio format.
    pub fn new(sample: SampleFormat, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            sample,
            layout,
            sample_rate,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz {} {}", self.sample_rate, self.layout, self.sample)
    }
}

/// A concrete format on one stream or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Video format.
    Video(VideoFormat),
    /// Audio format.
    Audio(AudioFormat),
}

impl StreamFormat {
    /// The media category of this format.
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Video(_) => MediaType::Video,
            Self::Audio(_) => MediaType::Audio,
        }
    }

    /// The video format, if this is video.
    pub fn as_video(&self) -> Option<&VideoFormat> {
        match self {
            Self::Video(v) => Some(v),
            Self::Audio(_) => None,
        }
    }

    /// The audio format, if this is audio.
    pub fn as_audio(&self) -> Option<&AudioFormat> {
        match self {
            Self::Audio(a) => Some(a),
            Self::Video(_) => None,
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(v) => write!(f, "video: {}", v),
            Self::Audio(a) => write!(f, "audio: {}", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type() {
        let v = StreamFormat::Video(VideoFormat::new(PixelFormat::Yuv420p, 320, 240));
        let a = StreamFormat::Audio(AudioFormat::new(
            SampleFormat::S16,
            ChannelLayout::Stereo,
            48000,
        ));
        assert_eq!(v.media_type(), MediaType::Video);
        assert_eq!(a.media_type(), MediaType::Audio);
        assert!(v.as_video().is_some());
        assert!(v.as_audio().is_none());
    }

    #[test]
    fn test_display() {
        let a = AudioFormat::new(SampleFormat::S16, ChannelLayout::Stereo, 44100);
        assert_eq!(a.to_string(), "44100 Hz stereo s16");
    }
}
