//! The decoded-unit sum type carried on transform boundaries.

use crate::format::{AudioFormat, MediaType, StreamFormat, VideoFormat};
use crate::frame::Frame;
use crate::sample::Sample;
use crate::timestamp::{Duration, Timestamp};

/// A decoded media unit: the output of decoders, the input of encoders,
/// and the payload traveling on graph links.
#[derive(Debug, Clone)]
pub enum MediaUnit {
    /// A video frame.
    Video(Frame),
    /// An audio sample buffer.
    Audio(Sample),
}

impl MediaUnit {
    /// The media category of this unit.
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Video(_) => MediaType::Video,
            Self::Audio(_) => MediaType::Audio,
        }
    }

    /// Presentation timestamp.
    pub fn pts(&self) -> Timestamp {
        match self {
            Self::Video(f) => f.pts,
            Self::Audio(s) => s.pts,
        }
    }

    /// Set the presentation timestamp.
    pub fn set_pts(&mut self, pts: Timestamp) {
        match self {
            Self::Video(f) => f.pts = pts,
            Self::Audio(s) => s.pts = pts,
        }
    }

    /// Duration of this unit.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Video(f) => f.duration,
            Self::Audio(s) => s.duration,
        }
    }

    /// The concrete stream format this unit carries.
    pub fn stream_format(&self) -> StreamFormat {
        match self {
            Self::Video(f) => StreamFormat::Video(VideoFormat {
                pixel: f.format(),
                width: f.width(),
                height: f.height(),
                sample_aspect: f.sample_aspect,
            }),
            Self::Audio(s) => StreamFormat::Audio(AudioFormat {
                sample: s.format(),
                layout: s.channel_layout(),
                sample_rate: s.sample_rate(),
            }),
        }
    }

    /// The contained frame, if video.
    pub fn as_video(&self) -> Option<&Frame> {
        match self {
            Self::Video(f) => Some(f),
            Self::Audio(_) => None,
        }
    }

    /// The contained sample buffer, if audio.
    pub fn as_audio(&self) -> Option<&Sample> {
        match self {
            Self::Audio(s) => Some(s),
            Self::Video(_) => None,
        }
    }

    /// Unwrap into a frame, if video.
    pub fn into_video(self) -> Option<Frame> {
        match self {
            Self::Video(f) => Some(f),
            Self::Audio(_) => None,
        }
    }

    /// Unwrap into a sample buffer, if audio.
    pub fn into_audio(self) -> Option<Sample> {
        match self {
            Self::Audio(s) => Some(s),
            Self::Video(_) => None,
        }
    }
}

impl From<Frame> for MediaUnit {
    fn from(frame: Frame) -> Self {
        Self::Video(frame)
    }
}

impl From<Sample> for MediaUnit {
    fn from(sample: Sample) -> Self {
        Self::Audio(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;
    use crate::sample::{ChannelLayout, SampleFormat};
    use crate::timestamp::TimeBase;

    #[test]
    fn test_unit_accessors() {
        let unit: MediaUnit = Frame::new(320, 240, PixelFormat::Yuv420p).into();
        assert_eq!(unit.media_type(), MediaType::Video);
        assert!(unit.as_video().is_some());
        assert!(unit.as_audio().is_none());
        assert!(!unit.pts().is_known());
    }

    #[test]
    fn test_stream_format_round_trip() {
        let sample = Sample::new(256, SampleFormat::F32, ChannelLayout::Stereo, 44100);
        let unit: MediaUnit = sample.into();
        let fmt = unit.stream_format().as_audio().copied();
        assert_eq!(
            fmt,
            Some(AudioFormat::new(SampleFormat::F32, ChannelLayout::Stereo, 44100))
        );
    }

    #[test]
    fn test_set_pts() {
        let mut unit: MediaUnit = Sample::new(1, SampleFormat::S16, ChannelLayout::Mono, 8000).into();
        unit.set_pts(Timestamp::new(42, TimeBase::MILLIS));
        assert_eq!(unit.pts().value, 42);
    }
}
