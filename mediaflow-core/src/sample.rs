//! Decoded audio units.
//!
//! A [`Sample`] carries raw audio with timing and format metadata, backed
//! by reference-counted storage with the same copy-on-write discipline as
//! [`crate::frame::Frame`].

use crate::packet::{SideData, SideDataType};
use crate::timestamp::{Duration, TimeBase, Timestamp};
use std::fmt;
use std::sync::Arc;

/// Sample format for audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit, native endian.
    S16,
    /// Signed 32-bit, native endian.
    S32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Signed 16-bit planar.
    S16p,
    /// 32-bit float planar.
    F32p,
}

impl SampleFormat {
    /// Bytes per sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::F32 | Self::F32p => 4,
            Self::F64 => 8,
        }
    }

    /// Check if this is a planar format.
    pub fn is_planar(&self) -> bool {
        matches!(self, Self::S16p | Self::F32p)
    }

    /// Check if this is a floating-point format.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64 | Self::F32p)
    }

    /// Look up a format by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "u8" => Some(Self::U8),
            "s16" => Some(Self::S16),
            "s32" => Some(Self::S32),
            "flt" | "f32" => Some(Self::F32),
            "dbl" | "f64" => Some(Self::F64),
            "s16p" => Some(Self::S16p),
            "fltp" | "f32p" => Some(Self::F32p),
            _ => None,
        }
    }

    /// The packed equivalent of this format.
    pub fn to_packed(&self) -> Self {
        match self {
            Self::S16p => Self::S16,
            Self::F32p => Self::F32,
            other => *other,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::S16 => write!(f, "s16"),
            Self::S32 => write!(f, "s32"),
            Self::F32 => write!(f, "flt"),
            Self::F64 => write!(f, "dbl"),
            Self::S16p => write!(f, "s16p"),
            Self::F32p => write!(f, "fltp"),
        }
    }
}

/// Channel layout for audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ChannelLayout {
    /// Mono (1 channel).
    Mono,
    /// Stereo (2 channels).
    #[default]
    Stereo,
    /// Quad (4 channels).
    Quad,
    /// 5.1 (6 channels).
    Surround51,
    /// 7.1 (8 channels).
    Surround71,
    /// Custom layout with the given channel count.
    Custom(u32),
}

impl ChannelLayout {
    /// Number of channels.
    pub fn channels(&self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Quad => 4,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
            Self::Custom(n) => *n,
        }
    }

    /// Pick a layout from a channel count.
    pub fn from_channels(channels: u32) -> Self {
        match channels {
            1 => Self::Mono,
            2 => Self::Stereo,
            4 => Self::Quad,
            6 => Self::Surround51,
            8 => Self::Surround71,
            n => Self::Custom(n),
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono => write!(f, "mono"),
            Self::Stereo => write!(f, "stereo"),
            Self::Quad => write!(f, "quad"),
            Self::Surround51 => write!(f, "5.1"),
            Self::Surround71 => write!(f, "7.1"),
            Self::Custom(n) => write!(f, "{}ch", n),
        }
    }
}

/// Storage for audio sample data.
///
/// Planar formats use one buffer per channel; packed formats a single
/// interleaved buffer.
#[derive(Clone)]
pub struct SampleBuffer {
    /// Number of samples per channel.
    pub num_samples: usize,
    /// Sample format.
    pub format: SampleFormat,
    /// Channel layout.
    pub layout: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    data: Vec<Vec<u8>>,
}

impl SampleBuffer {
    /// Allocate a zeroed buffer.
    pub fn new(
        num_samples: usize,
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        let bytes = format.bytes_per_sample();
        let channels = layout.channels() as usize;
        let data = if format.is_planar() {
            (0..channels)
                .map(|_| vec![0u8; num_samples * bytes])
                .collect()
        } else {
            vec![vec![0u8; num_samples * channels * bytes]]
        };
        Self {
            num_samples,
            format,
            layout,
            sample_rate,
            data,
        }
    }

    /// Playback duration of this buffer.
    pub fn duration(&self) -> Duration {
        Duration::new(
            self.num_samples as i64,
            TimeBase::for_sample_rate(self.sample_rate),
        )
    }

    /// Number of storage planes (1 for packed formats).
    pub fn num_planes(&self) -> usize {
        self.data.len()
    }

    /// Raw bytes of a storage plane.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index).map(|v| v.as_slice())
    }

    /// Mutable raw bytes of a storage plane.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.data.get_mut(index).map(|v| v.as_mut_slice())
    }

    /// Interleaved data for packed formats.
    pub fn data(&self) -> &[u8] {
        &self.data[0]
    }

    /// Mutable interleaved data for packed formats.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[0]
    }

    /// Total size in bytes across planes.
    pub fn size(&self) -> usize {
        self.data.iter().map(Vec::len).sum()
    }

    /// View the first plane as i16 samples.
    ///
    /// Returns `None` for non-S16 formats or misaligned storage.
    pub fn as_s16(&self) -> Option<&[i16]> {
        if !matches!(self.format, SampleFormat::S16 | SampleFormat::S16p) {
            return None;
        }
        let data = &self.data[0];
        let ptr = data.as_ptr();
        if ptr.align_offset(std::mem::align_of::<i16>()) != 0 {
            return None;
        }
        // SAFETY: format verified as 16-bit and the pointer is aligned.
        Some(unsafe { std::slice::from_raw_parts(ptr as *const i16, data.len() / 2) })
    }

    /// View the first plane as f32 samples.
    ///
    /// Returns `None` for non-F32 formats or misaligned storage.
    pub fn as_f32(&self) -> Option<&[f32]> {
        if !matches!(self.format, SampleFormat::F32 | SampleFormat::F32p) {
            return None;
        }
        let data = &self.data[0];
        let ptr = data.as_ptr();
        if ptr.align_offset(std::mem::align_of::<f32>()) != 0 {
            return None;
        }
        // SAFETY: format verified as 32-bit float and the pointer is aligned.
        Some(unsafe { std::slice::from_raw_parts(ptr as *const f32, data.len() / 4) })
    }

    /// Fill all channels with silence.
    pub fn silence(&mut self) {
        let value = match self.format {
            SampleFormat::U8 => 128,
            _ => 0,
        };
        for channel in &mut self.data {
            channel.fill(value);
        }
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("num_samples", &self.num_samples)
            .field("format", &self.format)
            .field("layout", &self.layout)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// A decoded audio unit.
///
/// Cloning shares the underlying storage; [`Sample::make_writable`]
/// privatizes it when needed.
#[derive(Clone)]
pub struct Sample {
    buffer: Arc<SampleBuffer>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Duration covered by this buffer.
    pub duration: Duration,
    side_data: Vec<SideData>,
}

impl Sample {
    /// Allocate a sample buffer.
    pub fn new(
        num_samples: usize,
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Self {
        Self::from_buffer(SampleBuffer::new(num_samples, format, layout, sample_rate))
    }

    /// Wrap an existing buffer.
    pub fn from_buffer(buffer: SampleBuffer) -> Self {
        let duration = buffer.duration();
        Self {
            buffer: Arc::new(buffer),
            pts: Timestamp::unknown(),
            duration,
            side_data: Vec::new(),
        }
    }

    /// Number of samples per channel.
    pub fn num_samples(&self) -> usize {
        self.buffer.num_samples
    }

    /// Sample format.
    pub fn format(&self) -> SampleFormat {
        self.buffer.format
    }

    /// Channel layout.
    pub fn channel_layout(&self) -> ChannelLayout {
        self.buffer.layout
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    /// Number of channels.
    pub fn channels(&self) -> u32 {
        self.buffer.layout.channels()
    }

    /// Shared read access to the buffer.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Check whether the storage is shared with another sample.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.buffer) > 1
    }

    /// Get exclusive, writable access to the storage, copying it first if
    /// it is shared.
    pub fn make_writable(&mut self) -> &mut SampleBuffer {
        Arc::make_mut(&mut self.buffer)
    }

    /// Attach side data, replacing any existing entry of the same type.
    pub fn set_side_data(&mut self, data_type: SideDataType, data: Vec<u8>) {
        if let Some(existing) = self
            .side_data
            .iter_mut()
            .find(|sd| sd.data_type == data_type)
        {
            existing.data = data;
        } else {
            self.side_data.push(SideData::new(data_type, data));
        }
    }

    /// Get side data of a specific type.
    pub fn side_data(&self, data_type: SideDataType) -> Option<&[u8]> {
        self.side_data
            .iter()
            .find(|sd| sd.data_type == data_type)
            .map(|sd| sd.data.as_slice())
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("num_samples", &self.num_samples())
            .field("format", &self.format())
            .field("layout", &self.channel_layout())
            .field("sample_rate", &self.sample_rate())
            .field("pts", &self.pts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format() {
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert!(SampleFormat::F32p.is_planar());
        assert!(!SampleFormat::S16.is_planar());
        assert_eq!(SampleFormat::F32p.to_packed(), SampleFormat::F32);
    }

    #[test]
    fn test_channel_layout() {
        assert_eq!(ChannelLayout::Surround51.channels(), 6);
        assert_eq!(ChannelLayout::from_channels(2), ChannelLayout::Stereo);
        assert_eq!(ChannelLayout::from_channels(3), ChannelLayout::Custom(3));
    }

    #[test]
    fn test_packed_buffer_size() {
        let buffer = SampleBuffer::new(1024, SampleFormat::S16, ChannelLayout::Stereo, 48000);
        assert_eq!(buffer.num_planes(), 1);
        assert_eq!(buffer.size(), 1024 * 2 * 2);
    }

    #[test]
    fn test_planar_buffer_planes() {
        let buffer = SampleBuffer::new(512, SampleFormat::F32p, ChannelLayout::Stereo, 48000);
        assert_eq!(buffer.num_planes(), 2);
        assert!(buffer.plane(1).is_some());
        assert!(buffer.plane(2).is_none());
    }

    #[test]
    fn test_duration_uses_sample_rate_base() {
        let buffer = SampleBuffer::new(48000, SampleFormat::F32, ChannelLayout::Mono, 48000);
        assert!((buffer.duration().to_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_copy_on_write() {
        let mut a = Sample::new(16, SampleFormat::S16, ChannelLayout::Mono, 8000);
        let b = a.clone();
        assert!(a.is_shared());
        a.make_writable().data_mut()[0] = 0xFF;
        assert!(!a.is_shared());
        assert_eq!(b.buffer().data()[0], 0);
    }

    #[test]
    fn test_silence_u8_bias() {
        let mut buffer = SampleBuffer::new(4, SampleFormat::U8, ChannelLayout::Mono, 8000);
        buffer.data_mut().fill(7);
        buffer.silence();
        assert!(buffer.data().iter().all(|&b| b == 128));
    }

    #[test]
    fn test_typed_views() {
        let buffer = SampleBuffer::new(8, SampleFormat::S16, ChannelLayout::Mono, 8000);
        assert_eq!(buffer.as_s16().map(<[i16]>::len), Some(8));
        assert!(buffer.as_f32().is_none());
    }
}
