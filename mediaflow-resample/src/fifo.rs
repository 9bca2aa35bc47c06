//! Sample FIFO with exact accounting.
//!
//! The queue is tagged with a sample format and layout at creation and
//! rejects buffers that disagree. Writes always accept everything
//! (storage grows); reads return up to the requested count, where zero
//! is a normal outcome, not an error. At every point,
//! `available() == written - read - drained`.

use crate::error::{AdapterError, Result};
use mediaflow_core::sample::{ChannelLayout, SampleBuffer, SampleFormat};
use std::collections::VecDeque;

/// A FIFO of audio samples.
pub struct SampleFifo {
    format: SampleFormat,
    layout: ChannelLayout,
    sample_rate: u32,
    /// One deque per storage plane (1 for packed formats).
    planes: Vec<VecDeque<u8>>,
}

impl SampleFifo {
    /// Create an empty FIFO for the given audio parameters.
    pub fn new(format: SampleFormat, layout: ChannelLayout, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AdapterError::InvalidSampleRate { rate: sample_rate });
        }
        let channels = layout.channels() as usize;
        if channels == 0 {
            return Err(AdapterError::InvalidChannelCount { count: channels });
        }
        let num_planes = if format.is_planar() { channels } else { 1 };
        Ok(Self {
            format,
            layout,
            sample_rate,
            planes: (0..num_planes).map(|_| VecDeque::new()).collect(),
        })
    }

    /// Sample format this FIFO carries.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Channel layout this FIFO carries.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Sample rate this FIFO carries.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes occupied by one sample frame in the given plane.
    fn frame_bytes(&self, plane: usize) -> usize {
        let bytes = self.format.bytes_per_sample();
        if self.format.is_planar() {
            bytes
        } else {
            let _ = plane;
            bytes * self.layout.channels() as usize
        }
    }

    /// Exact number of samples ready to read.
    pub fn available(&self) -> usize {
        self.planes[0].len() / self.frame_bytes(0)
    }

    /// Exact number of samples that fit without reallocating.
    pub fn available_capacity(&self) -> usize {
        (self.planes[0].capacity() - self.planes[0].len()) / self.frame_bytes(0)
    }

    /// Check if the FIFO holds no samples.
    pub fn is_empty(&self) -> bool {
        self.planes[0].is_empty()
    }

    /// Append all samples from `buf`. Returns the number accepted,
    /// which is always the full buffer.
    pub fn write(&mut self, buf: &SampleBuffer) -> Result<usize> {
        if buf.format != self.format {
            return Err(AdapterError::FormatMismatch {
                expected: self.format,
                found: buf.format,
            });
        }
        let channels = self.layout.channels() as usize;
        if buf.layout.channels() as usize != channels {
            return Err(AdapterError::ChannelMismatch {
                expected: channels,
                found: buf.layout.channels() as usize,
            });
        }
        if buf.sample_rate != self.sample_rate {
            return Err(AdapterError::RateMismatch {
                expected: self.sample_rate,
                found: buf.sample_rate,
            });
        }
        for (plane_idx, plane) in self.planes.iter_mut().enumerate() {
            if let Some(src) = buf.plane(plane_idx) {
                plane.extend(src.iter().copied());
            }
        }
        Ok(buf.num_samples)
    }

    /// Remove up to `max_samples` from the front of the queue.
    ///
    /// The returned buffer holds exactly the number removed, which may
    /// be zero.
    pub fn pop(&mut self, max_samples: usize) -> SampleBuffer {
        let take = max_samples.min(self.available());
        let mut out = SampleBuffer::new(take, self.format, self.layout, self.sample_rate);
        for plane_idx in 0..self.planes.len() {
            let bytes = take * self.frame_bytes(plane_idx);
            let src: Vec<u8> = self.planes[plane_idx].drain(..bytes).collect();
            if let Some(dst) = out.plane_mut(plane_idx) {
                dst.copy_from_slice(&src);
            }
        }
        out
    }

    /// Copy up to `max_samples` from the front without removing them.
    pub fn peek(&self, max_samples: usize) -> SampleBuffer {
        let take = max_samples.min(self.available());
        let mut out = SampleBuffer::new(take, self.format, self.layout, self.sample_rate);
        for (plane_idx, plane) in self.planes.iter().enumerate() {
            let bytes = take * self.frame_bytes(plane_idx);
            if let Some(dst) = out.plane_mut(plane_idx) {
                for (dst_byte, src_byte) in dst.iter_mut().zip(plane.iter().take(bytes)) {
                    *dst_byte = *src_byte;
                }
            }
        }
        out
    }

    /// Discard up to `count` samples from the front. Returns the number
    /// actually discarded.
    pub fn drain(&mut self, count: usize) -> usize {
        let take = count.min(self.available());
        for plane_idx in 0..self.planes.len() {
            let bytes = take * self.frame_bytes(plane_idx);
            self.planes[plane_idx].drain(..bytes);
        }
        take
    }

    /// Discard everything.
    pub fn reset(&mut self) {
        for plane in &mut self.planes {
            plane.clear();
        }
    }
}

impl std::fmt::Debug for SampleFifo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleFifo")
            .field("format", &self.format)
            .field("layout", &self.layout)
            .field("sample_rate", &self.sample_rate)
            .field("available", &self.available())
            .finish()
    }
}
