//! Fixed-size chunk regrouping with timestamp propagation.
//!
//! Sits between a producer with variable chunk sizes and a consumer
//! that requires fixed ones (a fixed frame size encoder, typically).
//! Timestamps are reconciled across the regrouping: each emitted chunk
//! carries the timestamp of its first sample, derived from the first
//! known input timestamp plus the samples consumed since.

use crate::error::{AdapterError, Result};
use crate::fifo::SampleFifo;
use mediaflow_core::sample::{ChannelLayout, Sample, SampleFormat};
use mediaflow_core::timestamp::{Duration, TimeBase, Timestamp};

/// Regroups samples into fixed-size chunks.
pub struct ChunkAdapter {
    fifo: SampleFifo,
    chunk_size: usize,
    next_pts: Timestamp,
}

impl ChunkAdapter {
    /// Create an adapter emitting `chunk_size`-sample chunks.
    pub fn new(
        format: SampleFormat,
        layout: ChannelLayout,
        sample_rate: u32,
        chunk_size: usize,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AdapterError::InvalidChunkSize { size: chunk_size });
        }
        Ok(Self {
            fifo: SampleFifo::new(format, layout, sample_rate)?,
            chunk_size,
            next_pts: Timestamp::unknown(),
        })
    }

    /// The configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Samples currently buffered.
    pub fn available(&self) -> usize {
        self.fifo.available()
    }

    /// Append a producer chunk of any size.
    pub fn push(&mut self, sample: &Sample) -> Result<()> {
        if !self.next_pts.is_known() && sample.pts.is_known() {
            // Anchor the output clock on the first known timestamp,
            // backdated past anything already buffered.
            let tb = TimeBase::for_sample_rate(self.fifo.sample_rate());
            let buffered = self.fifo.available() as i64;
            self.next_pts = sample.pts.rescale(tb) - Duration::new(buffered, tb);
        }
        self.fifo.write(sample.buffer())?;
        Ok(())
    }

    /// Take one full chunk, if enough samples are buffered.
    pub fn pull(&mut self) -> Option<Sample> {
        if self.fifo.available() < self.chunk_size {
            return None;
        }
        Some(self.take(self.chunk_size))
    }

    /// Take whatever remains as a final short chunk.
    pub fn flush(&mut self) -> Option<Sample> {
        let remaining = self.fifo.available();
        if remaining == 0 {
            return None;
        }
        Some(self.take(remaining))
    }

    /// Discard buffered samples and the timestamp anchor.
    pub fn reset(&mut self) {
        self.fifo.reset();
        self.next_pts = Timestamp::unknown();
    }

    fn take(&mut self, count: usize) -> Sample {
        let buffer = self.fifo.pop(count);
        let tb = TimeBase::for_sample_rate(self.fifo.sample_rate());
        let mut sample = Sample::from_buffer(buffer);
        sample.pts = self.next_pts;
        sample.duration = Duration::new(count as i64, tb);
        if self.next_pts.is_known() {
            self.next_pts = self.next_pts + sample.duration;
        }
        sample
    }
}

impl std::fmt::Debug for ChunkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkAdapter")
            .field("chunk_size", &self.chunk_size)
            .field("available", &self.available())
            .field("next_pts", &self.next_pts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(chunk: usize) -> ChunkAdapter {
        ChunkAdapter::new(SampleFormat::S16, ChannelLayout::Mono, 48000, chunk).unwrap()
    }

    fn mono_chunk(n: usize, pts: Option<i64>) -> Sample {
        let mut s = Sample::new(n, SampleFormat::S16, ChannelLayout::Mono, 48000);
        if let Some(value) = pts {
            s.pts = Timestamp::new(value, TimeBase::for_sample_rate(48000));
        }
        s
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(ChunkAdapter::new(SampleFormat::S16, ChannelLayout::Mono, 48000, 0).is_err());
    }

    #[test]
    fn test_regroups_three_400s_into_1024_plus_176() {
        let mut a = adapter(1024);
        for i in 0..3 {
            a.push(&mono_chunk(400, Some(i * 400))).unwrap();
        }
        let full = a.pull().unwrap();
        assert_eq!(full.num_samples(), 1024);
        assert!(a.pull().is_none());

        let short = a.flush().unwrap();
        assert_eq!(short.num_samples(), 176);
        assert_eq!(a.available(), 0);
        assert!(a.flush().is_none());
    }

    #[test]
    fn test_timestamps_advance_by_consumed_samples() {
        let mut a = adapter(100);
        a.push(&mono_chunk(250, Some(1000))).unwrap();

        let first = a.pull().unwrap();
        assert_eq!(first.pts.value, 1000);
        let second = a.pull().unwrap();
        assert_eq!(second.pts.value, 1100);
        let tail = a.flush().unwrap();
        assert_eq!(tail.pts.value, 1200);
        assert_eq!(tail.num_samples(), 50);
    }

    #[test]
    fn test_anchor_backdates_over_buffered_samples() {
        let mut a = adapter(100);
        // First chunk has no timestamp; second does.
        a.push(&mono_chunk(60, None)).unwrap();
        a.push(&mono_chunk(60, Some(600))).unwrap();

        let chunk = a.pull().unwrap();
        // 60 untimed samples precede the anchored one at 600.
        assert_eq!(chunk.pts.value, 540);
    }

    #[test]
    fn test_unknown_pts_stays_unknown() {
        let mut a = adapter(10);
        a.push(&mono_chunk(25, None)).unwrap();
        assert!(!a.pull().unwrap().pts.is_known());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut a = adapter(10);
        a.push(&mono_chunk(25, Some(0))).unwrap();
        a.reset();
        assert_eq!(a.available(), 0);
        assert!(a.flush().is_none());
    }
}
