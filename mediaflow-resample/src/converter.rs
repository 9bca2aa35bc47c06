//! Linear-interpolation rate converter with drift compensation.
//!
//! Decode and encode clocks are independent fixed-point rates that
//! drift apart over long streams. The converter resamples between them
//! and offers two correction tools: a gradual ratio nudge
//! ([`Converter::set_compensation`]) and immediate discontinuous
//! correction ([`Converter::drop_output`], [`Converter::inject_silence`]).

use crate::error::{AdapterError, Result};
use mediaflow_core::sample::{SampleBuffer, SampleFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Converter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Input sample rate in Hz.
    pub input_rate: u32,
    /// Output sample rate in Hz.
    pub output_rate: u32,
    /// Number of channels.
    pub channels: usize,
}

impl ConverterConfig {
    /// Create a stereo configuration.
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        Self {
            input_rate,
            output_rate,
            channels: 2,
        }
    }

    /// Set the channel count.
    #[must_use]
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }
}

/// Linear-interpolation sample rate converter.
///
/// Operates on interleaved f32 frames. Input that does not fit the
/// caller's output buffer is held across calls; nothing is discarded
/// except through [`Converter::drop_output`] and [`Converter::reset`].
pub struct Converter {
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    /// Input frames advanced per output frame.
    ratio: f64,
    /// Fractional read position within `pending`.
    position: f64,
    /// Last input frame consumed, for interpolation at the boundary.
    prev: Vec<f32>,
    /// Buffered interleaved input not yet consumed.
    pending: Vec<f32>,
    /// Ratio while compensation is active.
    comp_ratio: f64,
    /// Output frames left under the compensated ratio.
    comp_remaining: usize,
    /// Output frames to discard.
    drop_remaining: usize,
    /// Silent output frames to insert.
    silence_remaining: usize,
}

impl Converter {
    /// Create a converter from a configuration.
    pub fn new(config: ConverterConfig) -> Result<Self> {
        if config.input_rate == 0 {
            return Err(AdapterError::InvalidSampleRate {
                rate: config.input_rate,
            });
        }
        if config.output_rate == 0 {
            return Err(AdapterError::InvalidSampleRate {
                rate: config.output_rate,
            });
        }
        if config.channels == 0 {
            return Err(AdapterError::InvalidChannelCount {
                count: config.channels,
            });
        }
        let ratio = config.input_rate as f64 / config.output_rate as f64;
        Ok(Self {
            input_rate: config.input_rate,
            output_rate: config.output_rate,
            channels: config.channels,
            ratio,
            position: 0.0,
            prev: vec![0.0; config.channels],
            pending: Vec::new(),
            comp_ratio: ratio,
            comp_remaining: 0,
            drop_remaining: 0,
            silence_remaining: 0,
        })
    }

    /// Input sample rate in Hz.
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Output sample rate in Hz.
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Conversion ratio (output rate over input rate).
    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    /// Upper bound on the frames one [`Converter::convert`] call can
    /// produce for `in_count` new input frames, so callers can size the
    /// output buffer without risking truncation.
    pub fn estimate_max_output(&self, in_count: usize) -> usize {
        let total_in = self.pending.len() / self.channels + in_count;
        let min_step = if self.comp_remaining > 0 {
            self.ratio.min(self.comp_ratio)
        } else {
            self.ratio
        };
        (total_in as f64 / min_step).ceil() as usize + self.silence_remaining + 2
    }

    /// Convert `input` into `out`, both interleaved by the configured
    /// channel count. Returns the number of output frames written.
    ///
    /// Input that cannot be converted yet (because `out` is full) is
    /// buffered and consumed on later calls.
    pub fn convert(&mut self, out: &mut [f32], input: &[f32]) -> Result<usize> {
        if input.len() % self.channels != 0 {
            return Err(AdapterError::BufferSizeMismatch {
                actual: input.len(),
                channels: self.channels,
            });
        }
        if out.len() % self.channels != 0 {
            return Err(AdapterError::BufferSizeMismatch {
                actual: out.len(),
                channels: self.channels,
            });
        }
        self.pending.extend_from_slice(input);
        Ok(self.produce(out))
    }

    /// Flush buffered input into `out`. Returns frames written; call
    /// repeatedly until it returns zero.
    pub fn flush(&mut self, out: &mut [f32]) -> Result<usize> {
        if out.len() % self.channels != 0 {
            return Err(AdapterError::BufferSizeMismatch {
                actual: out.len(),
                channels: self.channels,
            });
        }
        let written = self.produce(out);
        if written == 0 && !out.is_empty() {
            // Nothing more can come out; drop the sub-frame tail.
            self.pending.clear();
            self.position = 0.0;
        }
        Ok(written)
    }

    /// Gradually adjust the conversion ratio so that `sample_delta`
    /// extra output frames (or fewer, if negative) are produced over the
    /// next `distance` output frames, re-aligning output timestamps
    /// with a reference clock.
    pub fn set_compensation(&mut self, sample_delta: i32, distance: usize) -> Result<()> {
        if sample_delta == 0 {
            self.comp_ratio = self.ratio;
            self.comp_remaining = 0;
            return Ok(());
        }
        if distance == 0 || distance as i64 + sample_delta as i64 <= 0 {
            return Err(AdapterError::InvalidCompensation {
                delta: sample_delta,
                distance,
            });
        }
        self.comp_ratio = self.ratio * distance as f64 / (distance as f64 + sample_delta as f64);
        self.comp_remaining = distance;
        debug!(
            delta = sample_delta,
            distance, "rate compensation engaged"
        );
        Ok(())
    }

    /// Immediately discard the next `count` output frames.
    pub fn drop_output(&mut self, count: usize) {
        self.drop_remaining += count;
    }

    /// Immediately insert `count` silent output frames.
    pub fn inject_silence(&mut self, count: usize) {
        self.silence_remaining += count;
    }

    /// Current latency estimate in output frames: buffered input seen
    /// through the conversion ratio, plus queued silence.
    pub fn delay(&self) -> usize {
        let buffered = (self.pending.len() / self.channels) as f64 - self.position;
        let frames = (buffered.max(0.0) / self.ratio).round() as usize;
        frames + self.silence_remaining
    }

    /// Discard all internal state, including pending corrections.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.position = 0.0;
        self.prev.fill(0.0);
        self.comp_ratio = self.ratio;
        self.comp_remaining = 0;
        self.drop_remaining = 0;
        self.silence_remaining = 0;
    }

    /// Core production loop. Returns output frames written.
    fn produce(&mut self, out: &mut [f32]) -> usize {
        let out_cap = out.len() / self.channels;
        let mut written = 0usize;

        while written < out_cap && self.silence_remaining > 0 {
            out[written * self.channels..(written + 1) * self.channels].fill(0.0);
            self.silence_remaining -= 1;
            written += 1;
        }

        let mut frame = vec![0.0f32; self.channels];
        loop {
            if written >= out_cap && self.drop_remaining == 0 {
                break;
            }
            let pending_frames = self.pending.len() / self.channels;
            let idx = self.position as usize;
            if idx >= pending_frames {
                break;
            }
            let frac = (self.position - idx as f64) as f32;
            for ch in 0..self.channels {
                let s0 = if idx == 0 {
                    self.prev[ch]
                } else {
                    self.pending[(idx - 1) * self.channels + ch]
                };
                let s1 = self.pending[idx * self.channels + ch];
                frame[ch] = s0 + (s1 - s0) * frac;
            }

            if self.drop_remaining > 0 {
                self.drop_remaining -= 1;
            } else {
                out[written * self.channels..(written + 1) * self.channels]
                    .copy_from_slice(&frame);
                written += 1;
            }

            let step = if self.comp_remaining > 0 {
                self.comp_remaining -= 1;
                self.comp_ratio
            } else {
                self.ratio
            };
            self.position += step;
        }

        // Trim fully consumed input, keeping the boundary frame for
        // interpolation.
        let consumed = self.position as usize;
        let pending_frames = self.pending.len() / self.channels;
        let consumed = consumed.min(pending_frames);
        if consumed > 0 {
            let last = (consumed - 1) * self.channels;
            self.prev
                .copy_from_slice(&self.pending[last..last + self.channels]);
            self.pending.drain(..consumed * self.channels);
            self.position -= consumed as f64;
        }

        written
    }

    /// Convert a whole sample buffer, returning packed f32 output at
    /// the target rate. Accepts packed s16 or f32 input.
    pub fn process_buffer(&mut self, input: &SampleBuffer) -> Result<SampleBuffer> {
        let channels = input.layout.channels() as usize;
        if channels != self.channels {
            return Err(AdapterError::ChannelMismatch {
                expected: self.channels,
                found: channels,
            });
        }
        let input_f32 = buffer_to_f32(input)?;
        let mut out = vec![0.0f32; self.estimate_max_output(input.num_samples) * self.channels];
        let frames = self.convert(&mut out, &input_f32)?;

        let mut buffer = SampleBuffer::new(
            frames,
            SampleFormat::F32,
            input.layout,
            self.output_rate,
        );
        let data = buffer.data_mut();
        for (i, value) in out[..frames * self.channels].iter().enumerate() {
            data[i * 4..i * 4 + 4].copy_from_slice(&value.to_ne_bytes());
        }
        Ok(buffer)
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("input_rate", &self.input_rate)
            .field("output_rate", &self.output_rate)
            .field("channels", &self.channels)
            .field("delay", &self.delay())
            .finish()
    }
}

/// Widen a packed s16 or f32 buffer to interleaved f32.
pub fn buffer_to_f32(buffer: &SampleBuffer) -> Result<Vec<f32>> {
    match buffer.format {
        SampleFormat::F32 => Ok(buffer
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        SampleFormat::S16 => Ok(buffer
            .data()
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect()),
        other => Err(AdapterError::FormatMismatch {
            expected: SampleFormat::F32,
            found: other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow_core::sample::ChannelLayout;

    fn mono(input_rate: u32, output_rate: u32) -> Converter {
        Converter::new(ConverterConfig::new(input_rate, output_rate).with_channels(1)).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Converter::new(ConverterConfig::new(0, 48000)).is_err());
        assert!(Converter::new(ConverterConfig::new(48000, 0)).is_err());
        assert!(Converter::new(ConverterConfig::new(44100, 48000).with_channels(0)).is_err());
    }

    #[test]
    fn test_upsample_produces_roughly_double() {
        let mut c = mono(24000, 48000);
        let input: Vec<f32> = (0..100).map(|i| (i as f32 / 50.0).sin()).collect();
        let mut out = vec![0.0f32; c.estimate_max_output(input.len())];
        let frames = c.convert(&mut out, &input).unwrap();
        assert!((195..=205).contains(&frames), "got {frames}");
    }

    #[test]
    fn test_downsample_produces_roughly_half() {
        let mut c = mono(48000, 24000);
        let input = vec![0.5f32; 200];
        let mut out = vec![0.0f32; c.estimate_max_output(input.len())];
        let frames = c.convert(&mut out, &input).unwrap();
        assert!((95..=105).contains(&frames), "got {frames}");
    }

    #[test]
    fn test_small_output_buffer_keeps_excess_input() {
        let mut c = mono(48000, 48000);
        let input = vec![1.0f32; 100];
        let mut out = vec![0.0f32; 30];
        assert_eq!(c.convert(&mut out, &input).unwrap(), 30);
        assert!(c.delay() >= 70);

        // The rest comes out on a later call with no new input.
        let mut rest = vec![0.0f32; 200];
        assert_eq!(c.convert(&mut rest, &[]).unwrap(), 70);
        assert_eq!(c.delay(), 0);
    }

    #[test]
    fn test_identity_conversion_has_one_sample_latency() {
        let mut c = mono(48000, 48000);
        let input: Vec<f32> = (1..=8).map(|i| i as f32).collect();
        let mut out = vec![0.0f32; 16];
        let frames = c.convert(&mut out, &input).unwrap();
        assert_eq!(frames, 8);
        // Integral positions interpolate fully toward the previous
        // frame, so the signal arrives delayed by one sample.
        assert_eq!(out[0], 0.0);
        assert_eq!(&out[1..8], &input[..7]);
    }

    #[test]
    fn test_compensation_changes_output_count() {
        // +10 frames over 100: 100 input frames at 1:1 become ~110.
        let mut c = mono(48000, 48000);
        c.set_compensation(10, 100).unwrap();
        let input = vec![0.0f32; 200];
        let mut out = vec![0.0f32; c.estimate_max_output(input.len())];
        let frames = c.convert(&mut out, &input).unwrap();
        assert!((208..=212).contains(&frames), "got {frames}");
    }

    #[test]
    fn test_compensation_validation() {
        let mut c = mono(48000, 48000);
        assert!(c.set_compensation(5, 0).is_err());
        assert!(c.set_compensation(-100, 50).is_err());
        assert!(c.set_compensation(0, 0).is_ok());
    }

    #[test]
    fn test_drop_output_discards_frames() {
        let mut c = mono(48000, 48000);
        c.drop_output(25);
        let input = vec![1.0f32; 100];
        let mut out = vec![0.0f32; 200];
        let frames = c.convert(&mut out, &input).unwrap();
        assert_eq!(frames, 75);
    }

    #[test]
    fn test_inject_silence_prepends_zeros() {
        let mut c = mono(48000, 48000);
        c.inject_silence(5);
        let input = vec![1.0f32; 10];
        let mut out = vec![9.0f32; 32];
        let frames = c.convert(&mut out, &input).unwrap();
        assert_eq!(frames, 15);
        assert!(out[..5].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_flush_then_zero() {
        let mut c = mono(44100, 48000);
        let input = vec![0.25f32; 441];
        let mut out = vec![0.0f32; 16];
        let _ = c.convert(&mut out, &input).unwrap();

        let mut total = 0usize;
        loop {
            let n = c.flush(&mut out).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        assert!(total > 0);
        assert_eq!(c.delay(), 0);
    }

    #[test]
    fn test_process_buffer_converts_s16() {
        let mut c = Converter::new(ConverterConfig::new(44100, 48000).with_channels(2)).unwrap();
        let input = SampleBuffer::new(441, SampleFormat::S16, ChannelLayout::Stereo, 44100);
        let out = c.process_buffer(&input).unwrap();
        assert_eq!(out.format, SampleFormat::F32);
        assert_eq!(out.sample_rate, 48000);
        assert!(out.num_samples > 0);
    }
}
