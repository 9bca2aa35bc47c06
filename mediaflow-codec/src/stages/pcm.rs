//! PCM stages.
//!
//! Raw signed 16-bit PCM maps bytes to samples with no entropy coding,
//! which makes it the canonical exerciser for the session protocol:
//! the decoder is 1:1, and the encoder enforces the fixed-chunk rule
//! when a `frame_size` is configured.

use crate::descriptor::{StageDescriptor, StageKind};
use crate::session::{BoxedTransform, Transform};
use mediaflow_core::format::MediaType;
use mediaflow_core::options::Options;
use mediaflow_core::sample::{ChannelLayout, Sample, SampleFormat};
use mediaflow_core::timestamp::{Duration, TimeBase};
use mediaflow_core::unit::MediaUnit;
use mediaflow_core::{Error, Packet, PacketFlags, Result};

/// Descriptor for the PCM s16 decoder.
pub static PCM_S16_DECODER: StageDescriptor = StageDescriptor {
    name: "pcm_s16",
    long_name: "PCM signed 16-bit",
    kind: StageKind::Decoder,
    media_type: Some(MediaType::Audio),
    fixed_frame_size: false,
    delay: 0,
};

/// Descriptor for the PCM s16 encoder.
pub static PCM_S16_ENCODER: StageDescriptor = StageDescriptor {
    name: "pcm_s16",
    long_name: "PCM signed 16-bit",
    kind: StageKind::Encoder,
    media_type: Some(MediaType::Audio),
    fixed_frame_size: true,
    delay: 0,
};

fn audio_params(options: &Options) -> Result<(u32, ChannelLayout)> {
    let rate = options
        .get_int("sample_rate")
        .ok_or_else(|| Error::configuration("pcm_s16 requires a sample_rate option"))?;
    if rate <= 0 || rate > 768_000 {
        return Err(Error::configuration(format!("invalid sample_rate {rate}")));
    }
    let channels = options.int_or("channels", 2);
    if !(1..=8).contains(&channels) {
        return Err(Error::configuration(format!(
            "invalid channel count {channels}"
        )));
    }
    Ok((rate as u32, ChannelLayout::from_channels(channels as u32)))
}

/// Decoder backend: packet bytes in, interleaved s16 samples out.
pub struct PcmDecoder {
    sample_rate: u32,
    layout: ChannelLayout,
}

pub(crate) fn new_decoder(options: &Options) -> Result<BoxedTransform<Packet, MediaUnit>> {
    let (sample_rate, layout) = audio_params(options)?;
    Ok(Box::new(PcmDecoder {
        sample_rate,
        layout,
    }))
}

impl Transform for PcmDecoder {
    type In = Packet;
    type Out = MediaUnit;

    fn process(&mut self, packet: Packet, out: &mut Vec<MediaUnit>) -> Result<()> {
        if packet.is_empty() {
            return Ok(());
        }
        let bytes_per_frame = 2 * self.layout.channels() as usize;
        let data = packet.data();
        if data.len() % bytes_per_frame != 0 {
            return Err(Error::configuration(format!(
                "packet size {} is not a whole number of {}-channel s16 frames",
                data.len(),
                self.layout.channels()
            )));
        }
        let num_samples = data.len() / bytes_per_frame;
        let mut sample = Sample::new(num_samples, SampleFormat::S16, self.layout, self.sample_rate);
        sample.make_writable().data_mut().copy_from_slice(data);
        sample.pts = packet.pts;
        sample.duration = Duration::new(
            num_samples as i64,
            TimeBase::for_sample_rate(self.sample_rate),
        );
        out.push(MediaUnit::Audio(sample));
        Ok(())
    }

    fn reset(&mut self) {}
}

/// Encoder backend: interleaved s16 samples in, packet bytes out.
///
/// With a configured `frame_size`, every chunk must match it exactly;
/// the one allowed exception is a single short chunk immediately before
/// end of stream.
pub struct PcmEncoder {
    sample_rate: u32,
    layout: ChannelLayout,
    frame_size: Option<usize>,
    short_chunk_seen: bool,
}

pub(crate) fn new_encoder(options: &Options) -> Result<BoxedTransform<MediaUnit, Packet>> {
    let (sample_rate, layout) = audio_params(options)?;
    let frame_size = match options.get_int("frame_size") {
        Some(n) if n > 0 => Some(n as usize),
        Some(n) => {
            return Err(Error::configuration(format!("invalid frame_size {n}")));
        }
        None => None,
    };
    Ok(Box::new(PcmEncoder {
        sample_rate,
        layout,
        frame_size,
        short_chunk_seen: false,
    }))
}

impl PcmEncoder {
    fn check_chunk_size(&mut self, num_samples: usize) -> Result<()> {
        let Some(frame_size) = self.frame_size else {
            return Ok(());
        };
        if self.short_chunk_seen {
            return Err(Error::configuration(
                "input after the final short chunk".to_string(),
            ));
        }
        if num_samples > frame_size {
            return Err(Error::configuration(format!(
                "chunk of {num_samples} samples exceeds frame_size {frame_size}"
            )));
        }
        if num_samples < frame_size {
            // Legal only as the last chunk before end of stream.
            self.short_chunk_seen = true;
        }
        Ok(())
    }
}

impl Transform for PcmEncoder {
    type In = MediaUnit;
    type Out = Packet;

    fn process(&mut self, unit: MediaUnit, out: &mut Vec<Packet>) -> Result<()> {
        let Some(sample) = unit.as_audio() else {
            return Err(Error::configuration(
                "video unit sent to an audio encoder".to_string(),
            ));
        };
        if sample.format() != SampleFormat::S16 {
            return Err(Error::configuration(format!(
                "pcm_s16 expects s16 input, got {}",
                sample.format()
            )));
        }
        if sample.channel_layout() != self.layout {
            return Err(Error::configuration(format!(
                "channel layout mismatch: configured {}, got {}",
                self.layout,
                sample.channel_layout()
            )));
        }
        if sample.sample_rate() != self.sample_rate {
            return Err(Error::configuration(format!(
                "sample rate mismatch: configured {}, got {}",
                self.sample_rate,
                sample.sample_rate()
            )));
        }
        self.check_chunk_size(sample.num_samples())?;

        let mut packet = Packet::new(sample.buffer().data().to_vec());
        packet.pts = sample.pts;
        packet.dts = sample.pts;
        packet.duration = sample.duration;
        packet.flags = PacketFlags::KEYFRAME;
        out.push(packet);
        Ok(())
    }

    fn reset(&mut self) {
        self.short_chunk_seen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow_core::Timestamp;

    fn decoder(rate: i64, channels: i64) -> BoxedTransform<Packet, MediaUnit> {
        let opts = Options::new()
            .with("sample_rate", rate)
            .with("channels", channels);
        new_decoder(&opts).unwrap()
    }

    fn encoder(rate: i64, channels: i64, frame_size: Option<i64>) -> BoxedTransform<MediaUnit, Packet> {
        let mut opts = Options::new()
            .with("sample_rate", rate)
            .with("channels", channels);
        if let Some(fs) = frame_size {
            opts.set("frame_size", fs);
        }
        new_encoder(&opts).unwrap()
    }

    #[test]
    fn test_decoder_requires_sample_rate() {
        assert!(new_decoder(&Options::new()).is_err());
    }

    #[test]
    fn test_decode_round_numbers() {
        let mut dec = decoder(48000, 2);
        let mut out = Vec::new();
        // 4 bytes per stereo s16 frame.
        let mut packet = Packet::new(vec![0u8; 400]);
        packet.pts = Timestamp::new(0, TimeBase::for_sample_rate(48000));
        dec.process(packet, &mut out).unwrap();
        let sample = out.pop().and_then(MediaUnit::into_audio).unwrap();
        assert_eq!(sample.num_samples(), 100);
        assert_eq!(sample.duration.value, 100);
    }

    #[test]
    fn test_decode_rejects_partial_frames() {
        let mut dec = decoder(48000, 2);
        let mut out = Vec::new();
        assert!(dec.process(Packet::new(vec![0u8; 3]), &mut out).is_err());
    }

    #[test]
    fn test_encode_preserves_bytes() {
        let mut enc = encoder(8000, 1, None);
        let mut sample = Sample::new(4, SampleFormat::S16, ChannelLayout::Mono, 8000);
        sample.make_writable().data_mut().copy_from_slice(&[1, 0, 2, 0, 3, 0, 4, 0]);
        let mut out = Vec::new();
        enc.process(sample.into(), &mut out).unwrap();
        assert_eq!(out[0].data(), &[1, 0, 2, 0, 3, 0, 4, 0]);
        assert!(out[0].is_keyframe());
    }

    #[test]
    fn test_fixed_frame_size_enforced() {
        let mut enc = encoder(48000, 1, Some(1024));
        let mut out = Vec::new();

        let full = Sample::new(1024, SampleFormat::S16, ChannelLayout::Mono, 48000);
        enc.process(full.into(), &mut out).unwrap();

        // A short chunk is allowed once, as the final chunk.
        let short = Sample::new(176, SampleFormat::S16, ChannelLayout::Mono, 48000);
        enc.process(short.into(), &mut out).unwrap();

        // Anything after the short chunk is a configuration error.
        let more = Sample::new(1024, SampleFormat::S16, ChannelLayout::Mono, 48000);
        assert!(enc.process(more.into(), &mut out).is_err());
    }

    #[test]
    fn test_oversized_chunk_rejected() {
        let mut enc = encoder(48000, 1, Some(256));
        let big = Sample::new(512, SampleFormat::S16, ChannelLayout::Mono, 48000);
        assert!(enc.process(big.into(), &mut Vec::new()).is_err());
    }

    #[test]
    fn test_reset_clears_short_chunk_latch() {
        let mut enc = encoder(48000, 1, Some(64));
        let mut out = Vec::new();
        let short = Sample::new(10, SampleFormat::S16, ChannelLayout::Mono, 48000);
        enc.process(short.into(), &mut out).unwrap();
        enc.reset();
        let full = Sample::new(64, SampleFormat::S16, ChannelLayout::Mono, 48000);
        enc.process(full.into(), &mut out).unwrap();
    }
}
