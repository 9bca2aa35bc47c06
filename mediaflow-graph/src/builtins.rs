//! Built-in filter kinds.
//!
//! Sources (`buffer`, `abuffer`) and sinks (`buffersink`,
//! `abuffersink`) adapt the graph boundary; the rest are ordinary
//! transform nodes.

use crate::error::{GraphError, Result};
use crate::filter::{Filter, FilterFactory, FormatSet};
use mediaflow_core::format::{AudioFormat, StreamFormat, VideoFormat};
use mediaflow_core::frame::{Frame, PixelFormat};
use mediaflow_core::options::Options;
use mediaflow_core::sample::{ChannelLayout, Sample, SampleBuffer, SampleFormat};
use mediaflow_core::timestamp::{Duration, TimeBase, Timestamp};
use mediaflow_core::unit::MediaUnit;
use mediaflow_core::Error;
use mediaflow_resample::{buffer_to_f32, Converter, ConverterConfig};
use std::collections::HashMap;

pub(crate) fn register_builtins(map: &mut HashMap<String, FilterFactory>) {
    let entries: [(&str, FilterFactory); 11] = [
        ("buffer", new_video_source),
        ("abuffer", new_audio_source),
        ("buffersink", new_video_sink),
        ("abuffersink", new_audio_sink),
        ("null", new_video_null),
        ("anull", new_audio_null),
        ("volume", new_volume),
        ("scale", new_scale),
        ("split", new_split),
        ("amix", new_amix),
        ("aresample", new_aresample),
    ];
    for (name, factory) in entries {
        map.insert(name.to_string(), factory);
    }
}

/// Build a packed f32 sample from interleaved values.
fn sample_from_f32(values: &[f32], layout: ChannelLayout, sample_rate: u32) -> Sample {
    let channels = layout.channels() as usize;
    let frames = values.len() / channels;
    let mut buffer = SampleBuffer::new(frames, SampleFormat::F32, layout, sample_rate);
    let data = buffer.data_mut();
    for (i, value) in values.iter().enumerate() {
        data[i * 4..i * 4 + 4].copy_from_slice(&value.to_ne_bytes());
    }
    Sample::from_buffer(buffer)
}

// =============================================================================
// Sources and sinks
// =============================================================================

/// Video injection point; units enter via `Graph::push_source`.
struct VideoSource {
    format: VideoFormat,
}

fn new_video_source(options: &Options) -> Result<Box<dyn Filter>> {
    let width = options
        .get_int("width")
        .ok_or_else(|| Error::configuration("buffer requires a width option"))?;
    let height = options
        .get_int("height")
        .ok_or_else(|| Error::configuration("buffer requires a height option"))?;
    if width <= 0 || height <= 0 {
        return Err(Error::configuration(format!("invalid dimensions {width}x{height}")).into());
    }
    let name = options.get_str("pix_fmt").unwrap_or("yuv420p");
    let pixel = PixelFormat::from_name(name)
        .ok_or_else(|| Error::configuration(format!("unknown pixel format {name}")))?;
    Ok(Box::new(VideoSource {
        format: VideoFormat::new(pixel, width as u32, height as u32),
    }))
}

impl Filter for VideoSource {
    fn kind(&self) -> &'static str {
        "buffer"
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn configure(&mut self, _inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        Ok(vec![StreamFormat::Video(self.format)])
    }

    fn process(&mut self, _pad: usize, _unit: MediaUnit, _out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        Err(Error::InvalidState("source nodes take input via push_source").into())
    }
}

/// Audio injection point.
struct AudioSource {
    format: AudioFormat,
}

fn new_audio_source(options: &Options) -> Result<Box<dyn Filter>> {
    let rate = options
        .get_int("sample_rate")
        .ok_or_else(|| Error::configuration("abuffer requires a sample_rate option"))?;
    if rate <= 0 {
        return Err(Error::configuration(format!("invalid sample_rate {rate}")).into());
    }
    let channels = options.int_or("channels", 2);
    if !(1..=8).contains(&channels) {
        return Err(Error::configuration(format!("invalid channel count {channels}")).into());
    }
    let name = options.get_str("format").unwrap_or("s16");
    let sample = SampleFormat::from_name(name)
        .ok_or_else(|| Error::configuration(format!("unknown sample format {name}")))?;
    Ok(Box::new(AudioSource {
        format: AudioFormat::new(
            sample,
            ChannelLayout::from_channels(channels as u32),
            rate as u32,
        ),
    }))
}

impl Filter for AudioSource {
    fn kind(&self) -> &'static str {
        "abuffer"
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn configure(&mut self, _inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        Ok(vec![StreamFormat::Audio(self.format)])
    }

    fn process(&mut self, _pad: usize, _unit: MediaUnit, _out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        Err(Error::InvalidState("source nodes take input via push_source").into())
    }
}

/// Extraction point; units leave via `Graph::pull_sink`. An optional
/// `format` option restricts what the sink accepts, which is how
/// callers force a conversion step to exist upstream.
struct Sink {
    kind: &'static str,
    accepts: FormatSet,
}

fn new_video_sink(options: &Options) -> Result<Box<dyn Filter>> {
    let accepts = match options.get_str("format") {
        Some(name) => FormatSet::Video(vec![PixelFormat::from_name(name).ok_or_else(
            || Error::configuration(format!("unknown pixel format {name}")),
        )?]),
        None => FormatSet::Video(vec![]),
    };
    Ok(Box::new(Sink {
        kind: "buffersink",
        accepts,
    }))
}

fn new_audio_sink(options: &Options) -> Result<Box<dyn Filter>> {
    let accepts = match options.get_str("format") {
        Some(name) => FormatSet::Audio(vec![SampleFormat::from_name(name).ok_or_else(
            || Error::configuration(format!("unknown sample format {name}")),
        )?]),
        None => FormatSet::Audio(vec![]),
    };
    Ok(Box::new(Sink {
        kind: "abuffersink",
        accepts,
    }))
}

impl Filter for Sink {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn input_formats(&self, _pad: usize) -> FormatSet {
        self.accepts.clone()
    }

    fn configure(&mut self, _inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        Ok(Vec::new())
    }

    fn process(&mut self, _pad: usize, _unit: MediaUnit, _out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        Err(Error::InvalidState("sink nodes yield output via pull_sink").into())
    }
}

// =============================================================================
// Pass-through
// =============================================================================

struct Null {
    kind: &'static str,
    accepts_video: bool,
}

fn new_video_null(_options: &Options) -> Result<Box<dyn Filter>> {
    Ok(Box::new(Null {
        kind: "null",
        accepts_video: true,
    }))
}

fn new_audio_null(_options: &Options) -> Result<Box<dyn Filter>> {
    Ok(Box::new(Null {
        kind: "anull",
        accepts_video: false,
    }))
}

impl Filter for Null {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input_formats(&self, _pad: usize) -> FormatSet {
        if self.accepts_video {
            FormatSet::Video(vec![])
        } else {
            FormatSet::Audio(vec![])
        }
    }

    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        Ok(vec![inputs[0]])
    }

    fn process(&mut self, _pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        out.push((0, unit));
        Ok(())
    }
}

// =============================================================================
// Volume
// =============================================================================

/// Scales audio amplitude by a fixed gain.
struct Volume {
    gain: f32,
}

fn new_volume(options: &Options) -> Result<Box<dyn Filter>> {
    let gain_db = options.get_float("gain_db").unwrap_or(0.0);
    Ok(Box::new(Volume {
        gain: 10.0_f32.powf(gain_db as f32 / 20.0),
    }))
}

impl Filter for Volume {
    fn kind(&self) -> &'static str {
        "volume"
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input_formats(&self, _pad: usize) -> FormatSet {
        FormatSet::Audio(vec![SampleFormat::S16, SampleFormat::F32])
    }

    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        Ok(vec![inputs[0]])
    }

    fn process(&mut self, _pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        let Some(sample) = unit.as_audio() else {
            return Err(GraphError::Negotiation("volume requires audio input".to_string()));
        };
        let mut sample = sample.clone();
        let gain = self.gain;
        let buffer = sample.make_writable();
        match buffer.format {
            SampleFormat::S16 => {
                for chunk in buffer.data_mut().chunks_exact_mut(2) {
                    let v = i16::from_ne_bytes([chunk[0], chunk[1]]);
                    let scaled = (v as f32 * gain).clamp(-32768.0, 32767.0) as i16;
                    chunk.copy_from_slice(&scaled.to_ne_bytes());
                }
            }
            SampleFormat::F32 => {
                for chunk in buffer.data_mut().chunks_exact_mut(4) {
                    let v = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    chunk.copy_from_slice(&(v * gain).to_ne_bytes());
                }
            }
            other => {
                return Err(GraphError::Negotiation(format!(
                    "volume cannot process {other}"
                )));
            }
        }
        out.push((0, MediaUnit::Audio(sample)));
        Ok(())
    }
}

// =============================================================================
// Scale
// =============================================================================

/// Nearest-neighbor video resizer.
struct Scale {
    width: u32,
    height: u32,
}

fn new_scale(options: &Options) -> Result<Box<dyn Filter>> {
    let width = options
        .get_int("width")
        .ok_or_else(|| Error::configuration("scale requires a width option"))?;
    let height = options
        .get_int("height")
        .ok_or_else(|| Error::configuration("scale requires a height option"))?;
    if width <= 0 || height <= 0 {
        return Err(Error::configuration(format!("invalid dimensions {width}x{height}")).into());
    }
    Ok(Box::new(Scale {
        width: width as u32,
        height: height as u32,
    }))
}

impl Filter for Scale {
    fn kind(&self) -> &'static str {
        "scale"
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input_formats(&self, _pad: usize) -> FormatSet {
        FormatSet::Video(vec![
            PixelFormat::Yuv420p,
            PixelFormat::Yuv422p,
            PixelFormat::Yuv444p,
            PixelFormat::Gray8,
        ])
    }

    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        let Some(video) = inputs[0].as_video() else {
            return Err(GraphError::Negotiation("scale requires video input".to_string()));
        };
        let mut output = *video;
        output.width = self.width;
        output.height = self.height;
        Ok(vec![StreamFormat::Video(output)])
    }

    fn process(&mut self, _pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        let Some(frame) = unit.as_video() else {
            return Err(GraphError::Negotiation("scale requires video input".to_string()));
        };
        if frame.width() == self.width && frame.height() == self.height {
            out.push((0, MediaUnit::Video(frame.clone())));
            return Ok(());
        }

        let format = frame.format();
        let mut scaled = Frame::new(self.width, self.height, format);
        let (hsub, vsub) = format.chroma_subsampling();
        {
            let dst_buffer = scaled.make_writable();
            for plane in 0..format.num_planes() {
                let (src_w, src_h, dst_w, dst_h) = if plane == 0 {
                    (
                        frame.width() as usize,
                        frame.height() as usize,
                        self.width as usize,
                        self.height as usize,
                    )
                } else {
                    (
                        frame.width() as usize / hsub as usize,
                        frame.height() as usize / vsub as usize,
                        self.width as usize / hsub as usize,
                        self.height as usize / vsub as usize,
                    )
                };
                let src_stride = frame.stride(plane);
                let dst_stride = dst_buffer.stride(plane);
                let Some(src) = frame.plane(plane) else { continue };
                let Some(dst) = dst_buffer.plane_mut(plane) else { continue };
                for y in 0..dst_h {
                    let sy = y * src_h / dst_h;
                    for x in 0..dst_w {
                        let sx = x * src_w / dst_w;
                        dst[y * dst_stride + x] = src[sy * src_stride + sx];
                    }
                }
            }
        }
        scaled.pts = frame.pts;
        scaled.duration = frame.duration;
        scaled.flags = frame.flags;
        scaled.picture_type = frame.picture_type;
        out.push((0, MediaUnit::Video(scaled)));
        Ok(())
    }
}

// =============================================================================
// Split
// =============================================================================

/// Duplicates its input onto two output pads. Cheap: the copies share
/// their payload until someone writes.
struct Split;

fn new_split(_options: &Options) -> Result<Box<dyn Filter>> {
    Ok(Box::new(Split))
}

impl Filter for Split {
    fn kind(&self) -> &'static str {
        "split"
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        2
    }

    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        Ok(vec![inputs[0], inputs[0]])
    }

    fn process(&mut self, _pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        out.push((0, unit.clone()));
        out.push((1, unit));
        Ok(())
    }
}

// =============================================================================
// Amix
// =============================================================================

/// Mixes two audio inputs by addition, producing packed f32.
///
/// Inputs may arrive in different chunk sizes; each pad buffers
/// independently and mixing advances by whatever both pads can cover.
struct Amix {
    queues: [Vec<f32>; 2],
    layout: ChannelLayout,
    sample_rate: u32,
    next_pts: Timestamp,
}

fn new_amix(_options: &Options) -> Result<Box<dyn Filter>> {
    Ok(Box::new(Amix {
        queues: [Vec::new(), Vec::new()],
        layout: ChannelLayout::Stereo,
        sample_rate: 0,
        next_pts: Timestamp::unknown(),
    }))
}

impl Amix {
    fn emit(&mut self, values: Vec<f32>, out: &mut Vec<(usize, MediaUnit)>) {
        if values.is_empty() {
            return;
        }
        let mut sample = sample_from_f32(&values, self.layout, self.sample_rate);
        sample.pts = self.next_pts;
        if self.next_pts.is_known() {
            self.next_pts = self.next_pts + sample.duration;
        }
        out.push((0, MediaUnit::Audio(sample)));
    }
}

impl Filter for Amix {
    fn kind(&self) -> &'static str {
        "amix"
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input_formats(&self, _pad: usize) -> FormatSet {
        FormatSet::Audio(vec![SampleFormat::S16, SampleFormat::F32])
    }

    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        let (Some(a), Some(b)) = (inputs[0].as_audio(), inputs[1].as_audio()) else {
            return Err(GraphError::Negotiation("amix requires audio on both pads".to_string()));
        };
        if a.sample_rate != b.sample_rate || a.layout != b.layout {
            return Err(GraphError::Negotiation(format!(
                "amix inputs disagree: {} vs {}",
                a, b
            )));
        }
        self.layout = a.layout;
        self.sample_rate = a.sample_rate;
        self.queues = [Vec::new(), Vec::new()];
        self.next_pts = Timestamp::unknown();
        Ok(vec![StreamFormat::Audio(AudioFormat::new(
            SampleFormat::F32,
            a.layout,
            a.sample_rate,
        ))])
    }

    fn process(&mut self, pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        let Some(sample) = unit.as_audio() else {
            return Err(GraphError::Negotiation("amix requires audio input".to_string()));
        };
        if pad == 0 && !self.next_pts.is_known() && sample.pts.is_known() {
            let tb = TimeBase::for_sample_rate(self.sample_rate);
            let queued = (self.queues[0].len() / self.layout.channels() as usize) as i64;
            self.next_pts = sample.pts.rescale(tb) - Duration::new(queued, tb);
        }
        self.queues[pad].extend(buffer_to_f32(sample.buffer())?);

        let ready = self.queues[0].len().min(self.queues[1].len());
        if ready == 0 {
            return Ok(());
        }
        let a: Vec<f32> = self.queues[0].drain(..ready).collect();
        let b: Vec<f32> = self.queues[1].drain(..ready).collect();
        let mixed = a.iter().zip(b.iter()).map(|(x, y)| x + y).collect();
        self.emit(mixed, out);
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<(usize, MediaUnit)>) -> Result<()> {
        // One side may outlive the other; the missing side reads as
        // silence.
        let longest = self.queues[0].len().max(self.queues[1].len());
        if longest == 0 {
            return Ok(());
        }
        let mut mixed = vec![0.0f32; longest];
        for queue in &mut self.queues {
            for (dst, src) in mixed.iter_mut().zip(queue.iter()) {
                *dst += *src;
            }
            queue.clear();
        }
        self.emit(mixed, out);
        Ok(())
    }
}

// =============================================================================
// Aresample
// =============================================================================

/// Sample-rate conversion node wrapping the buffering adapter's
/// converter. Output is packed f32 at the target rate.
struct Aresample {
    target_rate: u32,
    converter: Option<Converter>,
    layout: ChannelLayout,
    next_pts: Timestamp,
}

fn new_aresample(options: &Options) -> Result<Box<dyn Filter>> {
    let rate = options
        .get_int("sample_rate")
        .ok_or_else(|| Error::configuration("aresample requires a sample_rate option"))?;
    if rate <= 0 {
        return Err(Error::configuration(format!("invalid sample_rate {rate}")).into());
    }
    Ok(Box::new(Aresample {
        target_rate: rate as u32,
        converter: None,
        layout: ChannelLayout::Stereo,
        next_pts: Timestamp::unknown(),
    }))
}

impl Aresample {
    fn emit(&mut self, buffer: SampleBuffer, out: &mut Vec<(usize, MediaUnit)>) {
        if buffer.num_samples == 0 {
            return;
        }
        let mut sample = Sample::from_buffer(buffer);
        sample.pts = self.next_pts;
        if self.next_pts.is_known() {
            self.next_pts = self.next_pts + sample.duration;
        }
        out.push((0, MediaUnit::Audio(sample)));
    }
}

impl Filter for Aresample {
    fn kind(&self) -> &'static str {
        "aresample"
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input_formats(&self, _pad: usize) -> FormatSet {
        FormatSet::Audio(vec![SampleFormat::S16, SampleFormat::F32])
    }

    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>> {
        let Some(audio) = inputs[0].as_audio() else {
            return Err(GraphError::Negotiation("aresample requires audio input".to_string()));
        };
        let config = ConverterConfig {
            input_rate: audio.sample_rate,
            output_rate: self.target_rate,
            channels: audio.layout.channels() as usize,
        };
        self.converter = Some(Converter::new(config)?);
        self.layout = audio.layout;
        self.next_pts = Timestamp::unknown();
        Ok(vec![StreamFormat::Audio(AudioFormat::new(
            SampleFormat::F32,
            audio.layout,
            self.target_rate,
        ))])
    }

    fn process(&mut self, _pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()> {
        let Some(sample) = unit.as_audio() else {
            return Err(GraphError::Negotiation("aresample requires audio input".to_string()));
        };
        let Some(converter) = self.converter.as_mut() else {
            return Err(Error::InvalidState("aresample used before configure").into());
        };
        if !self.next_pts.is_known() && sample.pts.is_known() {
            let tb = TimeBase::for_sample_rate(self.target_rate);
            let delayed = converter.delay() as i64;
            self.next_pts = sample.pts.rescale(tb) - Duration::new(delayed, tb);
        }
        let converted = converter.process_buffer(sample.buffer())?;
        self.emit(converted, out);
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<(usize, MediaUnit)>) -> Result<()> {
        let Some(converter) = self.converter.as_mut() else {
            return Ok(());
        };
        let channels = self.layout.channels() as usize;
        let mut scratch = vec![0.0f32; 1024 * channels];
        let mut values = Vec::new();
        loop {
            let frames = converter.flush(&mut scratch)?;
            if frames == 0 {
                break;
            }
            values.extend_from_slice(&scratch[..frames * channels]);
        }
        if !values.is_empty() {
            let buffer = {
                let mut b = sample_from_f32(&values, self.layout, self.target_rate);
                b.pts = self.next_pts;
                b
            };
            out.push((0, MediaUnit::Audio(buffer)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_unit(n: usize, rate: u32) -> MediaUnit {
        Sample::new(n, SampleFormat::S16, ChannelLayout::Mono, rate).into()
    }

    fn mono_fmt(rate: u32) -> StreamFormat {
        StreamFormat::Audio(AudioFormat::new(SampleFormat::S16, ChannelLayout::Mono, rate))
    }

    #[test]
    fn test_volume_unity_gain_is_identity() {
        let mut volume = new_volume(&Options::new()).unwrap();
        let mut sample = Sample::new(4, SampleFormat::S16, ChannelLayout::Mono, 48000);
        sample
            .make_writable()
            .data_mut()
            .copy_from_slice(&100i16.to_ne_bytes().repeat(4));
        let mut out = Vec::new();
        volume.process(0, sample.into(), &mut out).unwrap();
        let produced = out.pop().map(|(_, u)| u).and_then(MediaUnit::into_audio).unwrap();
        assert_eq!(produced.buffer().as_s16().map(|s| s[0]), Some(100));
    }

    #[test]
    fn test_volume_applies_gain() {
        let opts = Options::new().with("gain_db", -6.0206);
        let mut volume = new_volume(&opts).unwrap();
        let mut sample = Sample::new(1, SampleFormat::S16, ChannelLayout::Mono, 48000);
        sample
            .make_writable()
            .data_mut()
            .copy_from_slice(&1000i16.to_ne_bytes());
        let mut out = Vec::new();
        volume.process(0, sample.into(), &mut out).unwrap();
        let produced = out.pop().map(|(_, u)| u).and_then(MediaUnit::into_audio).unwrap();
        let value = produced.buffer().as_s16().map(|s| s[0]).unwrap();
        assert!((495..=505).contains(&value), "got {value}");
    }

    #[test]
    fn test_scale_changes_dimensions() {
        let opts = Options::new().with("width", 160i64).with("height", 120i64);
        let mut scale = new_scale(&opts).unwrap();
        scale
            .configure(&[StreamFormat::Video(VideoFormat::new(
                PixelFormat::Yuv420p,
                320,
                240,
            ))])
            .unwrap();
        let mut out = Vec::new();
        let frame = Frame::new(320, 240, PixelFormat::Yuv420p);
        scale.process(0, frame.into(), &mut out).unwrap();
        let produced = out.pop().map(|(_, u)| u).and_then(MediaUnit::into_video).unwrap();
        assert_eq!((produced.width(), produced.height()), (160, 120));
    }

    #[test]
    fn test_split_shares_payload() {
        let mut split = new_split(&Options::new()).unwrap();
        let mut out = Vec::new();
        split.process(0, audio_unit(16, 48000), &mut out).unwrap();
        assert_eq!(out.len(), 2);
        let first = out[0].1.as_audio().unwrap();
        assert!(first.is_shared());
    }

    #[test]
    fn test_amix_sums_and_flushes_tail() {
        let mut amix = new_amix(&Options::new()).unwrap();
        amix.configure(&[mono_fmt(48000), mono_fmt(48000)]).unwrap();

        let mut out = Vec::new();
        amix.process(0, audio_unit(100, 48000), &mut out).unwrap();
        assert!(out.is_empty());
        amix.process(1, audio_unit(60, 48000), &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.as_audio().unwrap().num_samples(), 60);

        out.clear();
        amix.finish(&mut out).unwrap();
        assert_eq!(out[0].1.as_audio().unwrap().num_samples(), 40);
    }

    #[test]
    fn test_aresample_converts_rate() {
        let opts = Options::new().with("sample_rate", 48000i64);
        let mut ares = new_aresample(&opts).unwrap();
        ares.configure(&[mono_fmt(44100)]).unwrap();
        let mut out = Vec::new();
        ares.process(0, audio_unit(441, 44100), &mut out).unwrap();
        let produced = out.pop().map(|(_, u)| u).and_then(MediaUnit::into_audio).unwrap();
        assert_eq!(produced.sample_rate(), 48000);
        assert!((475..=485).contains(&produced.num_samples()));
    }

    #[test]
    fn test_source_requires_options() {
        assert!(new_video_source(&Options::new()).is_err());
        assert!(new_audio_source(&Options::new()).is_err());
    }
}
