//! Buffering adapter integration tests.
//!
//! The conservation property is checked with proptest over arbitrary
//! write/pop/drain sequences; the rest covers the adapter pieces
//! working together.

use mediaflow_core::sample::{ChannelLayout, Sample, SampleBuffer, SampleFormat};
use mediaflow_core::timestamp::{TimeBase, Timestamp};
use mediaflow_resample::{ChunkAdapter, Converter, ConverterConfig, SampleFifo};
use proptest::prelude::*;

// =============================================================================
// FIFO Conservation
// =============================================================================

#[derive(Debug, Clone)]
enum FifoOp {
    Write(usize),
    Pop(usize),
    Drain(usize),
}

fn fifo_op() -> impl Strategy<Value = FifoOp> {
    prop_oneof![
        (1usize..512).prop_map(FifoOp::Write),
        (0usize..512).prop_map(FifoOp::Pop),
        (0usize..512).prop_map(FifoOp::Drain),
    ]
}

proptest! {
    /// available() always equals written - read - drained.
    #[test]
    fn fifo_conserves_samples(ops in proptest::collection::vec(fifo_op(), 1..64)) {
        let mut fifo = SampleFifo::new(SampleFormat::S16, ChannelLayout::Stereo, 48000).unwrap();
        let mut written = 0usize;
        let mut removed = 0usize;

        for op in ops {
            match op {
                FifoOp::Write(n) => {
                    let buf = SampleBuffer::new(n, SampleFormat::S16, ChannelLayout::Stereo, 48000);
                    written += fifo.write(&buf).unwrap();
                }
                FifoOp::Pop(n) => {
                    removed += fifo.pop(n).num_samples;
                }
                FifoOp::Drain(n) => {
                    removed += fifo.drain(n);
                }
            }
            prop_assert_eq!(fifo.available(), written - removed);
        }
    }

    /// Payload bytes come out exactly as they went in, in order.
    #[test]
    fn fifo_preserves_byte_order(chunks in proptest::collection::vec(1usize..64, 1..16)) {
        let mut fifo = SampleFifo::new(SampleFormat::U8, ChannelLayout::Mono, 8000).unwrap();
        let mut expected = Vec::new();
        let mut counter = 0u8;

        for n in chunks {
            let mut buf = SampleBuffer::new(n, SampleFormat::U8, ChannelLayout::Mono, 8000);
            for byte in buf.data_mut() {
                *byte = counter;
                expected.push(counter);
                counter = counter.wrapping_add(1);
            }
            fifo.write(&buf).unwrap();
        }

        let mut actual = Vec::new();
        loop {
            let out = fifo.pop(7);
            if out.num_samples == 0 {
                break;
            }
            actual.extend_from_slice(out.data());
        }
        prop_assert_eq!(actual, expected);
    }
}

// =============================================================================
// Chunk Adapter + Converter
// =============================================================================

#[test]
fn chunk_adapter_end_to_end_accounting() {
    let mut adapter =
        ChunkAdapter::new(SampleFormat::S16, ChannelLayout::Stereo, 48000, 1024).unwrap();

    let mut pushed = 0usize;
    for i in 0..7 {
        let mut chunk = Sample::new(300, SampleFormat::S16, ChannelLayout::Stereo, 48000);
        chunk.pts = Timestamp::new((i * 300) as i64, TimeBase::for_sample_rate(48000));
        adapter.push(&chunk).unwrap();
        pushed += 300;
    }

    let mut pulled = 0usize;
    while let Some(chunk) = adapter.pull() {
        assert_eq!(chunk.num_samples(), 1024);
        pulled += chunk.num_samples();
    }
    if let Some(tail) = adapter.flush() {
        assert!(tail.num_samples() < 1024);
        pulled += tail.num_samples();
    }

    assert_eq!(pushed, pulled);
    assert_eq!(adapter.available(), 0);
}

#[test]
fn converter_feeding_chunker_keeps_timestamps_monotonic() {
    let mut converter =
        Converter::new(ConverterConfig::new(44100, 48000).with_channels(1)).unwrap();
    let mut adapter =
        ChunkAdapter::new(SampleFormat::F32, ChannelLayout::Mono, 48000, 512).unwrap();

    let mut produced_pts = Vec::new();
    for i in 0..10 {
        let mut input = SampleBuffer::new(441, SampleFormat::S16, ChannelLayout::Mono, 44100);
        input.silence();
        let converted = converter.process_buffer(&input).unwrap();
        let mut sample = Sample::from_buffer(converted);
        // 441 samples per chunk at 44.1 kHz is 480 ticks at 48 kHz.
        sample.pts = Timestamp::new(i * 480, TimeBase::for_sample_rate(48000));
        adapter.push(&sample).unwrap();

        while let Some(chunk) = adapter.pull() {
            produced_pts.push(chunk.pts.value);
        }
    }

    assert!(!produced_pts.is_empty());
    for pair in produced_pts.windows(2) {
        assert_eq!(pair[1] - pair[0], 512);
    }
}

#[test]
fn converter_delay_tracks_buffered_input() {
    let mut converter =
        Converter::new(ConverterConfig::new(48000, 48000).with_channels(1)).unwrap();
    assert_eq!(converter.delay(), 0);

    let input = vec![0.0f32; 480];
    let mut tiny_out = vec![0.0f32; 80];
    let written = converter.convert(&mut tiny_out, &input).unwrap();
    assert_eq!(written, 80);
    assert_eq!(converter.delay(), 400);

    converter.reset();
    assert_eq!(converter.delay(), 0);
}
