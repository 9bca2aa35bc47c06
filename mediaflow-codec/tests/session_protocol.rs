//! Session protocol integration tests.
//!
//! Exercises the send/receive state machine end to end: drain
//! completeness, back-pressure liveness, end-of-stream discipline, and
//! lifecycle rules.

use mediaflow_codec::{open_decoder, open_encoder, open_rewriter, RecvStatus, SendStatus};
use mediaflow_core::sample::{ChannelLayout, Sample, SampleFormat};
use mediaflow_core::timestamp::TimeBase;
use mediaflow_core::{Error, MediaUnit, Options, Packet, Timestamp};

fn audio_opts() -> Options {
    Options::new().with("sample_rate", 48000i64).with("channels", 2i64)
}

fn stereo_packet(frames: usize, pts: i64) -> Packet {
    let mut packet = Packet::new(vec![0u8; frames * 4]);
    packet.pts = Timestamp::new(pts, TimeBase::for_sample_rate(48000));
    packet
}

// =============================================================================
// Drain Completeness
// =============================================================================

#[test]
fn delay_rewriter_drains_completely() {
    let opts = Options::new().with("frames", 3i64);
    let mut session = open_rewriter("delay", &opts).unwrap();

    for i in 0..10u8 {
        assert!(session.send(Packet::new(vec![i])).unwrap().is_accepted());
        // Drain whatever is ready after each send.
        while let RecvStatus::Produced(_) = session.receive().unwrap() {}
    }

    session.send_eof().unwrap();
    let mut tail = Vec::new();
    loop {
        match session.receive().unwrap() {
            RecvStatus::Produced(packet) => tail.push(packet.data()[0]),
            RecvStatus::NeedsInput => panic!("NeedsInput after end of stream"),
            RecvStatus::Ended => break,
        }
    }
    // The 3-packet window comes out at the end, in order.
    assert_eq!(tail, vec![7, 8, 9]);
    assert!(session.receive().unwrap().is_ended());
}

#[test]
fn total_output_is_bounded() {
    let mut session = open_rewriter("null", &Options::new()).unwrap();
    let mut produced = 0usize;
    for i in 0..100u8 {
        session.send(Packet::new(vec![i])).unwrap();
        while let RecvStatus::Produced(_) = session.receive().unwrap() {
            produced += 1;
        }
    }
    session.send_eof().unwrap();
    while let RecvStatus::Produced(_) = session.receive().unwrap() {
        produced += 1;
    }
    assert_eq!(produced, 100);
}

// =============================================================================
// Back-Pressure Liveness
// =============================================================================

#[test]
fn busy_unit_is_accepted_after_draining() {
    let opts = Options::new().with("max_pending", 1i64);
    let mut session = open_rewriter("null", &opts).unwrap();

    assert!(session.send(Packet::new(vec![1])).unwrap().is_accepted());

    // The pending queue is full; the unit comes back.
    let rejected = match session.send(Packet::new(vec![2])).unwrap() {
        SendStatus::Busy(packet) => packet,
        other => panic!("expected Busy, got {other:?}"),
    };

    // Draining one output unblocks the resend of the same unit.
    assert!(matches!(session.receive().unwrap(), RecvStatus::Produced(_)));
    assert!(session.send(rejected).unwrap().is_accepted());
}

#[test]
fn drive_loop_with_tiny_queue_loses_nothing() {
    let opts = Options::new().with("max_pending", 1i64).with("frames", 2i64);
    let mut session = open_rewriter("delay", &opts).unwrap();
    let mut received = Vec::new();

    for i in 0..20u8 {
        let mut packet = Packet::new(vec![i]);
        loop {
            match session.send(packet).unwrap() {
                SendStatus::Accepted => break,
                SendStatus::Busy(rejected) => {
                    packet = rejected;
                    while let RecvStatus::Produced(p) = session.receive().unwrap() {
                        received.push(p.data()[0]);
                    }
                }
                SendStatus::Ended => unreachable!(),
            }
        }
    }
    session.send_eof().unwrap();
    loop {
        match session.receive().unwrap() {
            RecvStatus::Produced(p) => received.push(p.data()[0]),
            RecvStatus::NeedsInput => unreachable!(),
            RecvStatus::Ended => break,
        }
    }

    assert_eq!(received, (0..20u8).collect::<Vec<_>>());
}

// =============================================================================
// End-Of-Stream Discipline
// =============================================================================

#[test]
fn send_after_eof_is_loud() {
    let mut session = open_rewriter("null", &Options::new()).unwrap();
    session.send_eof().unwrap();
    let err = session.send(Packet::new(vec![0])).unwrap_err();
    assert!(err.is_protocol_violation());
}

#[test]
fn repeated_eof_marker_reports_ended() {
    let mut session = open_rewriter("null", &Options::new()).unwrap();
    assert!(matches!(session.send_eof().unwrap(), SendStatus::Accepted));
    assert!(matches!(session.send_eof().unwrap(), SendStatus::Ended));
}

#[test]
fn flush_reopens_a_drained_session() {
    let mut session = open_rewriter("null", &Options::new()).unwrap();
    session.send(Packet::new(vec![1])).unwrap();
    session.send_eof().unwrap();
    while !session.receive().unwrap().is_ended() {}

    session.flush().unwrap();
    assert!(session.send(Packet::new(vec![2])).unwrap().is_accepted());
}

// =============================================================================
// Decode / Encode Sessions
// =============================================================================

#[test]
fn pcm_decode_session_produces_audio_units() {
    let mut session = open_decoder("pcm_s16", &audio_opts()).unwrap();
    session.send(stereo_packet(100, 0)).unwrap();

    let unit = match session.receive().unwrap() {
        RecvStatus::Produced(unit) => unit,
        other => panic!("expected a unit, got {other:?}"),
    };
    let sample = unit.into_audio().unwrap();
    assert_eq!(sample.num_samples(), 100);
    assert_eq!(sample.sample_rate(), 48000);
    assert!(matches!(session.receive().unwrap(), RecvStatus::NeedsInput));
}

#[test]
fn encoder_rejects_missized_chunks_but_allows_final_short_one() {
    let opts = audio_opts().with("frame_size", 1024i64).with("channels", 1i64);
    let mut session = open_encoder("pcm_s16", &opts).unwrap();

    let chunk = |n: usize| -> MediaUnit {
        Sample::new(n, SampleFormat::S16, ChannelLayout::Mono, 48000).into()
    };

    assert!(session.send(chunk(1024)).unwrap().is_accepted());
    // A short chunk is legal exactly once, right before end of stream.
    assert!(session.send(chunk(176)).unwrap().is_accepted());
    assert!(matches!(
        session.send(chunk(1024)),
        Err(Error::Configuration(_))
    ));

    // The session itself is still usable: the error was caller-fixable.
    session.send_eof().unwrap();
    let mut packets = 0;
    while let RecvStatus::Produced(_) = session.receive().unwrap() {
        packets += 1;
    }
    assert_eq!(packets, 2);
}

#[test]
fn decode_then_encode_round_trips_payload() {
    let mut decoder = open_decoder("pcm_s16", &audio_opts()).unwrap();
    let mut encoder = open_encoder("pcm_s16", &audio_opts()).unwrap();

    let payload: Vec<u8> = (0..200u8).collect();
    decoder.send(Packet::new(payload.clone())).unwrap();
    decoder.send_eof().unwrap();

    let mut round_tripped = Vec::new();
    loop {
        match decoder.receive().unwrap() {
            RecvStatus::Produced(unit) => {
                encoder.send(unit).unwrap();
                while let RecvStatus::Produced(packet) = encoder.receive().unwrap() {
                    round_tripped.extend_from_slice(packet.data());
                }
            }
            RecvStatus::NeedsInput => unreachable!(),
            RecvStatus::Ended => break,
        }
    }
    encoder.send_eof().unwrap();
    while let RecvStatus::Produced(packet) = encoder.receive().unwrap() {
        round_tripped.extend_from_slice(packet.data());
    }

    assert_eq!(round_tripped, payload);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn close_twice_is_a_no_op() {
    let mut session = open_rewriter("null", &Options::new()).unwrap();
    session.close();
    session.close();
    assert!(!session.is_open());
}

#[test]
fn use_after_close_is_invalid_state() {
    let mut session = open_decoder("pcm_s16", &audio_opts()).unwrap();
    session.close();
    assert!(matches!(
        session.send(stereo_packet(1, 0)),
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(session.receive(), Err(Error::InvalidState(_))));
    assert!(matches!(session.flush(), Err(Error::InvalidState(_))));
}

#[test]
fn open_with_bad_options_fails_configuration() {
    let err = open_decoder("pcm_s16", &Options::new()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = open_decoder("pcm_s16", &Options::new().with("sample_rate", -1i64)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}
