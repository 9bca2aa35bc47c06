//! Commonly used types, importable in one line.

pub use crate::driver::{Driver, DriverReport};
pub use crate::io::{PacketSink, PacketSource};

pub use mediaflow_codec::{
    open_decoder, open_encoder, open_rewriter, DecodeSession, EncodeSession, RewriteSession,
    Session, StageDescriptor, StageKind, Transform,
};
pub use mediaflow_core::{
    AudioFormat, ChannelLayout, Duration, Error, Frame, MediaType, MediaUnit, Options, Packet,
    PacketFlags, PixelFormat, Rational, RecvStatus, Result, Sample, SampleFormat, SendStatus,
    StreamFormat, TimeBase, Timestamp, VideoFormat,
};
pub use mediaflow_graph::{Graph, GraphError, GraphState};
pub use mediaflow_resample::{ChunkAdapter, Converter, ConverterConfig, SampleFifo};
