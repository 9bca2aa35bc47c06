//! # Mediaflow Core
//!
//! Core types for the mediaflow transform pipeline.
//!
//! This crate provides the building blocks shared by every transform stage:
//! - Error taxonomy and result types
//! - Exact rational arithmetic for time bases
//! - Timestamp and duration handling
//! - Compressed units ([`Packet`]) and decoded units ([`Frame`], [`Sample`])
//! - The uniform send/receive status vocabulary
//! - The hardware memory provider boundary
//! - String-keyed option stores consumed by stage construction

pub mod error;
pub mod format;
pub mod frame;
pub mod hw;
pub mod options;
pub mod packet;
pub mod rational;
pub mod sample;
pub mod status;
pub mod timestamp;
pub mod unit;

pub use error::{Error, Result};
pub use format::{AudioFormat, MediaType, StreamFormat, VideoFormat};
pub use frame::{Frame, FrameBuffer, FrameFlags, PictureType, PixelFormat};
pub use hw::MemoryProvider;
pub use options::{OptionValue, Options};
pub use packet::{Packet, PacketFlags, SideData, SideDataType};
pub use rational::{Rational, Rounding};
pub use sample::{ChannelLayout, Sample, SampleBuffer, SampleFormat};
pub use status::{RecvStatus, SendStatus};
pub use timestamp::{Duration, TimeBase, Timestamp};
pub use unit::MediaUnit;
