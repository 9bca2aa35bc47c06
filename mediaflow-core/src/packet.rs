//! Compressed media units.
//!
//! A [`Packet`] carries encoded data before decoding or after encoding.
//! The payload is reference counted: cloning a packet produces a second
//! handle onto the same bytes, and [`Packet::make_writable`] privatizes
//! the payload only when it is actually shared.

use crate::timestamp::{Duration, TimeBase, Timestamp};
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Flags describing packet properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u32 {
        /// This packet contains a keyframe.
        const KEYFRAME = 0x0001;
        /// Packet data is corrupted.
        const CORRUPT = 0x0002;
        /// Packet should be discarded after demuxing.
        const DISCARD = 0x0004;
        /// Packet comes from a trusted source.
        const TRUSTED = 0x0008;
    }
}

/// Types of side data that can be attached to units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SideDataType {
    /// Codec parameter sets.
    ParameterSets,
    /// Display matrix (rotation/flip).
    DisplayMatrix,
    /// Samples to skip at stream edges (gapless playback).
    SkipSamples,
    /// Application-defined side data.
    Custom(u32),
}

/// A typed blob of side data attached to a unit.
#[derive(Debug, Clone)]
pub struct SideData {
    /// Type of side data.
    pub data_type: SideDataType,
    /// The side data payload.
    pub data: Vec<u8>,
}

impl SideData {
    /// Create new side data.
    pub fn new(data_type: SideDataType, data: Vec<u8>) -> Self {
        Self { data_type, data }
    }
}

/// An encoded media packet.
///
/// Cloning is cheap: the payload is shared until a handle asks for
/// writable access.
#[derive(Clone)]
pub struct Packet {
    /// Payload bytes; `None` for packets that carry only signaling.
    data: Option<Arc<Vec<u8>>>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Decode timestamp.
    pub dts: Timestamp,
    /// Duration of the packet.
    pub duration: Duration,
    /// Stream this packet belongs to.
    pub stream_index: u32,
    /// Byte offset in the input, when known.
    pub pos: Option<u64>,
    /// Packet flags.
    pub flags: PacketFlags,
    /// Typed side data, at most one entry per type.
    side_data: Vec<SideData>,
}

impl Packet {
    /// Create a new packet owning the given data.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Some(Arc::new(data)),
            pts: Timestamp::unknown(),
            dts: Timestamp::unknown(),
            duration: Duration::zero(),
            stream_index: 0,
            pos: None,
            flags: PacketFlags::empty(),
            side_data: Vec::new(),
        }
    }

    /// Create a packet with no payload.
    pub fn empty() -> Self {
        Self {
            data: None,
            pts: Timestamp::unknown(),
            dts: Timestamp::unknown(),
            duration: Duration::zero(),
            stream_index: 0,
            pos: None,
            flags: PacketFlags::empty(),
            side_data: Vec::new(),
        }
    }

    /// Get the payload. Absent payload reads as empty.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether a payload is present at all.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.as_deref().map(Vec::len).unwrap_or(0)
    }

    /// Check if the payload is empty or absent.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Check whether the payload is shared with another handle.
    pub fn is_shared(&self) -> bool {
        self.data
            .as_ref()
            .map(|d| Arc::strong_count(d) > 1)
            .unwrap_or(false)
    }

    /// Get exclusive, writable access to the payload.
    ///
    /// If the payload is shared with other handles it is copied first,
    /// so writes never become visible through sibling references.
    pub fn make_writable(&mut self) -> &mut Vec<u8> {
        let arc = self.data.get_or_insert_with(|| Arc::new(Vec::new()));
        Arc::make_mut(arc)
    }

    /// Drop the payload, keeping metadata.
    pub fn clear_data(&mut self) {
        self.data = None;
    }

    /// Check if this is a keyframe packet.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEYFRAME)
    }

    /// Set or clear the keyframe flag.
    pub fn set_keyframe(&mut self, keyframe: bool) {
        self.flags.set(PacketFlags::KEYFRAME, keyframe);
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

    /// Rescale all timing fields to a new time base.
    pub fn rescale(&mut self, target: TimeBase) {
        self.pts = self.pts.rescale(target);
        self.dts = self.dts.rescale(target);
        self.duration = self.duration.rescale(target);
    }

    /// Builder: set presentation and decode timestamps.
    pub fn with_timestamps(mut self, pts: Timestamp, dts: Timestamp) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /// Builder: set the stream index.
    pub fn with_stream_index(mut self, index: u32) -> Self {
        self.stream_index = index;
        self
    }

    /// Builder: set the packet flags.
    pub fn with_flags(mut self, flags: PacketFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("size", &self.size())
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("stream_index", &self.stream_index)
            .field("flags", &self.flags)
            .finish()
    }
}
