//! Decoded video units.
//!
//! A [`Frame`] carries raw pixel planes with timing and format metadata.
//! Plane layout is fully determined by pixel format and dimensions; the
//! plane storage is reference counted with copy-on-write semantics so a
//! frame is either fully backed by its own buffers or a reference to
//! another frame's, never a mix.

use crate::packet::{SideData, SideDataType};
use crate::rational::Rational;
use crate::timestamp::{Duration, Timestamp};
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

/// Pixel format for video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp.
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp.
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp.
    Yuv444p,
    /// Y plane plus interleaved UV plane.
    Nv12,
    /// Packed RGB, 24bpp.
    Rgb24,
    /// Packed RGBA, 32bpp.
    Rgba,
    /// Grayscale, 8bpp.
    Gray8,
}

impl PixelFormat {
    /// Number of planes for this format.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 => 2,
            Self::Rgb24 | Self::Rgba | Self::Gray8 => 1,
        }
    }

    /// Look up a format by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "yuv420p" => Some(Self::Yuv420p),
            "yuv422p" => Some(Self::Yuv422p),
            "yuv444p" => Some(Self::Yuv444p),
            "nv12" => Some(Self::Nv12),
            "rgb24" => Some(Self::Rgb24),
            "rgba" => Some(Self::Rgba),
            "gray8" => Some(Self::Gray8),
            _ => None,
        }
    }

    /// Chroma subsampling factors (horizontal, vertical).
    pub fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Nv12 => (2, 2),
            Self::Yuv422p => (2, 1),
            _ => (1, 1),
        }
    }

    /// Bytes per pixel in a given plane's rows, before stride padding.
    fn row_bytes(&self, plane: usize, width: u32) -> usize {
        let (hsub, _) = self.chroma_subsampling();
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => {
                if plane == 0 {
                    width as usize
                } else {
                    width as usize / hsub as usize
                }
            }
            // Y rows and interleaved UV rows are both `width` bytes wide.
            Self::Nv12 => width as usize,
            Self::Rgb24 => width as usize * 3,
            Self::Rgba => width as usize * 4,
            Self::Gray8 => width as usize,
        }
    }

    /// Number of rows in a given plane.
    fn plane_rows(&self, plane: usize, height: u32) -> usize {
        let (_, vsub) = self.chroma_subsampling();
        if plane == 0 {
            height as usize
        } else {
            height as usize / vsub as usize
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv420p => write!(f, "yuv420p"),
            Self::Yuv422p => write!(f, "yuv422p"),
            Self::Yuv444p => write!(f, "yuv444p"),
            Self::Nv12 => write!(f, "nv12"),
            Self::Rgb24 => write!(f, "rgb24"),
            Self::Rgba => write!(f, "rgba"),
            Self::Gray8 => write!(f, "gray8"),
        }
    }
}

bitflags! {
    /// Flags describing frame properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFlags: u32 {
        /// This is a keyframe.
        const KEYFRAME = 0x0001;
        /// Frame is corrupted or incomplete.
        const CORRUPT = 0x0002;
        /// Frame exists for reference only and should not be presented.
        const DISCARD = 0x0004;
    }
}

/// Picture type of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PictureType {
    /// Not known or not applicable.
    #[default]
    Unknown,
    /// Intra-coded picture.
    I,
    /// Predicted picture.
    P,
    /// Bidirectionally predicted picture.
    B,
}

/// Storage for frame pixel data.
///
/// Strides are aligned to 32 bytes.
#[derive(Clone)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
    planes: Vec<PlaneData>,
}

#[derive(Clone)]
struct PlaneData {
    data: Vec<u8>,
    stride: usize,
}

impl FrameBuffer {
    /// Allocate a buffer for the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut planes = Vec::with_capacity(format.num_planes());
        for plane in 0..format.num_planes() {
            let row_bytes = format.row_bytes(plane, width);
            let rows = format.plane_rows(plane, height);
            let stride = (row_bytes + 31) & !31;
            planes.push(PlaneData {
                data: vec![0u8; stride * rows],
                stride,
            });
        }
        Self {
            width,
            height,
            format,
            planes,
        }
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Get a plane's data.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(|p| p.data.as_slice())
    }

    /// Get a mutable reference to a plane's data.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.planes.get_mut(index).map(|p| p.data.as_mut_slice())
    }

    /// Stride (bytes per row) of a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.planes.get(plane).map(|p| p.stride).unwrap_or(0)
    }

    /// Total size of all planes in bytes.
    pub fn total_size(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }

    /// Fill all planes with a value.
    pub fn fill(&mut self, value: u8) {
        for plane in &mut self.planes {
            plane.data.fill(value);
        }
    }

    /// Copy pixel data from another buffer of identical geometry.
    pub fn copy_from(&mut self, other: &FrameBuffer) {
        assert_eq!(self.width, other.width);
        assert_eq!(self.height, other.height);
        assert_eq!(self.format, other.format);
        for (dst, src) in self.planes.iter_mut().zip(other.planes.iter()) {
            dst.data.copy_from_slice(&src.data);
        }
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("planes", &self.planes.len())
            .finish()
    }
}

/// A decoded video frame.
///
/// Cloning shares the underlying plane storage; [`Frame::make_writable`]
/// privatizes it when needed.
#[derive(Clone)]
pub struct Frame {
    buffer: Arc<FrameBuffer>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Frame duration.
    pub duration: Duration,
    /// Frame flags.
    pub flags: FrameFlags,
    /// Picture type.
    pub picture_type: PictureType,
    /// Sample aspect ratio; zero when unknown.
    pub sample_aspect: Rational,
    side_data: Vec<SideData>,
    hw: Option<Arc<dyn crate::hw::MemoryProvider>>,
}

impl Frame {
    /// Allocate a frame with its own plane storage.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::from_buffer(FrameBuffer::new(width, height, format))
    }

    /// Wrap an existing buffer.
    pub fn from_buffer(buffer: FrameBuffer) -> Self {
        Self {
            buffer: Arc::new(buffer),
            pts: Timestamp::unknown(),
            duration: Duration::zero(),
            flags: FrameFlags::empty(),
            picture_type: PictureType::Unknown,
            sample_aspect: Rational::zero(),
            side_data: Vec::new(),
            hw: None,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.buffer.format
    }

    /// Check if this is a keyframe.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(FrameFlags::KEYFRAME)
    }

    /// Shared read access to the buffer.
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Check whether the plane storage is shared with another frame.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.buffer) > 1
    }

    /// Get exclusive, writable access to the plane storage, copying it
    /// first if it is shared.
    pub fn make_writable(&mut self) -> &mut FrameBuffer {
        Arc::make_mut(&mut self.buffer)
    }

    /// Get a plane's data.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.buffer.plane(index)
    }

    /// Stride of a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.buffer.stride(plane)
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

    /// Mark this frame as backed by external memory from `provider`.
    pub fn backed_by(mut self, provider: Arc<dyn crate::hw::MemoryProvider>) -> Self {
        self.hw = Some(provider);
        self
    }

    /// Check whether the frame is backed by an external memory provider.
    pub fn is_externally_backed(&self) -> bool {
        self.hw.is_some()
    }

    /// The external memory provider, if any.
    pub fn memory_provider(&self) -> Option<&Arc<dyn crate::hw::MemoryProvider>> {
        self.hw.as_ref()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format())
            .field("pts", &self.pts)
            .field("flags", &self.flags)
            .field("external", &self.is_externally_backed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_planes() {
        assert_eq!(PixelFormat::Yuv420p.num_planes(), 3);
        assert_eq!(PixelFormat::Nv12.num_planes(), 2);
        assert_eq!(PixelFormat::Rgb24.num_planes(), 1);
    }

    #[test]
    fn test_buffer_layout_determined_by_format() {
        let buffer = FrameBuffer::new(1920, 1080, PixelFormat::Yuv420p);
        assert_eq!(buffer.num_planes(), 3);
        assert_eq!(buffer.stride(0) % 32, 0);
        // Chroma planes cover a quarter of the pixels.
        assert_eq!(buffer.plane(1).map(<[u8]>::len), buffer.plane(2).map(<[u8]>::len));
        assert!(buffer.plane(3).is_none());
    }

    #[test]
    fn test_clone_shares_then_copy_on_write() {
        let mut a = Frame::new(64, 64, PixelFormat::Gray8);
        let b = a.clone();
        assert!(a.is_shared() && b.is_shared());

        if let Some(plane) = a.make_writable().plane_mut(0) {
            plane[0] = 0xAB;
        }
        assert!(!a.is_shared());
        assert_eq!(a.plane(0).map(|p| p[0]), Some(0xAB));
        assert_eq!(b.plane(0).map(|p| p[0]), Some(0));
    }

    #[test]
    fn test_shared_buffer_released_once() {
        use std::thread;

        let frame = Frame::new(32, 32, PixelFormat::Gray8);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = frame.clone();
                thread::spawn(move || {
                    // Clone and drop more references on this thread.
                    for _ in 0..100 {
                        let g = f.clone();
                        drop(g);
                    }
                    f.width()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().ok(), Some(32));
        }
        // All sibling references are gone again.
        assert!(!frame.is_shared());
    }

    #[test]
    fn test_rgba_row_bytes() {
        let buffer = FrameBuffer::new(10, 2, PixelFormat::Rgba);
        assert!(buffer.stride(0) >= 40);
        assert_eq!(buffer.num_planes(), 1);
    }
}
