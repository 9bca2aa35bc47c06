//! Hardware memory provider boundary.
//!
//! This core treats device memory as opaque: a provider can allocate
//! frames backed by external memory and move pixel data across the
//! software/hardware boundary. Everything else about device and pool
//! management lives outside this crate.

use crate::error::{Error, Result};
use crate::format::VideoFormat;
use crate::frame::Frame;

/// Allocates externally-backed frames and transfers data to and from
/// them.
pub trait MemoryProvider: Send + Sync {
    /// Provider name, for diagnostics.
    fn name(&self) -> &str;

    /// Allocate a frame backed by this provider's memory.
    fn alloc(&self, format: &VideoFormat) -> Result<Frame>;

    /// Transfer pixel data between an externally-backed frame and a
    /// software frame (either direction).
    fn transfer(&self, dst: &mut Frame, src: &Frame) -> Result<()>;
}

/// Transfer pixel data from `src` into `dst`.
///
/// Externally-backed endpoints delegate to their provider; two software
/// frames take the plain plane-copy path. Geometry must match.
pub fn transfer(dst: &mut Frame, src: &Frame) -> Result<()> {
    if let Some(provider) = src.memory_provider().or(dst.memory_provider()).cloned() {
        return provider.transfer(dst, src);
    }
    if dst.width() != src.width() || dst.height() != src.height() || dst.format() != src.format() {
        return Err(Error::configuration(format!(
            "transfer geometry mismatch: {}x{} {} vs {}x{} {}",
            dst.width(),
            dst.height(),
            dst.format(),
            src.width(),
            src.height(),
            src.format()
        )));
    }
    dst.make_writable().copy_from(src.buffer());
    Ok(())
}
