//! Container boundary traits.
//!
//! Demuxing and muxing live outside this library; these traits are the
//! whole contract with them. A source hands out compressed units until
//! it signals end of stream with `None`; a sink consumes compressed
//! units and finalizes once.

use mediaflow_core::{Packet, Result};

/// Supplies compressed units from a container or stream.
pub trait PacketSource {
    /// Read the next unit; `None` means end of stream.
    fn next(&mut self) -> Result<Option<Packet>>;
}

/// Consumes compressed units for writing.
pub trait PacketSink {
    /// Write one unit.
    fn write(&mut self, packet: &Packet) -> Result<()>;

    /// Finalize the output. Called exactly once, after the last write.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
