//! Reference drive loop.
//!
//! Wires a packet source through a decode session, an optional chunk
//! adapter, and an encode session into a packet sink, honoring the
//! protocol exactly: outputs are drained in a loop after every send,
//! `Busy` is answered by draining the other side and resending the
//! same unit, and end of stream cascades one-way through every stage
//! before anything is closed.

use crate::io::{PacketSink, PacketSource};
use mediaflow_codec::{DecodeSession, EncodeSession};
use mediaflow_core::{Error, MediaUnit, Packet, RecvStatus, SendStatus};
use mediaflow_resample::{AdapterError, ChunkAdapter};
use thiserror::Error as ThisError;
use tracing::{debug, info};

/// Errors surfaced by the driver.
#[derive(ThisError, Debug)]
pub enum DriverError {
    /// Session or unit error.
    #[error(transparent)]
    Core(#[from] Error),

    /// Buffering adapter error.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Counters describing one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    /// Compressed units read from the source.
    pub packets_read: u64,
    /// Decoded units produced by the decode session.
    pub units_decoded: u64,
    /// Compressed units written to the sink.
    pub packets_written: u64,
}

/// A synchronous decode → regroup → encode driver.
pub struct Driver {
    decoder: DecodeSession,
    encoder: EncodeSession,
    adapter: Option<ChunkAdapter>,
    report: DriverReport,
}

impl Driver {
    /// Create a driver over an opened decode and encode session.
    pub fn new(decoder: DecodeSession, encoder: EncodeSession) -> Self {
        Self {
            decoder,
            encoder,
            adapter: None,
            report: DriverReport::default(),
        }
    }

    /// Stage a chunk adapter between decode and encode, for encoders
    /// that require fixed-size input.
    #[must_use]
    pub fn with_chunking(mut self, adapter: ChunkAdapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Run the pipeline to completion: read the source dry, cascade
    /// end of stream through every stage, finalize the sink, close the
    /// sessions.
    pub fn run(
        &mut self,
        source: &mut dyn PacketSource,
        sink: &mut dyn PacketSink,
    ) -> Result<DriverReport> {
        while let Some(packet) = source.next()? {
            self.report.packets_read += 1;
            self.feed_decoder(packet, sink)?;
        }
        debug!(packets = self.report.packets_read, "source exhausted");

        // One-way end-of-stream cascade: decoder drains fully into the
        // downstream stages before the encoder learns about it.
        self.decoder.send_eof()?;
        self.pump_decoder(sink)?;

        if let Some(adapter) = self.adapter.as_mut() {
            if let Some(tail) = adapter.flush() {
                Self::feed_encoder(&mut self.encoder, &mut self.report, tail.into(), sink)?;
            }
        }

        self.encoder.send_eof()?;
        self.pump_encoder(sink)?;
        sink.finish()?;

        self.decoder.close();
        self.encoder.close();
        info!(
            read = self.report.packets_read,
            decoded = self.report.units_decoded,
            written = self.report.packets_written,
            "pipeline finished"
        );
        Ok(self.report)
    }

    /// Send one packet, draining the decoder whenever it pushes back.
    fn feed_decoder(&mut self, packet: Packet, sink: &mut dyn PacketSink) -> Result<()> {
        let mut pending = packet;
        loop {
            match self.decoder.send(pending)? {
                SendStatus::Accepted => break,
                SendStatus::Busy(rejected) => {
                    pending = rejected;
                    self.pump_decoder(sink)?;
                }
                SendStatus::Ended => {
                    return Err(Error::InvalidState("decoder ended mid-stream").into())
                }
            }
        }
        self.pump_decoder(sink)
    }

    /// Drain the decoder until it wants input or ends, routing every
    /// unit downstream.
    fn pump_decoder(&mut self, sink: &mut dyn PacketSink) -> Result<()> {
        loop {
            match self.decoder.receive()? {
                RecvStatus::Produced(unit) => {
                    self.report.units_decoded += 1;
                    self.route_unit(unit, sink)?;
                }
                RecvStatus::NeedsInput | RecvStatus::Ended => return Ok(()),
            }
        }
    }

    /// Pass a decoded unit through the chunk adapter when staged, then
    /// into the encoder.
    fn route_unit(&mut self, unit: MediaUnit, sink: &mut dyn PacketSink) -> Result<()> {
        match (self.adapter.as_mut(), unit) {
            (Some(adapter), MediaUnit::Audio(sample)) => {
                adapter.push(&sample)?;
                while let Some(chunk) = adapter.pull() {
                    Self::feed_encoder(&mut self.encoder, &mut self.report, chunk.into(), sink)?;
                }
                Ok(())
            }
            (_, unit) => Self::feed_encoder(&mut self.encoder, &mut self.report, unit, sink),
        }
    }

    /// Send one unit into the encoder, draining on push-back, then
    /// drain whatever came out.
    fn feed_encoder(
        encoder: &mut EncodeSession,
        report: &mut DriverReport,
        unit: MediaUnit,
        sink: &mut dyn PacketSink,
    ) -> Result<()> {
        let mut pending = unit;
        loop {
            match encoder.send(pending)? {
                SendStatus::Accepted => break,
                SendStatus::Busy(rejected) => {
                    pending = rejected;
                    Self::drain_encoder(encoder, report, sink)?;
                }
                SendStatus::Ended => {
                    return Err(Error::InvalidState("encoder ended mid-stream").into())
                }
            }
        }
        Self::drain_encoder(encoder, report, sink)
    }

    fn drain_encoder(
        encoder: &mut EncodeSession,
        report: &mut DriverReport,
        sink: &mut dyn PacketSink,
    ) -> Result<()> {
        loop {
            match encoder.receive()? {
                RecvStatus::Produced(packet) => {
                    sink.write(&packet)?;
                    report.packets_written += 1;
                }
                RecvStatus::NeedsInput | RecvStatus::Ended => return Ok(()),
            }
        }
    }

    fn pump_encoder(&mut self, sink: &mut dyn PacketSink) -> Result<()> {
        Self::drain_encoder(&mut self.encoder, &mut self.report, sink)
    }
}
