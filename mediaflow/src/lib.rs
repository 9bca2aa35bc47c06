//! # Mediaflow
//!
//! A media transform pipeline core: decode, encode, and rewrite
//! sessions, a buffering adapter for chunk-size and clock
//! reconciliation, and a pull-scheduled filter graph, all speaking one
//! send/receive back-pressure protocol.
//!
//! The member crates carry the pieces:
//! - [`mediaflow_core`]: units, timestamps, formats, statuses, errors
//! - [`mediaflow_codec`]: transform sessions and the stage registry
//! - [`mediaflow_resample`]: FIFO, rate converter, chunk adapter
//! - [`mediaflow_graph`]: filter graphs
//!
//! This crate adds the container boundary traits ([`PacketSource`],
//! [`PacketSink`]) and a reference [`Driver`] that wires a full
//! decode → regroup → encode chain with the canonical drive loop.

pub mod driver;
pub mod io;
pub mod prelude;

pub use driver::{Driver, DriverError, DriverReport};
pub use io::{PacketSink, PacketSource};

pub use mediaflow_codec as codec;
pub use mediaflow_core as core;
pub use mediaflow_graph as graph;
pub use mediaflow_resample as resample;
