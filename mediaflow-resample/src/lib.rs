//! # Mediaflow Resample
//!
//! The buffering adapter between transform stages: absorbs chunk-size
//! mismatches and reconciles independent sample clocks.
//!
//! Three pieces:
//! - [`SampleFifo`]: an exact-accounting sample queue
//! - [`Converter`]: linear-interpolation rate conversion with drift
//!   compensation
//! - [`ChunkAdapter`]: fixed-size regrouping with timestamp propagation
//!
//! ## Example
//!
//! ```
//! use mediaflow_core::sample::{ChannelLayout, Sample, SampleFormat};
//! use mediaflow_resample::ChunkAdapter;
//!
//! let mut adapter = ChunkAdapter::new(
//!     SampleFormat::S16,
//!     ChannelLayout::Mono,
//!     48000,
//!     1024,
//! ).unwrap();
//!
//! for _ in 0..3 {
//!     let chunk = Sample::new(400, SampleFormat::S16, ChannelLayout::Mono, 48000);
//!     adapter.push(&chunk).unwrap();
//! }
//! assert_eq!(adapter.pull().map(|s| s.num_samples()), Some(1024));
//! assert_eq!(adapter.flush().map(|s| s.num_samples()), Some(176));
//! assert_eq!(adapter.available(), 0);
//! ```

pub mod chunker;
pub mod converter;
pub mod error;
pub mod fifo;

pub use chunker::ChunkAdapter;
pub use converter::{buffer_to_f32, Converter, ConverterConfig};
pub use error::{AdapterError, Result};
pub use fifo::SampleFifo;
