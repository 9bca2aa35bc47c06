//! Buffering adapter error types.

use mediaflow_core::sample::SampleFormat;
use thiserror::Error;

/// Errors from the FIFO, converter, and chunk adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Sample rate outside the supported range.
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The offending rate.
        rate: u32,
    },

    /// Channel count outside the supported range.
    #[error("Invalid channel count: {count}")]
    InvalidChannelCount {
        /// The offending count.
        count: usize,
    },

    /// Chunk size of zero or otherwise unusable.
    #[error("Invalid chunk size: {size}")]
    InvalidChunkSize {
        /// The offending size.
        size: usize,
    },

    /// Sample format differs from what the adapter was created with.
    #[error("Sample format mismatch: expected {expected}, got {found}")]
    FormatMismatch {
        /// Configured format.
        expected: SampleFormat,
        /// Format of the offending buffer.
        found: SampleFormat,
    },

    /// Channel count differs from what the adapter was created with.
    #[error("Channel mismatch: expected {expected}, got {found}")]
    ChannelMismatch {
        /// Configured channels.
        expected: usize,
        /// Channels of the offending buffer.
        found: usize,
    },

    /// Sample rate differs from what the adapter was created with.
    #[error("Sample rate mismatch: expected {expected}, got {found}")]
    RateMismatch {
        /// Configured rate.
        expected: u32,
        /// Rate of the offending buffer.
        found: u32,
    },

    /// Interleaved buffer length not divisible by the channel count.
    #[error("Buffer of {actual} values is not a whole number of {channels}-channel frames")]
    BufferSizeMismatch {
        /// Number of values supplied.
        actual: usize,
        /// Configured channels.
        channels: usize,
    },

    /// Compensation parameters that would stall or reverse conversion.
    #[error("Invalid compensation: delta {delta} over {distance} samples")]
    InvalidCompensation {
        /// Requested sample delta.
        delta: i32,
        /// Requested distance.
        distance: usize,
    },

    /// Shared core error.
    #[error(transparent)]
    Core(#[from] mediaflow_core::Error),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
