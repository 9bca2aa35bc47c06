//! Immutable stage descriptors.

use mediaflow_core::format::MediaType;
use std::fmt;

/// The kind of transform a stage performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Compressed units in, decoded units out.
    Decoder,
    /// Decoded units in, compressed units out.
    Encoder,
    /// Compressed units in, compressed units out.
    Rewriter,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoder => write!(f, "decoder"),
            Self::Encoder => write!(f, "encoder"),
            Self::Rewriter => write!(f, "rewriter"),
        }
    }
}

/// Immutable identity and capability record for a stage implementation.
///
/// Descriptors are `'static`: they identify an algorithm, not an
/// instance. Per-instance parameters arrive through the option set at
/// open time.
#[derive(Debug, Clone, Copy)]
pub struct StageDescriptor {
    /// Registry name.
    pub name: &'static str,
    /// Human-readable description.
    pub long_name: &'static str,
    /// What the stage does.
    pub kind: StageKind,
    /// Media category handled; `None` for media-agnostic rewriters.
    pub media_type: Option<MediaType>,
    /// Whether instances require fixed-size input chunks (configured via
    /// the `frame_size` option).
    pub fixed_frame_size: bool,
    /// Upper bound on the stage's internal reordering/lookahead window,
    /// in units.
    pub delay: usize,
}

impl fmt::Display for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
