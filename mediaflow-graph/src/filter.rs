//! The filter trait and kind registry.

use crate::builtins;
use crate::error::{GraphError, Result};
use mediaflow_core::format::StreamFormat;
use mediaflow_core::frame::PixelFormat;
use mediaflow_core::options::Options;
use mediaflow_core::sample::SampleFormat;
use mediaflow_core::unit::MediaUnit;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;

/// The set of formats a pad accepts, used during negotiation.
#[derive(Debug, Clone)]
pub enum FormatSet {
    /// Anything.
    Any,
    /// Video with one of the listed pixel formats; empty means any
    /// video.
    Video(Vec<PixelFormat>),
    /// Audio with one of the listed sample formats; empty means any
    /// audio.
    Audio(Vec<SampleFormat>),
}

impl FormatSet {
    /// Check whether a concrete format belongs to this set.
    pub fn accepts(&self, format: &StreamFormat) -> bool {
        match (self, format) {
            (Self::Any, _) => true,
            (Self::Video(list), StreamFormat::Video(v)) => {
                list.is_empty() || list.contains(&v.pixel)
            }
            (Self::Audio(list), StreamFormat::Audio(a)) => {
                list.is_empty() || list.contains(&a.sample)
            }
            _ => false,
        }
    }
}

/// A graph node implementation.
///
/// Sources declare zero input pads and sinks zero output pads; the
/// graph injects into sources and collects from sinks directly, so
/// their `process` is never called.
pub trait Filter: Send {
    /// The kind name this instance was created from.
    fn kind(&self) -> &'static str;

    /// Number of input pads.
    fn num_inputs(&self) -> usize;

    /// Number of output pads.
    fn num_outputs(&self) -> usize;

    /// Formats accepted on an input pad.
    fn input_formats(&self, pad: usize) -> FormatSet {
        let _ = pad;
        FormatSet::Any
    }

    /// Fix the concrete per-pad formats. Receives one format per input
    /// pad (in pad order) and returns one per output pad.
    fn configure(&mut self, inputs: &[StreamFormat]) -> Result<Vec<StreamFormat>>;

    /// Consume one unit arriving on `pad`, appending `(output_pad,
    /// unit)` pairs for anything produced.
    fn process(&mut self, pad: usize, unit: MediaUnit, out: &mut Vec<(usize, MediaUnit)>)
        -> Result<()>;

    /// Called once when every input pad has reached end of stream;
    /// append any remaining buffered output.
    fn finish(&mut self, out: &mut Vec<(usize, MediaUnit)>) -> Result<()> {
        let _ = out;
        Ok(())
    }
}

/// Constructs a filter instance from creation-time options.
pub type FilterFactory = fn(&Options) -> Result<Box<dyn Filter>>;

struct Registry {
    kinds: RwLock<HashMap<String, FilterFactory>>,
}

fn global() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = Registry {
            kinds: RwLock::new(HashMap::new()),
        };
        builtins::register_builtins(&mut registry.kinds.write());
        registry
    })
}

/// Register a filter kind. Fails on duplicate names.
pub fn register_filter(name: &str, factory: FilterFactory) -> Result<()> {
    let mut kinds = global().kinds.write();
    if kinds.contains_key(name) {
        return Err(mediaflow_core::Error::configuration(format!(
            "filter kind {name} already registered"
        ))
        .into());
    }
    kinds.insert(name.to_string(), factory);
    Ok(())
}

/// Instantiate a registered kind.
pub(crate) fn create(kind: &str, options: &Options) -> Result<Box<dyn Filter>> {
    let factory = global()
        .kinds
        .read()
        .get(kind)
        .copied()
        .ok_or_else(|| GraphError::KindNotFound(kind.to_string()))?;
    factory(options)
}
