//! Process-wide stage registry.
//!
//! Maps a stage name and kind to an immutable descriptor plus a factory
//! for its backend. Built-in stages are registered on first access;
//! applications may register additional stages at any time.

use crate::descriptor::{StageDescriptor, StageKind};
use crate::session::{
    BoxedTransform, DecodeSession, EncodeSession, RewriteSession, Session,
};
use crate::stages;
use mediaflow_core::options::Options;
use mediaflow_core::unit::MediaUnit;
use mediaflow_core::{Error, Packet, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Constructs a decoder backend from an option set.
pub type DecoderFactory = fn(&Options) -> Result<BoxedTransform<Packet, MediaUnit>>;

/// Constructs an encoder backend from an option set.
pub type EncoderFactory = fn(&Options) -> Result<BoxedTransform<MediaUnit, Packet>>;

/// Constructs a rewriter backend from an option set.
pub type RewriterFactory = fn(&Options) -> Result<BoxedTransform<Packet, Packet>>;

/// A stage backend factory, tagged by kind.
#[derive(Clone, Copy)]
pub enum Factory {
    /// Decoder factory.
    Decoder(DecoderFactory),
    /// Encoder factory.
    Encoder(EncoderFactory),
    /// Rewriter factory.
    Rewriter(RewriterFactory),
}

impl Factory {
    fn kind(&self) -> StageKind {
        match self {
            Self::Decoder(_) => StageKind::Decoder,
            Self::Encoder(_) => StageKind::Encoder,
            Self::Rewriter(_) => StageKind::Rewriter,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Entry {
    descriptor: &'static StageDescriptor,
    factory: Factory,
}

pub(crate) type EntryMap = HashMap<(String, StageKind), Entry>;

/// Insert without duplicate checks; used for the built-in set.
pub(crate) fn insert(map: &mut EntryMap, descriptor: &'static StageDescriptor, factory: Factory) {
    map.insert(
        (descriptor.name.to_string(), descriptor.kind),
        Entry {
            descriptor,
            factory,
        },
    );
}

#[derive(Default)]
struct Registry {
    entries: RwLock<EntryMap>,
}

fn global() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = Registry::default();
        stages::register_builtins(&mut registry.entries.write());
        registry
    })
}

/// Register a stage. Fails if a stage of the same name and kind exists,
/// or if the factory kind does not match the descriptor.
pub fn register(descriptor: &'static StageDescriptor, factory: Factory) -> Result<()> {
    if factory.kind() != descriptor.kind {
        return Err(Error::configuration(format!(
            "factory kind {} does not match descriptor {}",
            factory.kind(),
            descriptor
        )));
    }
    let mut entries = global().entries.write();
    let key = (descriptor.name.to_string(), descriptor.kind);
    if entries.contains_key(&key) {
        return Err(Error::configuration(format!(
            "stage {} already registered",
            descriptor
        )));
    }
    entries.insert(
        key,
        Entry {
            descriptor,
            factory,
        },
    );
    Ok(())
}

/// Look up a descriptor by name and kind.
pub fn find(name: &str, kind: StageKind) -> Option<&'static StageDescriptor> {
    global()
        .entries
        .read()
        .get(&(name.to_string(), kind))
        .map(|e| e.descriptor)
}

fn lookup(name: &str, kind: StageKind) -> Result<Entry> {
    global()
        .entries
        .read()
        .get(&(name.to_string(), kind))
        .copied()
        .ok_or_else(|| Error::NotFound(format!("{kind} {name}")))
}

/// Open a decode session for the named stage.
pub fn open_decoder(name: &str, options: &Options) -> Result<DecodeSession> {
    let entry = lookup(name, StageKind::Decoder)?;
    let Factory::Decoder(factory) = entry.factory else {
        return Err(Error::NotFound(format!("decoder {name}")));
    };
    Session::from_parts(entry.descriptor, factory(options)?, options)
}

/// Open an encode session for the named stage.
pub fn open_encoder(name: &str, options: &Options) -> Result<EncodeSession> {
    let entry = lookup(name, StageKind::Encoder)?;
    let Factory::Encoder(factory) = entry.factory else {
        return Err(Error::NotFound(format!("encoder {name}")));
    };
    Session::from_parts(entry.descriptor, factory(options)?, options)
}

/// Open a bitstream-rewrite session for the named stage.
pub fn open_rewriter(name: &str, options: &Options) -> Result<RewriteSession> {
    let entry = lookup(name, StageKind::Rewriter)?;
    let Factory::Rewriter(factory) = entry.factory else {
        return Err(Error::NotFound(format!("rewriter {name}")));
    };
    Session::from_parts(entry.descriptor, factory(options)?, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        assert!(find("pcm_s16", StageKind::Decoder).is_some());
        assert!(find("pcm_s16", StageKind::Encoder).is_some());
        assert!(find("null", StageKind::Rewriter).is_some());
        assert!(find("delay", StageKind::Rewriter).is_some());
    }

    #[test]
    fn test_unknown_stage_is_not_found() {
        let err = open_rewriter("no_such_stage", &Options::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_kind_is_part_of_identity() {
        // "null" exists only as a rewriter.
        assert!(find("null", StageKind::Decoder).is_none());
    }
}
