//! Built-in transform stages.

mod passthrough;
mod pcm;

pub use passthrough::{DelayRewriter, NullRewriter};
pub use pcm::{PcmDecoder, PcmEncoder};

use crate::registry::{insert, EntryMap, Factory};

/// Register the built-in stage set. Called once by the registry.
pub(crate) fn register_builtins(map: &mut EntryMap) {
    insert(map, &pcm::PCM_S16_DECODER, Factory::Decoder(pcm::new_decoder));
    insert(map, &pcm::PCM_S16_ENCODER, Factory::Encoder(pcm::new_encoder));
    insert(
        map,
        &passthrough::NULL_REWRITER,
        Factory::Rewriter(passthrough::new_null),
    );
    insert(
        map,
        &passthrough::DELAY_REWRITER,
        Factory::Rewriter(passthrough::new_delay),
    );
}
