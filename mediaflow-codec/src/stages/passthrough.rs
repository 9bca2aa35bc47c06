//! Bitstream rewriters: the null pass-through and a fixed-delay stage.

use crate::descriptor::{StageDescriptor, StageKind};
use crate::session::{BoxedTransform, Transform};
use mediaflow_core::options::Options;
use mediaflow_core::{Error, Packet, Result};
use std::collections::VecDeque;

/// Largest delay window the `delay` rewriter accepts.
const MAX_DELAY: usize = 16;

/// Descriptor for the null rewriter.
pub static NULL_REWRITER: StageDescriptor = StageDescriptor {
    name: "null",
    long_name: "pass-through",
    kind: StageKind::Rewriter,
    media_type: None,
    fixed_frame_size: false,
    delay: 0,
};

/// Descriptor for the delay rewriter.
pub static DELAY_REWRITER: StageDescriptor = StageDescriptor {
    name: "delay",
    long_name: "fixed-window delay",
    kind: StageKind::Rewriter,
    media_type: None,
    fixed_frame_size: false,
    delay: MAX_DELAY,
};

/// Forwards every packet unchanged.
pub struct NullRewriter;

pub(crate) fn new_null(_options: &Options) -> Result<BoxedTransform<Packet, Packet>> {
    Ok(Box::new(NullRewriter))
}

impl Transform for NullRewriter {
    type In = Packet;
    type Out = Packet;

    fn process(&mut self, packet: Packet, out: &mut Vec<Packet>) -> Result<()> {
        out.push(packet);
        Ok(())
    }

    fn reset(&mut self) {}
}

/// Holds back a fixed window of packets, releasing them in order.
///
/// The first `frames` inputs produce no output at all, so drivers that
/// fail to drain in a loop (or to drain after end of stream) lose data
/// against this stage. That is its purpose.
pub struct DelayRewriter {
    window: VecDeque<Packet>,
    frames: usize,
}

pub(crate) fn new_delay(options: &Options) -> Result<BoxedTransform<Packet, Packet>> {
    let frames = options.int_or("frames", 2);
    if frames < 0 || frames as usize > MAX_DELAY {
        return Err(Error::configuration(format!(
            "delay frames must be within 0..={MAX_DELAY}, got {frames}"
        )));
    }
    Ok(Box::new(DelayRewriter {
        window: VecDeque::with_capacity(frames as usize),
        frames: frames as usize,
    }))
}

impl Transform for DelayRewriter {
    type In = Packet;
    type Out = Packet;

    fn process(&mut self, packet: Packet, out: &mut Vec<Packet>) -> Result<()> {
        self.window.push_back(packet);
        if self.window.len() > self.frames {
            if let Some(ready) = self.window.pop_front() {
                out.push(ready);
            }
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<Packet>) -> Result<()> {
        out.extend(self.window.drain(..));
        Ok(())
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_one_to_one() {
        let mut null = NullRewriter;
        let mut out = Vec::new();
        null.process(Packet::new(vec![1]), &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data(), &[1]);
    }

    #[test]
    fn test_delay_withholds_then_releases_in_order() {
        let opts = Options::new().with("frames", 2i64);
        let mut delay = new_delay(&opts).unwrap();
        let mut out = Vec::new();

        delay.process(Packet::new(vec![1]), &mut out).unwrap();
        delay.process(Packet::new(vec![2]), &mut out).unwrap();
        assert!(out.is_empty());

        delay.process(Packet::new(vec![3]), &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data(), &[1]);

        delay.finish(&mut out).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].data(), &[3]);
    }

    #[test]
    fn test_delay_bounds_checked() {
        let opts = Options::new().with("frames", 64i64);
        assert!(new_delay(&opts).is_err());
    }
}
