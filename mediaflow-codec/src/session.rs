//! The generic transform session state machine.
//!
//! One state machine serves decoders, encoders, and bitstream rewriters;
//! only the input/output unit types differ. A [`Session`] owns a boxed
//! [`Transform`] backend and mediates between it and the caller with a
//! bounded pending-output queue, which is where the `Busy` back-pressure
//! signal comes from.

use crate::descriptor::StageDescriptor;
use mediaflow_core::options::Options;
use mediaflow_core::status::{RecvStatus, SendStatus};
use mediaflow_core::unit::MediaUnit;
use mediaflow_core::{Error, Packet, Result};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Default bound on buffered outputs before `send` reports `Busy`.
const DEFAULT_MAX_PENDING: usize = 8;

/// A stage backend: consumes inputs one at a time, producing zero or
/// more outputs per input, with a final drain after end of stream.
///
/// Backends never see the session protocol; buffering, back-pressure,
/// and end-of-stream bookkeeping all live in [`Session`].
pub trait Transform: Send {
    /// Input unit type.
    type In;
    /// Output unit type.
    type Out;

    /// Consume one input, appending any outputs produced.
    fn process(&mut self, input: Self::In, out: &mut Vec<Self::Out>) -> Result<()>;

    /// Called once after end of stream; append all remaining buffered
    /// outputs.
    fn finish(&mut self, out: &mut Vec<Self::Out>) -> Result<()> {
        let _ = out;
        Ok(())
    }

    /// Discard internal state (seek/discontinuity support).
    fn reset(&mut self);
}

/// A boxed backend with its unit types fixed.
pub type BoxedTransform<I, O> = Box<dyn Transform<In = I, Out = O>>;

/// A decode session: compressed units in, decoded units out.
pub type DecodeSession = Session<Packet, MediaUnit>;

/// An encode session: decoded units in, compressed units out.
pub type EncodeSession = Session<MediaUnit, Packet>;

/// A bitstream-rewrite session: compressed units in and out.
pub type RewriteSession = Session<Packet, Packet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accepting input.
    Open,
    /// End of stream received; draining buffered output.
    Draining,
    /// Fully drained; nothing more will ever be produced.
    Ended,
    /// A fatal backend error occurred; only `close` is useful now.
    Failed,
    /// Resources released.
    Closed,
}

/// The send/receive state machine wrapped around one stage backend.
pub struct Session<I, O> {
    descriptor: &'static StageDescriptor,
    backend: Option<BoxedTransform<I, O>>,
    pending: VecDeque<O>,
    scratch: Vec<O>,
    max_pending: usize,
    state: State,
    finish_done: bool,
}

impl<I, O> std::fmt::Debug for Session<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("descriptor", &self.descriptor.name)
            .field("pending_len", &self.pending.len())
            .field("max_pending", &self.max_pending)
            .field("state", &self.state)
            .field("finish_done", &self.finish_done)
            .finish()
    }
}

impl<I, O> Session<I, O> {
    /// Assemble a session from a descriptor and an already-constructed
    /// backend. Most callers go through the registry's `open_*` helpers
    /// instead.
    pub fn from_parts(
        descriptor: &'static StageDescriptor,
        backend: BoxedTransform<I, O>,
        options: &Options,
    ) -> Result<Self> {
        let max_pending = options.int_or("max_pending", DEFAULT_MAX_PENDING as i64);
        if max_pending < 1 {
            return Err(Error::configuration(format!(
                "max_pending must be at least 1, got {max_pending}"
            )));
        }
        debug!(stage = descriptor.name, kind = %descriptor.kind, "session opened");
        Ok(Self {
            descriptor,
            backend: Some(backend),
            pending: VecDeque::new(),
            scratch: Vec::new(),
            max_pending: max_pending as usize,
            state: State::Open,
            finish_done: false,
        })
    }

    /// The descriptor this session was opened from.
    pub fn descriptor(&self) -> &'static StageDescriptor {
        self.descriptor
    }

    /// Check whether the session still holds resources.
    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Closed)
    }

    /// Offer one input unit.
    ///
    /// `Busy` hands the unit back: drain at least one output via
    /// [`Session::receive`], then resend it. Sending a unit after the
    /// end-of-stream marker is a protocol violation and fails with
    /// [`Error::InvalidState`].
    pub fn send(&mut self, input: I) -> Result<SendStatus<I>> {
        let backend = match self.state {
            State::Closed => return Err(Error::InvalidState("send on closed session")),
            State::Failed => return Err(Error::InvalidState("send on failed session")),
            State::Draining | State::Ended => {
                return Err(Error::InvalidState("input after end of stream"))
            }
            State::Open => match self.backend.as_mut() {
                Some(backend) => backend,
                None => return Err(Error::InvalidState("send on closed session")),
            },
        };

        if self.pending.len() >= self.max_pending {
            trace!(stage = self.descriptor.name, "session busy");
            return Ok(SendStatus::Busy(input));
        }

        match backend.process(input, &mut self.scratch) {
            Ok(()) => {
                self.pending.extend(self.scratch.drain(..));
                Ok(SendStatus::Accepted)
            }
            Err(err) => {
                self.scratch.clear();
                if err.is_fatal() {
                    debug!(stage = self.descriptor.name, %err, "session failed");
                    self.state = State::Failed;
                }
                Err(err)
            }
        }
    }

    /// Signal end of stream. Idempotent: repeating the marker reports
    /// `Ended` without error.
    pub fn send_eof(&mut self) -> Result<SendStatus<I>> {
        match self.state {
            State::Closed => Err(Error::InvalidState("send on closed session")),
            State::Failed => Err(Error::InvalidState("send on failed session")),
            State::Draining | State::Ended => Ok(SendStatus::Ended),
            State::Open => {
                trace!(stage = self.descriptor.name, "end of stream");
                self.state = State::Draining;
                Ok(SendStatus::Accepted)
            }
        }
    }

    /// Ask for one output unit.
    ///
    /// Stages may produce output without consuming new input
    /// (reordering, lookahead), so callers must keep receiving until
    /// `NeedsInput` or `Ended`.
    pub fn receive(&mut self) -> Result<RecvStatus<O>> {
        match self.state {
            State::Closed => return Err(Error::InvalidState("receive on closed session")),
            State::Failed => return Err(Error::InvalidState("receive on failed session")),
            _ => {}
        }

        if let Some(unit) = self.pending.pop_front() {
            return Ok(RecvStatus::Produced(unit));
        }

        match self.state {
            State::Open => Ok(RecvStatus::NeedsInput),
            State::Ended => Ok(RecvStatus::Ended),
            State::Draining => {
                if !self.finish_done {
                    self.finish_done = true;
                    let backend = match self.backend.as_mut() {
                        Some(backend) => backend,
                        None => return Err(Error::InvalidState("receive on closed session")),
                    };
                    if let Err(err) = backend.finish(&mut self.scratch) {
                        self.scratch.clear();
                        if err.is_fatal() {
                            self.state = State::Failed;
                        }
                        return Err(err);
                    }
                    self.pending.extend(self.scratch.drain(..));
                }
                if let Some(unit) = self.pending.pop_front() {
                    Ok(RecvStatus::Produced(unit))
                } else {
                    self.state = State::Ended;
                    Ok(RecvStatus::Ended)
                }
            }
            State::Failed | State::Closed => unreachable!("checked above"),
        }
    }

    /// Discard buffered state without closing, e.g. when seeking. The
    /// session returns to accepting input.
    ///
    /// A failed session stays failed; close it instead.
    pub fn flush(&mut self) -> Result<()> {
        match self.state {
            State::Closed => Err(Error::InvalidState("flush on closed session")),
            State::Failed => Err(Error::InvalidState("flush on failed session")),
            _ => {
                self.pending.clear();
                self.finish_done = false;
                if let Some(backend) = self.backend.as_mut() {
                    backend.reset();
                }
                self.state = State::Open;
                Ok(())
            }
        }
    }

    /// Release resources. Idempotent: a second close is a no-op.
    pub fn close(&mut self) {
        if matches!(self.state, State::Closed) {
            return;
        }
        debug!(stage = self.descriptor.name, "session closed");
        self.backend = None;
        self.pending.clear();
        self.scratch.clear();
        self.state = State::Closed;
    }

    /// Number of outputs currently buffered.
    pub fn pending_outputs(&self) -> usize {
        self.pending.len()
    }
}

impl<I, O> Drop for Session<I, O> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::StageKind;

    static TEST_STAGE: StageDescriptor = StageDescriptor {
        name: "test",
        long_name: "test stage",
        kind: StageKind::Rewriter,
        media_type: None,
        fixed_frame_size: false,
        delay: 0,
    };

    /// Duplicates every input n times.
    struct Repeat(usize);

    impl Transform for Repeat {
        type In = u32;
        type Out = u32;

        fn process(&mut self, input: u32, out: &mut Vec<u32>) -> Result<()> {
            for _ in 0..self.0 {
                out.push(input);
            }
            Ok(())
        }

        fn reset(&mut self) {}
    }

    /// Always fails fatally.
    struct Exploding;

    impl Transform for Exploding {
        type In = u32;
        type Out = u32;

        fn process(&mut self, _input: u32, _out: &mut Vec<u32>) -> Result<()> {
            Err(Error::fatal(-1))
        }

        fn reset(&mut self) {}
    }

    fn session(backend: BoxedTransform<u32, u32>, opts: &Options) -> Session<u32, u32> {
        Session::from_parts(&TEST_STAGE, backend, opts).unwrap()
    }

    #[test]
    fn test_one_to_n_then_drain() {
        let mut s = session(Box::new(Repeat(2)), &Options::new());
        assert!(s.send(5).unwrap().is_accepted());
        assert!(s.send_eof().unwrap().is_accepted());
        assert_eq!(s.receive().unwrap().into_produced(), Some(5));
        assert_eq!(s.receive().unwrap().into_produced(), Some(5));
        assert!(s.receive().unwrap().is_ended());
        // Stays ended.
        assert!(s.receive().unwrap().is_ended());
    }

    #[test]
    fn test_busy_when_pending_at_capacity() {
        let opts = Options::new().with("max_pending", 2usize);
        let mut s = session(Box::new(Repeat(1)), &opts);
        assert!(s.send(1).unwrap().is_accepted());
        assert!(s.send(2).unwrap().is_accepted());
        // Queue is at capacity; next send is rejected with the unit.
        assert_eq!(s.send(3).unwrap().into_rejected(), Some(3));
        // Drain one and the same unit is accepted.
        assert!(matches!(s.receive().unwrap(), RecvStatus::Produced(1)));
        assert!(s.send(3).unwrap().is_accepted());
    }

    #[test]
    fn test_input_after_eof_is_invalid_state() {
        let mut s = session(Box::new(Repeat(1)), &Options::new());
        s.send_eof().unwrap();
        assert!(matches!(s.send(1), Err(Error::InvalidState(_))));
        // Repeating the marker itself is tolerated.
        assert!(matches!(s.send_eof().unwrap(), SendStatus::Ended));
    }

    #[test]
    fn test_flush_reopens_after_eof() {
        let mut s = session(Box::new(Repeat(1)), &Options::new());
        s.send(1).unwrap();
        s.send_eof().unwrap();
        s.flush().unwrap();
        assert!(s.send(2).unwrap().is_accepted());
        assert_eq!(s.pending_outputs(), 1);
    }

    #[test]
    fn test_fatal_poisons_session() {
        let mut s = session(Box::new(Exploding), &Options::new());
        assert!(s.send(1).unwrap_err().is_fatal());
        assert!(matches!(s.send(2), Err(Error::InvalidState(_))));
        assert!(matches!(s.receive(), Err(Error::InvalidState(_))));
        assert!(s.flush().is_err());
        s.close();
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut s = session(Box::new(Repeat(1)), &Options::new());
        s.close();
        s.close();
        assert!(!s.is_open());
        assert!(matches!(s.send(1), Err(Error::InvalidState(_))));
        assert!(matches!(s.receive(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_invalid_max_pending_rejected() {
        let opts = Options::new().with("max_pending", 0usize);
        assert!(Session::<u32, u32>::from_parts(&TEST_STAGE, Box::new(Repeat(1)), &opts).is_err());
    }

    #[test]
    fn test_zero_output_input_then_needs_input() {
        let mut s = session(Box::new(Repeat(0)), &Options::new());
        assert!(s.send(9).unwrap().is_accepted());
        assert!(matches!(s.receive().unwrap(), RecvStatus::NeedsInput));
    }
}
