//! # Mediaflow Codec
//!
//! Transform sessions: the generic send/receive state machine shared by
//! decode, encode, and bitstream-rewrite stages.
//!
//! A [`Session`] wraps a stage backend behind the uniform protocol of
//! [`mediaflow_core::SendStatus`] and [`mediaflow_core::RecvStatus`]:
//! callers push units in, pull units out, and treat `Busy`/`NeedsInput`
//! as the two transient back-pressure signals. End of stream is a
//! one-way, explicit marker; after it, a session only drains.
//!
//! ```
//! use mediaflow_codec::{open_rewriter, RecvStatus, SendStatus};
//! use mediaflow_core::{Options, Packet};
//!
//! let mut session = open_rewriter("null", &Options::new()).unwrap();
//! assert!(session.send(Packet::new(vec![1, 2, 3])).unwrap().is_accepted());
//! session.send_eof().unwrap();
//! let mut outputs = 0;
//! loop {
//!     match session.receive().unwrap() {
//!         RecvStatus::Produced(_) => outputs += 1,
//!         RecvStatus::NeedsInput => unreachable!("already at end of stream"),
//!         RecvStatus::Ended => break,
//!     }
//! }
//! assert_eq!(outputs, 1);
//! # let _: SendStatus<Packet> = session.send_eof().unwrap();
//! ```

pub mod descriptor;
pub mod registry;
pub mod session;
pub mod stages;

pub use descriptor::{StageDescriptor, StageKind};
pub use registry::{open_decoder, open_encoder, open_rewriter, register, Factory};
pub use session::{
    BoxedTransform, DecodeSession, EncodeSession, RewriteSession, Session, Transform,
};

// Re-exported so session drivers only need this crate.
pub use mediaflow_core::{RecvStatus, SendStatus};
