//! Graph internals: node instances and pad-to-pad links.

use crate::filter::Filter;
use mediaflow_core::format::StreamFormat;
use mediaflow_core::unit::MediaUnit;
use std::collections::VecDeque;

/// Handle to a node inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One item traveling on a link. End of stream is an ordinary queue
/// entry so it cannot overtake data.
pub(crate) enum Queued {
    Unit(MediaUnit),
    Eof,
}

/// A directed pad-to-pad connection with its own FIFO.
pub(crate) struct Link {
    /// (node index, output pad).
    pub src: (usize, usize),
    /// (node index, input pad).
    pub dst: (usize, usize),
    /// Queued items, each stamped with a global enqueue sequence.
    pub queue: VecDeque<(u64, Queued)>,
    /// Negotiated format; set by `configure`.
    pub format: Option<StreamFormat>,
    /// An end-of-stream marker has entered this link.
    pub eof_queued: bool,
    /// The marker has been consumed by the downstream node.
    pub eof_delivered: bool,
}

impl Link {
    pub(crate) fn new(src: (usize, usize), dst: (usize, usize)) -> Self {
        Self {
            src,
            dst,
            queue: VecDeque::new(),
            format: None,
            eof_queued: false,
            eof_delivered: false,
        }
    }
}

/// A named filter instance with its pad wiring.
pub(crate) struct Node {
    pub name: String,
    pub filter: Box<dyn Filter>,
    /// Link index per input pad.
    pub in_links: Vec<Option<usize>>,
    /// Link index per output pad.
    pub out_links: Vec<Option<usize>>,
    /// The filter has finished (all inputs hit end of stream and
    /// `finish` ran).
    pub finished: bool,
    /// Output staged at a sink node, sequence-stamped for
    /// oldest-first extraction.
    pub sink_queue: VecDeque<(u64, MediaUnit)>,
    /// A sink that has consumed end of stream on every input.
    pub sink_eof: bool,
}

impl Node {
    pub(crate) fn new(name: String, filter: Box<dyn Filter>) -> Self {
        let inputs = filter.num_inputs();
        let outputs = filter.num_outputs();
        Self {
            name,
            filter,
            in_links: vec![None; inputs],
            out_links: vec![None; outputs],
            finished: false,
            sink_queue: VecDeque::new(),
            sink_eof: false,
        }
    }

    pub(crate) fn is_source(&self) -> bool {
        self.in_links.is_empty()
    }

    pub(crate) fn is_sink(&self) -> bool {
        self.out_links.is_empty()
    }
}
