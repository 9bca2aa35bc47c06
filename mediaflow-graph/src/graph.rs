//! The transform graph: construction, negotiation, and the pull
//! scheduler.

use crate::error::{GraphError, Result};
use crate::filter;
use crate::node::{Link, Node, NodeId, Queued};
use mediaflow_core::format::StreamFormat;
use mediaflow_core::options::Options;
use mediaflow_core::status::{RecvStatus, SendStatus};
use mediaflow_core::unit::MediaUnit;
use mediaflow_core::Error;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// Default bound on queued units per source link before `Busy`.
const DEFAULT_MAX_QUEUE: usize = 16;

/// Graph lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Nodes and links may be added; not runnable yet. Structural
    /// changes after a configure drop the graph back here.
    Building,
    /// Formats are negotiated; sources accept input.
    Configured,
    /// Resources released; the graph is unusable.
    Closed,
}

/// A directed graph of named transform nodes.
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    by_name: HashMap<String, usize>,
    state: GraphState,
    /// Global enqueue counter; "oldest pending" means smallest stamp.
    seq: u64,
    max_queue: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            by_name: HashMap::new(),
            state: GraphState::Building,
            seq: 0,
            max_queue: DEFAULT_MAX_QUEUE,
        }
    }

    /// Create an empty graph with a custom per-source queue bound.
    pub fn with_max_queue(max_queue: usize) -> Self {
        let mut graph = Self::new();
        graph.max_queue = max_queue.max(1);
        graph
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.state == GraphState::Closed {
            return Err(Error::InvalidState("graph is closed").into());
        }
        Ok(())
    }

    fn node_index(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))
    }

    /// Instantiate a registered filter kind under an instance name.
    pub fn create_node(&mut self, kind: &str, name: &str, options: &Options) -> Result<NodeId> {
        self.ensure_usable()?;
        if self.by_name.contains_key(name) {
            return Err(GraphError::DuplicateNode(name.to_string()));
        }
        let instance = filter::create(kind, options)?;
        let index = self.nodes.len();
        self.nodes.push(Node::new(name.to_string(), instance));
        self.by_name.insert(name.to_string(), index);
        // Any structural change invalidates a previous configure.
        self.state = GraphState::Building;
        debug!(kind, name, "node created");
        Ok(NodeId(index))
    }

    /// Record a directed edge from an output pad to an input pad.
    pub fn link(&mut self, src: NodeId, src_pad: usize, dst: NodeId, dst_pad: usize) -> Result<()> {
        self.ensure_usable()?;
        let src_node = self
            .nodes
            .get(src.0)
            .ok_or_else(|| GraphError::NodeNotFound(format!("#{}", src.0)))?;
        let dst_node = self
            .nodes
            .get(dst.0)
            .ok_or_else(|| GraphError::NodeNotFound(format!("#{}", dst.0)))?;

        if src_pad >= src_node.out_links.len() {
            return Err(GraphError::PadOutOfRange {
                node: src_node.name.clone(),
                pad: src_pad,
            });
        }
        if dst_pad >= dst_node.in_links.len() {
            return Err(GraphError::PadOutOfRange {
                node: dst_node.name.clone(),
                pad: dst_pad,
            });
        }
        if src_node.out_links[src_pad].is_some() {
            return Err(GraphError::PadAlreadyLinked {
                node: src_node.name.clone(),
                pad: src_pad,
            });
        }
        if dst_node.in_links[dst_pad].is_some() {
            return Err(GraphError::PadAlreadyLinked {
                node: dst_node.name.clone(),
                pad: dst_pad,
            });
        }

        let link_index = self.links.len();
        self.links.push(Link::new((src.0, src_pad), (dst.0, dst_pad)));
        self.nodes[src.0].out_links[src_pad] = Some(link_index);
        self.nodes[dst.0].in_links[dst_pad] = Some(link_index);
        self.state = GraphState::Building;
        Ok(())
    }

    /// Validate the topology and negotiate one concrete format per
    /// link. Safe to call again after further construction.
    pub fn configure(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if self.nodes.is_empty() {
            return Err(Error::configuration("graph has no nodes").into());
        }

        // Every pad must be linked; sources and sinks simply have no
        // pads on the respective side.
        for node in &self.nodes {
            for (pad, link) in node.in_links.iter().enumerate() {
                if link.is_none() {
                    return Err(GraphError::UnlinkedPad {
                        node: node.name.clone(),
                        pad,
                    });
                }
            }
            for (pad, link) in node.out_links.iter().enumerate() {
                if link.is_none() {
                    return Err(GraphError::UnlinkedPad {
                        node: node.name.clone(),
                        pad,
                    });
                }
            }
        }

        let order = self.topological_order()?;

        for &node_index in &order {
            // Gather negotiated input formats; upstream nodes are
            // already configured in topological order.
            let mut inputs = Vec::with_capacity(self.nodes[node_index].in_links.len());
            for link in self.nodes[node_index].in_links.iter().flatten() {
                let format = self.links[*link]
                    .format
                    .ok_or_else(|| GraphError::Negotiation("upstream format missing".to_string()))?;
                inputs.push(format);
            }

            let outputs = self.nodes[node_index].filter.configure(&inputs)?;
            if outputs.len() != self.nodes[node_index].out_links.len() {
                return Err(Error::configuration(format!(
                    "node {} declared {} output pads but configured {}",
                    self.nodes[node_index].name,
                    self.nodes[node_index].out_links.len(),
                    outputs.len()
                ))
                .into());
            }

            let out_links: Vec<usize> = self.nodes[node_index]
                .out_links
                .iter()
                .flatten()
                .copied()
                .collect();
            for (pad, link_index) in out_links.into_iter().enumerate() {
                let format = outputs[pad];
                let (dst_index, dst_pad) = self.links[link_index].dst;
                if !self.nodes[dst_index]
                    .filter
                    .input_formats(dst_pad)
                    .accepts(&format)
                {
                    return Err(GraphError::Negotiation(format!(
                        "{}:{} produces {} which {}:{} does not accept",
                        self.nodes[node_index].name,
                        pad,
                        format,
                        self.nodes[dst_index].name,
                        dst_pad
                    )));
                }
                self.links[link_index].format = Some(format);
            }
        }

        self.state = GraphState::Configured;
        debug!(nodes = self.nodes.len(), links = self.links.len(), "graph configured");
        Ok(())
    }

    /// Kahn's algorithm over node dependencies.
    fn topological_order(&self) -> Result<Vec<usize>> {
        let mut indegree: Vec<usize> = self.nodes.iter().map(|n| n.in_links.len()).collect();
        let mut ready: VecDeque<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(index) = ready.pop_front() {
            order.push(index);
            for link in self.nodes[index].out_links.iter().flatten() {
                let dst = self.links[*link].dst.0;
                indegree[dst] -= 1;
                if indegree[dst] == 0 {
                    ready.push_back(dst);
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(GraphError::CycleDetected);
        }
        Ok(order)
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn source_link(&self, name: &str) -> Result<usize> {
        if self.state != GraphState::Configured {
            return Err(GraphError::NotConfigured);
        }
        let index = self.node_index(name)?;
        let node = &self.nodes[index];
        if !node.is_source() || node.out_links.len() != 1 {
            return Err(Error::configuration(format!("{name} is not a source node")).into());
        }
        node.out_links[0]
            .ok_or_else(|| GraphError::UnlinkedPad {
                node: name.to_string(),
                pad: 0,
            })
    }

    /// Offer a unit to a source node, with the same semantics as a
    /// session `send`.
    pub fn push_source(&mut self, name: &str, unit: MediaUnit) -> Result<SendStatus<MediaUnit>> {
        self.ensure_usable()?;
        let link_index = self.source_link(name)?;
        let link = &self.links[link_index];
        if link.eof_queued {
            return Err(Error::InvalidState("input after end of stream").into());
        }
        if link.queue.len() >= self.max_queue {
            trace!(source = name, "source busy");
            return Ok(SendStatus::Busy(unit));
        }
        let expected = link.format;
        if let Some(expected) = expected {
            let actual = unit.stream_format();
            if !formats_match(&expected, &actual) {
                return Err(Error::configuration(format!(
                    "unit format {actual} does not match negotiated {expected}"
                ))
                .into());
            }
        }
        let seq = self.next_seq();
        self.links[link_index].queue.push_back((seq, Queued::Unit(unit)));
        Ok(SendStatus::Accepted)
    }

    /// Signal end of stream on a source node. Idempotent.
    pub fn push_source_eof(&mut self, name: &str) -> Result<SendStatus<MediaUnit>> {
        self.ensure_usable()?;
        let link_index = self.source_link(name)?;
        if self.links[link_index].eof_queued {
            return Ok(SendStatus::Ended);
        }
        let seq = self.next_seq();
        let link = &mut self.links[link_index];
        link.queue.push_back((seq, Queued::Eof));
        link.eof_queued = true;
        trace!(source = name, "end of stream queued");
        Ok(SendStatus::Accepted)
    }

    /// Pull one unit from a sink node, advancing the graph as needed.
    pub fn pull_sink(&mut self, name: &str) -> Result<RecvStatus<MediaUnit>> {
        self.ensure_usable()?;
        if self.state != GraphState::Configured {
            return Err(GraphError::NotConfigured);
        }
        let index = self.node_index(name)?;
        if !self.nodes[index].is_sink() {
            return Err(Error::configuration(format!("{name} is not a sink node")).into());
        }
        loop {
            if let Some((_, unit)) = self.nodes[index].sink_queue.pop_front() {
                return Ok(RecvStatus::Produced(unit));
            }
            if self.nodes[index].sink_eof {
                return Ok(RecvStatus::Ended);
            }
            if !self.advance()? {
                return Ok(RecvStatus::NeedsInput);
            }
        }
    }

    /// Advance whichever node has the oldest pending work until some
    /// sink produces output, returning `(sink name, unit)`.
    ///
    /// `NeedsInput` means every sink is stalled on upstream input;
    /// `Ended` means every sink has fully drained.
    pub fn request_oldest(&mut self) -> Result<RecvStatus<(String, MediaUnit)>> {
        self.ensure_usable()?;
        if self.state != GraphState::Configured {
            return Err(GraphError::NotConfigured);
        }
        if !self.nodes.iter().any(Node::is_sink) {
            return Err(Error::configuration("graph has no sink nodes").into());
        }
        loop {
            // Oldest staged sink output wins.
            let mut best: Option<(usize, u64)> = None;
            for (index, node) in self.nodes.iter().enumerate() {
                if let Some((seq, _)) = node.sink_queue.front() {
                    if best.map_or(true, |(_, s)| *seq < s) {
                        best = Some((index, *seq));
                    }
                }
            }
            if let Some((index, _)) = best {
                let name = self.nodes[index].name.clone();
                if let Some((_, unit)) = self.nodes[index].sink_queue.pop_front() {
                    return Ok(RecvStatus::Produced((name, unit)));
                }
            }
            if self.nodes.iter().filter(|n| n.is_sink()).all(|n| n.sink_eof) {
                return Ok(RecvStatus::Ended);
            }
            if !self.advance()? {
                return Ok(RecvStatus::NeedsInput);
            }
        }
    }

    /// One scheduler step: deliver the oldest queued item to its
    /// destination node. Returns false when nothing can move.
    fn advance(&mut self) -> Result<bool> {
        let mut best: Option<(usize, u64)> = None;
        for (index, link) in self.links.iter().enumerate() {
            if let Some((seq, _)) = link.queue.front() {
                if self.nodes[link.dst.0].finished {
                    continue;
                }
                if best.map_or(true, |(_, s)| *seq < s) {
                    best = Some((index, *seq));
                }
            }
        }
        let Some((link_index, _)) = best else {
            return Ok(false);
        };

        let (dst_index, dst_pad) = self.links[link_index].dst;
        let Some((seq, item)) = self.links[link_index].queue.pop_front() else {
            return Ok(false);
        };

        match item {
            Queued::Unit(unit) => {
                if self.nodes[dst_index].is_sink() {
                    self.nodes[dst_index].sink_queue.push_back((seq, unit));
                } else {
                    let mut produced = Vec::new();
                    self.nodes[dst_index]
                        .filter
                        .process(dst_pad, unit, &mut produced)?;
                    self.route(dst_index, produced)?;
                }
            }
            Queued::Eof => {
                self.links[link_index].eof_delivered = true;
                let all_eof = self.nodes[dst_index]
                    .in_links
                    .iter()
                    .flatten()
                    .all(|l| self.links[*l].eof_delivered);
                if all_eof {
                    if self.nodes[dst_index].is_sink() {
                        self.nodes[dst_index].sink_eof = true;
                    } else {
                        let mut produced = Vec::new();
                        self.nodes[dst_index].filter.finish(&mut produced)?;
                        self.route(dst_index, produced)?;
                        let out_links: Vec<usize> = self.nodes[dst_index]
                            .out_links
                            .iter()
                            .flatten()
                            .copied()
                            .collect();
                        for link in out_links {
                            let seq = self.next_seq();
                            let link = &mut self.links[link];
                            link.queue.push_back((seq, Queued::Eof));
                            link.eof_queued = true;
                        }
                        self.nodes[dst_index].finished = true;
                        trace!(node = %self.nodes[dst_index].name, "node finished");
                    }
                }
            }
        }
        Ok(true)
    }

    /// Distribute a node's outputs onto its outgoing links.
    fn route(&mut self, node_index: usize, produced: Vec<(usize, MediaUnit)>) -> Result<()> {
        for (pad, unit) in produced {
            let link_index = self
                .nodes[node_index]
                .out_links
                .get(pad)
                .copied()
                .flatten()
                .ok_or_else(|| GraphError::PadOutOfRange {
                    node: self.nodes[node_index].name.clone(),
                    pad,
                })?;
            let seq = self.next_seq();
            self.links[link_index].queue.push_back((seq, Queued::Unit(unit)));
        }
        Ok(())
    }

    /// Release every node and link. Idempotent; all other operations
    /// fail afterwards.
    pub fn close(&mut self) {
        if self.state == GraphState::Closed {
            return;
        }
        debug!(nodes = self.nodes.len(), "graph closed");
        self.nodes.clear();
        self.links.clear();
        self.by_name.clear();
        self.state = GraphState::Closed;
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        self.close();
    }
}

/// Link-format compatibility for injected units: exact match on the
/// fields that determine buffer layout; aspect ratio is advisory.
fn formats_match(expected: &StreamFormat, actual: &StreamFormat) -> bool {
    match (expected, actual) {
        (StreamFormat::Video(e), StreamFormat::Video(a)) => {
            e.pixel == a.pixel && e.width == a.width && e.height == a.height
        }
        (StreamFormat::Audio(e), StreamFormat::Audio(a)) => {
            e.sample == a.sample && e.layout == a.layout && e.sample_rate == a.sample_rate
        }
        _ => false,
    }
}
