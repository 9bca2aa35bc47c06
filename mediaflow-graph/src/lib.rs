//! # Mediaflow Graph
//!
//! A directed graph of named transform nodes. Nodes are instances of
//! registered filter kinds, connected pad to pad; configuration
//! validates the topology and negotiates one concrete format per link,
//! then the graph is driven by pushing units into source nodes and
//! pulling them from sinks. Internal scheduling is an explicit work
//! loop that always advances the oldest pending unit, so no branch
//! buffers without bound while another is serviced.
//!
//! ```
//! use mediaflow_core::sample::{ChannelLayout, Sample, SampleFormat};
//! use mediaflow_core::{Options, RecvStatus};
//! use mediaflow_graph::Graph;
//!
//! let mut graph = Graph::new();
//! let src = graph.create_node("abuffer", "in", &Options::new()
//!     .with("sample_rate", 48000i64)
//!     .with("channels", 1i64)).unwrap();
//! let vol = graph.create_node("volume", "gain", &Options::new()
//!     .with("gain_db", -6.0)).unwrap();
//! let sink = graph.create_node("abuffersink", "out", &Options::new()).unwrap();
//! graph.link(src, 0, vol, 0).unwrap();
//! graph.link(vol, 0, sink, 0).unwrap();
//! graph.configure().unwrap();
//!
//! let sample = Sample::new(64, SampleFormat::S16, ChannelLayout::Mono, 48000);
//! graph.push_source("in", sample.into()).unwrap();
//! assert!(matches!(graph.pull_sink("out").unwrap(), RecvStatus::Produced(_)));
//! ```

pub mod builtins;
pub mod error;
pub mod filter;
pub mod graph;
mod node;

pub use error::{GraphError, Result};
pub use filter::{register_filter, Filter, FilterFactory, FormatSet};
pub use graph::{Graph, GraphState};
pub use node::NodeId;
