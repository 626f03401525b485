//! Realtime audio graph.
//!
//! Effects only ever talk to [`AudioGraph`]: they create processing units,
//! wire them together and write their parameters. [`render::Graph`] is the
//! in-process implementation whose [`render::Renderer`] half runs on the
//! audio thread of whatever host drives it.

pub mod analyser;
pub mod param;
pub mod render;

use anyhow::Result;
use std::fmt::Display;
use std::sync::Arc;

pub use analyser::AnalyserNode;
pub use param::AudioParam;
pub use render::{Graph, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A gain-control unit. Cloning shares the live parameter.
#[derive(Debug, Clone)]
pub struct GainNode {
    id: NodeId,
    gain: Arc<AudioParam>,
}

impl GainNode {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            gain: Arc::new(AudioParam::new(1.0)),
        }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub(crate) fn param(&self) -> Arc<AudioParam> {
        Arc::clone(&self.gain)
    }
}

/// Host-agnostic view of a realtime audio graph.
///
/// Nodes form a directed acyclic graph whose single sink is
/// [`AudioGraph::destination`]. Topology changes take effect on the next
/// rendered block.
pub trait AudioGraph: Send + Sync {
    fn sample_rate(&self) -> f32;

    /// The sink that feeds the host's playback ports.
    fn destination(&self) -> NodeId;

    /// Creates a node that emits the captured input.
    fn create_source(&self) -> NodeId;

    fn create_gain(&self) -> GainNode;

    fn create_analyser(&self) -> AnalyserNode;

    fn connect(&self, from: NodeId, to: NodeId) -> Result<()>;

    /// Drops every outgoing connection of `from`.
    fn disconnect(&self, from: NodeId);

    /// Disconnects `node` on both sides and forgets it.
    fn remove(&self, node: NodeId);

    /// Hands every outgoing connection of `old` to `new`, then removes `old`.
    ///
    /// The renderer sees a single topology change, so there is no block in
    /// which both nodes feed the same targets.
    fn replace(&self, old: NodeId, new: NodeId) -> Result<()>;

    /// Nodes that `node` currently feeds, in ascending id order.
    fn outputs(&self, node: NodeId) -> Vec<NodeId>;

    /// Every live node, the destination included, in ascending id order.
    fn nodes(&self) -> Vec<NodeId>;
}
