//! Frame graph executor.
//!
//! Linear node list, one command encoder for the whole frame, a debug
//! group around every node. Node order is fixed at construction and
//! encodes the pipeline's data dependencies; disabled effects skip inside
//! their node rather than restructuring the graph.

use super::context::{ExecuteContext, PrepareContext};
use super::node::RenderNode;

/// Ordered list of render nodes executed once per frame.
pub struct FrameGraph {
    nodes: Vec<Box<dyn RenderNode>>,
}

impl FrameGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Appends a node; nodes run in insertion order.
    pub fn add_node(&mut self, node: impl RenderNode + 'static) {
        self.nodes.push(Box::new(node));
    }

    /// Appends a node, chaining.
    #[must_use]
    pub fn with_node(mut self, node: impl RenderNode + 'static) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node names in execution order.
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    /// Runs the prepare phase over every node.
    pub fn prepare(&mut self, ctx: &mut PrepareContext) {
        for node in &mut self.nodes {
            node.prepare(ctx);
        }
    }

    /// Records every node into `encoder`, each wrapped in a debug group.
    pub fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        for node in &self.nodes {
            encoder.push_debug_group(node.name());
            node.run(ctx, encoder);
            encoder.pop_debug_group();
        }
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}
