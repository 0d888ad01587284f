//! Render node abstraction.
//!
//! Each pipeline stage is a node with two phases: `prepare` may allocate
//! resources and rebuild bind groups, `run` only records GPU commands.

use super::context::{ExecuteContext, PrepareContext};

/// One stage of the frame graph.
pub trait RenderNode {
    /// Node name for debug groups and diagnostics.
    fn name(&self) -> &str;

    /// Allocation phase: create pipelines, upload uniforms, rebuild bind
    /// groups when the target set changed.
    fn prepare(&mut self, _ctx: &mut PrepareContext) {}

    /// Recording phase: encode render passes. Must not allocate.
    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder);
}
