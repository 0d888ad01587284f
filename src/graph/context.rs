//! Frame graph contexts.
//!
//! `PrepareContext` and `ExecuteContext` carry the same borrowed state; the
//! split exists so nodes can only mutate themselves during `prepare` and
//! only read during `run`.

use crate::settings::GraphicsSettings;
use crate::shaders::ShaderRegistry;
use crate::targets::RenderTargetSet;

use super::extracted::ExtractedScene;

/// Shared state handed to `prepare`.
pub struct PrepareContext<'a> {
    /// GPU device.
    pub device: &'a wgpu::Device,
    /// GPU queue for uniform uploads.
    pub queue: &'a wgpu::Queue,
    /// Realized render targets.
    pub targets: &'a RenderTargetSet,
    /// Compiled shader programs.
    pub shaders: &'a ShaderRegistry,
    /// Current graphics settings.
    pub settings: &'a GraphicsSettings,
    /// Frame scene snapshot.
    pub scene: &'a ExtractedScene,
    /// Bumped whenever the target set is rebuilt; nodes compare it against
    /// their cached value and rebuild bind groups on mismatch.
    pub targets_generation: u64,
    /// Monotonic frame counter; parity selects double-buffered targets.
    pub frame_index: u64,
}

/// Shared state handed to `run`.
pub struct ExecuteContext<'a> {
    /// GPU device.
    pub device: &'a wgpu::Device,
    /// Realized render targets.
    pub targets: &'a RenderTargetSet,
    /// Current graphics settings.
    pub settings: &'a GraphicsSettings,
    /// Frame scene snapshot.
    pub scene: &'a ExtractedScene,
    /// View of the swapchain texture the final pass presents to.
    pub surface_view: &'a wgpu::TextureView,
    /// Monotonic frame counter; parity selects double-buffered targets.
    pub frame_index: u64,
}
