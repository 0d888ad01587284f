//! Renderer Facade
//!
//! [`Renderer`] owns the shader registry, the render-target set, and the
//! frame graph, and drives one complete frame per [`Renderer::render`]
//! call. The caller owns the surface and the scene: it extracts an
//! [`ExtractedScene`] snapshot each frame, draws its UI layer into
//! [`Renderer::ui_view`], then hands over the swapchain view.
//!
//! Pass order is fixed at construction; passes disabled through
//! [`GraphicsSettings`] skip their own work during `prepare`/`run`.

use crate::errors::{RenderError, Result};
use crate::graph::passes::{
    BloomPass, ColorPass, DirectionalShadowPass, FinalPass, GeometryPass, MotionBlurPass,
    OmniShadowPass, SceneCompositePass, SsaoPass, UiCompositePass, VolumetricPass,
};
use crate::graph::{ExecuteContext, ExtractedScene, FrameGraph, PrepareContext};
use crate::settings::{GraphicsSettings, ShadowQuality};
use crate::shaders::ShaderRegistry;
use crate::targets::{RenderTargetSet, TargetName};

/// Requests a default adapter and device for the given surface.
///
/// Convenience for callers that do not need custom features or limits.
pub async fn request_device(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| RenderError::AdapterRequestFailed(e.to_string()))?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Render Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await?;

    Ok((device, queue))
}

/// Builds the fixed pass sequence targeting a surface of `surface_format`.
///
/// Ambient occlusion is resolved before shading so the color pass can fold
/// it into its ambient term; compositing then only merges bloom and
/// volumetrics over the shaded scene.
#[must_use]
pub fn build_frame_graph(surface_format: wgpu::TextureFormat) -> FrameGraph {
    FrameGraph::new()
        .with_node(DirectionalShadowPass::new())
        .with_node(OmniShadowPass::new())
        .with_node(GeometryPass::new())
        .with_node(SsaoPass::new())
        .with_node(ColorPass::new())
        .with_node(BloomPass::new())
        .with_node(VolumetricPass::new())
        .with_node(MotionBlurPass::new())
        .with_node(SceneCompositePass::new())
        .with_node(UiCompositePass::new())
        .with_node(FinalPass::new(surface_format))
}

/// The deferred rendering pipeline.
pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    settings: GraphicsSettings,
    shaders: ShaderRegistry,
    targets: RenderTargetSet,
    graph: FrameGraph,
    /// Bumped on every target rebuild so passes refresh their bind groups.
    targets_generation: u64,
    frame_index: u64,
}

impl Renderer {
    /// Builds the full pipeline for a surface of `surface_format` at the
    /// given resolution.
    ///
    /// Compiles every pass shader up front; a validation failure in any of
    /// them is fatal and returned here.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let shaders = ShaderRegistry::new(&device)?;
        let targets = RenderTargetSet::new(&device, width, height);

        let graph = build_frame_graph(surface_format);

        log::info!("renderer initialized with {} passes at {width}x{height}", graph.len());

        Ok(Self {
            device,
            queue,
            settings: GraphicsSettings::default(),
            shaders,
            targets,
            graph,
            targets_generation: 0,
            frame_index: 0,
        })
    }

    /// Current graphics settings.
    #[must_use]
    pub fn settings(&self) -> &GraphicsSettings {
        &self.settings
    }

    /// Mutable graphics settings; takes effect on the next frame.
    pub fn settings_mut(&mut self) -> &mut GraphicsSettings {
        &mut self.settings
    }

    /// The realized render targets.
    #[must_use]
    pub fn targets(&self) -> &RenderTargetSet {
        &self.targets
    }

    /// View the caller renders its UI layer into before [`Self::render`].
    #[must_use]
    pub fn ui_view(&self) -> &wgpu::TextureView {
        self.targets.framebuffer(TargetName::Ui).color_view(0)
    }

    /// Rebuilds every screen-sized target for a new surface resolution.
    pub fn resize_screen(&mut self, width: u32, height: u32) {
        self.targets.resize_screen(&self.device, width, height);
        self.targets_generation += 1;
    }

    /// Changes the resolution of the directional shadow map in `slot`.
    ///
    /// Slots out of range are ignored with a warning.
    pub fn set_directional_shadow_quality(&mut self, slot: usize, quality: ShadowQuality) {
        self.targets.set_directional_shadow_quality(&self.device, slot, quality);
        self.targets_generation += 1;
    }

    /// Changes the resolution of the omnidirectional shadow cube in `slot`.
    ///
    /// Slots out of range are ignored with a warning.
    pub fn set_omni_shadow_quality(&mut self, slot: usize, quality: ShadowQuality) {
        self.targets.set_omni_shadow_quality(&self.device, slot, quality);
        self.targets_generation += 1;
    }

    /// Renders one frame of `scene` to `surface_view`.
    pub fn render(&mut self, scene: &ExtractedScene, surface_view: &wgpu::TextureView) {
        let mut prepare = PrepareContext {
            device: &self.device,
            queue: &self.queue,
            targets: &self.targets,
            shaders: &self.shaders,
            settings: &self.settings,
            scene,
            targets_generation: self.targets_generation,
            frame_index: self.frame_index,
        };
        self.graph.prepare(&mut prepare);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let execute = ExecuteContext {
            device: &self.device,
            targets: &self.targets,
            settings: &self.settings,
            scene,
            surface_view,
            frame_index: self.frame_index,
        };
        self.graph.run(&execute, &mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.frame_index = self.frame_index.wrapping_add(1);
    }
}
