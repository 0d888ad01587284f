//! Compositing Passes
//!
//! Two fullscreen merges close out the off-screen pipeline:
//!
//! - [`SceneCompositePass`] folds bloom and volumetrics over the shaded
//!   scene (or its motion-blurred variant) into the first composite plane.
//! - [`UiCompositePass`] alpha-blends the UI layer over the scene with its
//!   own tone-mapping operator, producing the merged plane the final pass
//!   presents plus the tone-mapped UI plane on its own.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::node::RenderNode;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;

use super::common::{
    begin_fullscreen_pass, fullscreen_pipeline, hdr_color_target, sampler_entry, texture_entry,
    uniform_entry, Samplers,
};

/// Bloom contribution multiplier at compositing.
const BLOOM_STRENGTH: f32 = 1.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CompositeUniforms {
    params: Vec4,
}

pub struct SceneCompositePass {
    layout: Option<wgpu::BindGroupLayout>,
    pipeline: Option<wgpu::RenderPipeline>,
    uniforms: Option<UniformBuffer<CompositeUniforms>>,
    samplers: Option<Samplers>,
    /// Indexed by `[motion blur on][accumulation parity]`.
    bind_groups: [[Option<wgpu::BindGroup>; 2]; 2],
    cached_generation: Option<u64>,
}

impl SceneCompositePass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: None,
            pipeline: None,
            uniforms: None,
            samplers: None,
            bind_groups: [[None, None], [None, None]],
            cached_generation: None,
        }
    }
}

impl Default for SceneCompositePass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for SceneCompositePass {
    fn name(&self) -> &str {
        "Scene Composite Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if self.layout.is_none() {
            self.samplers = Some(Samplers::new(ctx.device));
            self.uniforms = Some(UniformBuffer::new(ctx.device, "Scene Composite Uniforms"));
            let layout = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Scene Composite Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        texture_entry(3),
                        sampler_entry(4),
                    ],
                });
            self.pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Scene Composite Pipeline",
                ctx.shaders.module(PassKind::CompositingScene),
                &[&layout],
                &[hdr_color_target()],
            ));
            self.layout = Some(layout);
        }

        if self.cached_generation != Some(ctx.targets_generation) {
            let samplers = self.samplers.as_ref().unwrap();
            let volumetric = ctx.targets.framebuffer(TargetName::Volumetric(3)).color_view(0);
            for motion in 0..2 {
                let scene = if motion == 1 {
                    ctx.targets.framebuffer(TargetName::MotionBlur).color_view(0)
                } else {
                    ctx.targets.framebuffer(TargetName::SceneColor(0)).color_view(0)
                };
                for parity in 0..2 {
                    let bloom = ctx
                        .targets
                        .framebuffer(TargetName::BloomAccum(parity))
                        .color_view(0);
                    self.bind_groups[motion][parity] =
                        Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                            label: Some("Scene Composite Bind Group"),
                            layout: self.layout.as_ref().unwrap(),
                            entries: &[
                                wgpu::BindGroupEntry {
                                    binding: 0,
                                    resource: self
                                        .uniforms
                                        .as_ref()
                                        .unwrap()
                                        .buffer()
                                        .as_entire_binding(),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 1,
                                    resource: wgpu::BindingResource::TextureView(scene),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 2,
                                    resource: wgpu::BindingResource::TextureView(bloom),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 3,
                                    resource: wgpu::BindingResource::TextureView(volumetric),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 4,
                                    resource: wgpu::BindingResource::Sampler(&samplers.linear),
                                },
                            ],
                        }));
                }
            }
            self.cached_generation = Some(ctx.targets_generation);
        }

        self.uniforms.as_ref().unwrap().write(
            ctx.queue,
            &CompositeUniforms {
                params: Vec4::new(
                    f32::from(u8::from(ctx.settings.bloom.enabled)),
                    f32::from(u8::from(ctx.settings.volumetrics)),
                    BLOOM_STRENGTH,
                    0.0,
                ),
            },
        );
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return;
        };
        let motion = usize::from(ctx.settings.motion_blur.enabled);
        let parity = usize::from(ctx.frame_index % 2 == 1);
        let Some(bind_group) = self.bind_groups[motion][parity].as_ref() else {
            return;
        };

        let view = ctx.targets.framebuffer(TargetName::Composite(0)).color_view(0);
        let mut pass = begin_fullscreen_pass(encoder, "Scene Composite", view);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

pub struct UiCompositePass {
    layout: Option<wgpu::BindGroupLayout>,
    pipeline: Option<wgpu::RenderPipeline>,
    uniforms: Option<UniformBuffer<CompositeUniforms>>,
    samplers: Option<Samplers>,
    bind_group: Option<wgpu::BindGroup>,
    cached_generation: Option<u64>,
}

impl UiCompositePass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: None,
            pipeline: None,
            uniforms: None,
            samplers: None,
            bind_group: None,
            cached_generation: None,
        }
    }
}

impl Default for UiCompositePass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for UiCompositePass {
    fn name(&self) -> &str {
        "UI Composite Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if self.layout.is_none() {
            self.samplers = Some(Samplers::new(ctx.device));
            self.uniforms = Some(UniformBuffer::new(ctx.device, "UI Composite Uniforms"));
            let layout = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("UI Composite Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        sampler_entry(3),
                    ],
                });
            self.pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "UI Composite Pipeline",
                ctx.shaders.module(PassKind::CompositingUi),
                &[&layout],
                &[hdr_color_target(), hdr_color_target()],
            ));
            self.layout = Some(layout);
        }

        if self.cached_generation != Some(ctx.targets_generation) {
            let samplers = self.samplers.as_ref().unwrap();
            let scene = ctx.targets.framebuffer(TargetName::Composite(0)).color_view(0);
            let ui = ctx.targets.framebuffer(TargetName::Ui).color_view(0);
            self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("UI Composite Bind Group"),
                layout: self.layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniforms.as_ref().unwrap().buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(scene),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(ui),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&samplers.linear),
                    },
                ],
            }));
            self.cached_generation = Some(ctx.targets_generation);
        }

        #[allow(clippy::cast_precision_loss)]
        self.uniforms.as_ref().unwrap().write(
            ctx.queue,
            &CompositeUniforms {
                params: Vec4::new(ctx.settings.ui_tone_mapping.shader_index() as f32, 0.0, 0.0, 0.0),
            },
        );
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let (Some(pipeline), Some(bind_group)) = (self.pipeline.as_ref(), self.bind_group.as_ref())
        else {
            return;
        };

        let composite = ctx.targets.framebuffer(TargetName::Composite(1));
        let ops = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            store: wgpu::StoreOp::Store,
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Composite"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: composite.color_view(0),
                    depth_slice: None,
                    resolve_target: None,
                    ops,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: composite.color_view(1),
                    depth_slice: None,
                    resolve_target: None,
                    ops,
                }),
            ],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
