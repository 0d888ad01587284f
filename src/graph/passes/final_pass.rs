//! Final Pass
//!
//! Tone-maps the merged composite plane and writes it to the swapchain
//! texture. This is the only pass whose color target is not owned by the
//! [`RenderTargetSet`](crate::targets::RenderTargetSet), so the pipeline is
//! built against the surface format handed in at construction.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::node::RenderNode;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;

use super::common::{
    fullscreen_pipeline, sampler_entry, texture_entry, uniform_entry, Samplers,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FinalUniforms {
    params: Vec4,
}

pub struct FinalPass {
    surface_format: wgpu::TextureFormat,
    layout: Option<wgpu::BindGroupLayout>,
    pipeline: Option<wgpu::RenderPipeline>,
    uniforms: Option<UniformBuffer<FinalUniforms>>,
    samplers: Option<Samplers>,
    bind_group: Option<wgpu::BindGroup>,
    cached_generation: Option<u64>,
}

impl FinalPass {
    #[must_use]
    pub fn new(surface_format: wgpu::TextureFormat) -> Self {
        Self {
            surface_format,
            layout: None,
            pipeline: None,
            uniforms: None,
            samplers: None,
            bind_group: None,
            cached_generation: None,
        }
    }
}

impl RenderNode for FinalPass {
    fn name(&self) -> &str {
        "Final Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if self.layout.is_none() {
            self.samplers = Some(Samplers::new(ctx.device));
            self.uniforms = Some(UniformBuffer::new(ctx.device, "Final Uniforms"));
            let layout = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Final Layout"),
                    entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
                });
            self.pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Final Pipeline",
                ctx.shaders.module(PassKind::Final),
                &[&layout],
                &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            ));
            self.layout = Some(layout);
        }

        if self.cached_generation != Some(ctx.targets_generation) {
            let samplers = self.samplers.as_ref().unwrap();
            let merged = ctx.targets.framebuffer(TargetName::Composite(1)).color_view(0);
            self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Final Bind Group"),
                layout: self.layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniforms.as_ref().unwrap().buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(merged),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&samplers.linear),
                    },
                ],
            }));
            self.cached_generation = Some(ctx.targets_generation);
        }

        #[allow(clippy::cast_precision_loss)]
        self.uniforms.as_ref().unwrap().write(
            ctx.queue,
            &FinalUniforms {
                params: Vec4::new(
                    ctx.settings.scene_tone_mapping.shader_index() as f32,
                    0.0,
                    0.0,
                    0.0,
                ),
            },
        );
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let (Some(pipeline), Some(bind_group)) = (self.pipeline.as_ref(), self.bind_group.as_ref())
        else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Final"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: ctx.surface_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
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
