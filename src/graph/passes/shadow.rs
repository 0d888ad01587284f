//! Shadow Map Passes
//!
//! Depth-only rendering into the per-light shadow slots. Directional and
//! spot casters share the 2D map slots; point casters render each of their
//! six cube faces in its own render pass with a per-face view-projection.
//!
//! Both passes skip entirely when shadows are disabled, and skip any
//! individual slot whose quality is `Off`, leaving the previous map
//! contents untouched.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::extracted::{vertex_buffer_layout, LightKind};
use crate::graph::node::RenderNode;
use crate::graph::shadow_math;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::{TargetName, SHADOW_SLOTS};
use crate::DEPTH_TEXTURE_FORMAT;

use super::common::{uniform_layout, ModelUniform, ObjectUniformPool};

/// World-space half-extent covered by directional shadow maps.
pub(crate) const DIRECTIONAL_EXTENT: f32 = 25.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ShadowViewUniform {
    light_view_proj: Mat4,
}

struct SlotBinding {
    uniform: UniformBuffer<ShadowViewUniform>,
    bind_group: wgpu::BindGroup,
}

fn make_slot(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &'static str,
) -> SlotBinding {
    let uniform = UniformBuffer::<ShadowViewUniform>::new(device, label);
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform.buffer().as_entire_binding(),
        }],
    });
    SlotBinding {
        uniform,
        bind_group,
    }
}

fn shadow_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    view_layout: &wgpu::BindGroupLayout,
    object_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[Some(view_layout), Some(object_layout)],
        immediate_size: 0,
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Shadow Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_buffer_layout()],
            compilation_options: Default::default(),
        },
        // Depth-only; no fragment stage.
        fragment: None,
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Front),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_TEXTURE_FORMAT,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::LessEqual),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn encode_casters(
    pass: &mut wgpu::RenderPass,
    ctx: &ExecuteContext,
    objects: &ObjectUniformPool<ModelUniform>,
) {
    for (index, mesh) in ctx.scene.meshes.iter().enumerate() {
        if !mesh.casts_shadows {
            continue;
        }
        pass.set_bind_group(1, objects.bind_group(index), &[]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

/// Renders directional and spot casters into the 2D shadow map slots.
pub struct DirectionalShadowPass {
    pipeline: Option<wgpu::RenderPipeline>,
    view_layout: Option<wgpu::BindGroupLayout>,
    objects: Option<ObjectUniformPool<ModelUniform>>,
    slots: Vec<SlotBinding>,
    active_slots: usize,
}

impl DirectionalShadowPass {
    /// Creates the pass with no GPU resources yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipeline: None,
            view_layout: None,
            objects: None,
            slots: Vec::new(),
            active_slots: 0,
        }
    }
}

impl Default for DirectionalShadowPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for DirectionalShadowPass {
    fn name(&self) -> &str {
        "Directional Shadow Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if self.view_layout.is_none() {
            self.view_layout = Some(uniform_layout(ctx.device, "Shadow View Layout"));
        }
        if self.objects.is_none() {
            self.objects = Some(ObjectUniformPool::new(ctx.device, "Shadow Model Uniform"));
        }
        if self.pipeline.is_none() {
            let pipeline = shadow_pipeline(
                ctx.device,
                ctx.shaders.module(PassKind::Shadow),
                self.view_layout.as_ref().unwrap(),
                self.objects.as_ref().unwrap().layout(),
            );
            self.pipeline = Some(pipeline);
        }

        self.active_slots = 0;
        if !ctx.settings.shadows {
            return;
        }

        let objects = self.objects.as_mut().unwrap();
        objects.ensure(ctx.device, ctx.scene.meshes.len());
        for (index, mesh) in ctx.scene.meshes.iter().enumerate() {
            objects.write(ctx.queue, index, &ModelUniform::from_transform(mesh.transform));
        }

        let casters = ctx
            .scene
            .lights
            .iter()
            .filter(|l| l.casts_shadows && l.kind != LightKind::Point)
            .take(SHADOW_SLOTS);
        for (slot, light) in casters.enumerate() {
            if self.slots.len() <= slot {
                let layout = self.view_layout.as_ref().unwrap();
                self.slots
                    .push(make_slot(ctx.device, layout, "Directional Shadow View"));
            }
            let view_proj = match light.kind {
                LightKind::Spot => shadow_math::spot_view_projection(
                    light.position,
                    light.direction,
                    light.spot_cos_cutoff,
                    ctx.settings.near,
                    ctx.settings.far,
                ),
                _ => shadow_math::directional_view_projection(
                    light.direction,
                    glam::Vec3::ZERO,
                    DIRECTIONAL_EXTENT,
                    ctx.settings.near,
                    ctx.settings.far,
                ),
            };
            self.slots[slot].uniform.write(
                ctx.queue,
                &ShadowViewUniform {
                    light_view_proj: view_proj,
                },
            );
            self.active_slots = slot + 1;
        }
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if self.active_slots == 0 {
            return;
        }
        let (Some(pipeline), Some(objects)) = (self.pipeline.as_ref(), self.objects.as_ref())
        else {
            return;
        };

        for slot in 0..self.active_slots {
            if ctx.targets.directional_shadow_quality(slot).resolution().is_none() {
                continue;
            }
            let framebuffer = ctx.targets.framebuffer(TargetName::DirectionalShadow(slot));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Directional Shadow"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: framebuffer.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.slots[slot].bind_group, &[]);
            encode_casters(&mut pass, ctx, objects);
        }
    }
}

/// Renders point casters into the cube shadow slots, one pass per face.
pub struct OmniShadowPass {
    pipeline: Option<wgpu::RenderPipeline>,
    view_layout: Option<wgpu::BindGroupLayout>,
    objects: Option<ObjectUniformPool<ModelUniform>>,
    /// Six face bindings per active slot, flattened.
    faces: Vec<SlotBinding>,
    active_slots: usize,
}

impl OmniShadowPass {
    /// Creates the pass with no GPU resources yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipeline: None,
            view_layout: None,
            objects: None,
            faces: Vec::new(),
            active_slots: 0,
        }
    }
}

impl Default for OmniShadowPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for OmniShadowPass {
    fn name(&self) -> &str {
        "Omni Shadow Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if self.view_layout.is_none() {
            self.view_layout = Some(uniform_layout(ctx.device, "Omni Shadow View Layout"));
        }
        if self.objects.is_none() {
            self.objects = Some(ObjectUniformPool::new(ctx.device, "Omni Shadow Model Uniform"));
        }
        if self.pipeline.is_none() {
            let pipeline = shadow_pipeline(
                ctx.device,
                ctx.shaders.module(PassKind::Shadow),
                self.view_layout.as_ref().unwrap(),
                self.objects.as_ref().unwrap().layout(),
            );
            self.pipeline = Some(pipeline);
        }

        self.active_slots = 0;
        if !ctx.settings.shadows {
            return;
        }

        let objects = self.objects.as_mut().unwrap();
        objects.ensure(ctx.device, ctx.scene.meshes.len());
        for (index, mesh) in ctx.scene.meshes.iter().enumerate() {
            objects.write(ctx.queue, index, &ModelUniform::from_transform(mesh.transform));
        }

        let projection = shadow_math::omni_projection(ctx.settings.near, ctx.settings.far);
        let casters = ctx
            .scene
            .lights
            .iter()
            .filter(|l| l.casts_shadows && l.kind == LightKind::Point)
            .take(SHADOW_SLOTS);
        for (slot, light) in casters.enumerate() {
            while self.faces.len() < (slot + 1) * 6 {
                let layout = self.view_layout.as_ref().unwrap();
                self.faces
                    .push(make_slot(ctx.device, layout, "Omni Shadow Face View"));
            }
            let views = shadow_math::point_light_face_views(light.position);
            for (face, view) in views.iter().enumerate() {
                self.faces[slot * 6 + face].uniform.write(
                    ctx.queue,
                    &ShadowViewUniform {
                        light_view_proj: projection * *view,
                    },
                );
            }
            self.active_slots = slot + 1;
        }
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if self.active_slots == 0 {
            return;
        }
        let (Some(pipeline), Some(objects)) = (self.pipeline.as_ref(), self.objects.as_ref())
        else {
            return;
        };

        for slot in 0..self.active_slots {
            if ctx.targets.omni_shadow_quality(slot).resolution().is_none() {
                continue;
            }
            let framebuffer = ctx.targets.framebuffer(TargetName::OmniShadow(slot));
            let cube = framebuffer.attachment(0);
            for face in 0..6 {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Omni Shadow Face"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: cube.face_view(face),
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.faces[slot * 6 + face].bind_group, &[]);
                encode_casters(&mut pass, ctx, objects);
            }
        }
    }
}
