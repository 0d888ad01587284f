//! Geometry Pass
//!
//! Fills the G-buffer: world position, world normal, albedo, and material
//! parameters into four color planes with a private depth buffer. The AO,
//! volumetric, and motion-blur passes all read from here, so this pass
//! runs whenever any of them is enabled.

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::extracted::vertex_buffer_layout;
use crate::graph::node::RenderNode;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;
use crate::{DEPTH_TEXTURE_FORMAT, HDR_TEXTURE_FORMAT};

use super::common::{
    uniform_layout, CameraUniform, MaterialUniform, ModelUniform, ObjectUniformPool,
};

pub struct GeometryPass {
    pipeline: Option<wgpu::RenderPipeline>,
    camera_uniform: Option<UniformBuffer<CameraUniform>>,
    camera_bind_group: Option<wgpu::BindGroup>,
    models: Option<ObjectUniformPool<ModelUniform>>,
    materials: Option<ObjectUniformPool<MaterialUniform>>,
    mesh_count: usize,
}

impl GeometryPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipeline: None,
            camera_uniform: None,
            camera_bind_group: None,
            models: None,
            materials: None,
            mesh_count: 0,
        }
    }

    fn needed(ctx: &PrepareContext) -> bool {
        ctx.settings.ssao.enabled || ctx.settings.volumetrics || ctx.settings.motion_blur.enabled
    }
}

impl Default for GeometryPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for GeometryPass {
    fn name(&self) -> &str {
        "Geometry Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.mesh_count = 0;
        if !Self::needed(ctx) {
            return;
        }

        if self.models.is_none() {
            self.models = Some(ObjectUniformPool::new(ctx.device, "G-Buffer Model Uniform"));
        }
        if self.materials.is_none() {
            self.materials = Some(ObjectUniformPool::new(
                ctx.device,
                "G-Buffer Material Uniform",
            ));
        }
        if self.camera_uniform.is_none() {
            let camera_layout = uniform_layout(ctx.device, "G-Buffer Camera Layout");
            let uniform = UniformBuffer::<CameraUniform>::new(ctx.device, "G-Buffer Camera");
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("G-Buffer Camera"),
                layout: &camera_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.buffer().as_entire_binding(),
                }],
            });

            let pipeline_layout =
                ctx.device
                    .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("G-Buffer Pipeline Layout"),
                        bind_group_layouts: &[
                            Some(&camera_layout),
                            Some(self.models.as_ref().unwrap().layout()),
                            Some(self.materials.as_ref().unwrap().layout()),
                        ],
                        immediate_size: 0,
                    });
            let module = ctx.shaders.module(PassKind::GBuffer);
            let color_target = Some(wgpu::ColorTargetState {
                format: HDR_TEXTURE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            });
            let pipeline = ctx
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("G-Buffer Pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module,
                        entry_point: Some("vs_main"),
                        buffers: &[vertex_buffer_layout()],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module,
                        entry_point: Some("fs_main"),
                        targets: &[
                            color_target.clone(),
                            color_target.clone(),
                            color_target.clone(),
                            color_target,
                        ],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        cull_mode: Some(wgpu::Face::Back),
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_TEXTURE_FORMAT,
                        depth_write_enabled: Some(true),
                        depth_compare: Some(wgpu::CompareFunction::Less),
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                });

            self.camera_uniform = Some(uniform);
            self.camera_bind_group = Some(bind_group);
            self.pipeline = Some(pipeline);
        }

        self.camera_uniform.as_ref().unwrap().write(
            ctx.queue,
            &CameraUniform {
                view_proj: ctx.scene.camera.view_proj(),
                position: ctx.scene.camera.position.extend(1.0),
            },
        );

        let models = self.models.as_mut().unwrap();
        let materials = self.materials.as_mut().unwrap();
        models.ensure(ctx.device, ctx.scene.meshes.len());
        materials.ensure(ctx.device, ctx.scene.meshes.len());
        for (index, mesh) in ctx.scene.meshes.iter().enumerate() {
            models.write(ctx.queue, index, &ModelUniform::from_transform(mesh.transform));
            materials.write(
                ctx.queue,
                index,
                &MaterialUniform {
                    base_color: mesh.material.base_color,
                    params: glam::Vec4::new(
                        mesh.material.shininess,
                        mesh.material.specular,
                        mesh.material.roughness,
                        0.0,
                    ),
                },
            );
        }
        self.mesh_count = ctx.scene.meshes.len();
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if self.mesh_count == 0 {
            return;
        }
        let (Some(pipeline), Some(camera), Some(models), Some(materials)) = (
            self.pipeline.as_ref(),
            self.camera_bind_group.as_ref(),
            self.models.as_ref(),
            self.materials.as_ref(),
        ) else {
            return;
        };

        let framebuffer = ctx.targets.framebuffer(TargetName::GBuffer);
        let attachment = |index: usize| {
            Some(wgpu::RenderPassColorAttachment {
                view: framebuffer.color_view(index),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry"),
            color_attachments: &[attachment(0), attachment(1), attachment(2), attachment(3)],
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
        pass.set_bind_group(0, camera, &[]);
        for (index, mesh) in ctx.scene.meshes.iter().enumerate() {
            pass.set_bind_group(1, models.bind_group(index), &[]);
            pass.set_bind_group(2, materials.bind_group(index), &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
