//! Shared pass plumbing: GPU-layout uniform structs, the object-uniform
//! pool for per-mesh bindings, sampler set, and fullscreen pipeline
//! construction used by every post-processing node.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::shaders::UniformBuffer;

/// Matches the WGSL `Camera` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection.
    pub view_proj: Mat4,
    /// xyz eye position.
    pub position: Vec4,
}

/// Matches the WGSL `Model` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    /// Model matrix.
    pub model: Mat4,
    /// Inverse-transpose of the model matrix.
    pub normal: Mat4,
}

impl ModelUniform {
    /// Builds the pair from one model matrix.
    #[must_use]
    pub fn from_transform(transform: Mat4) -> Self {
        Self {
            model: transform,
            normal: transform.inverse().transpose(),
        }
    }
}

/// Matches the WGSL `Material` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniform {
    /// Base color with alpha.
    pub base_color: Vec4,
    /// Shading parameters; interpretation depends on the shading model.
    pub params: Vec4,
}

/// Single-uniform bind group layout visible to both stages.
#[must_use]
pub fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Growable pool of per-object uniform buffers with their bind groups.
///
/// Geometry passes draw one mesh per entry; the pool grows to the largest
/// mesh count seen and is reused across frames.
pub struct ObjectUniformPool<T: Pod> {
    layout: wgpu::BindGroupLayout,
    label: &'static str,
    entries: Vec<(UniformBuffer<T>, wgpu::BindGroup)>,
}

impl<T: Pod> ObjectUniformPool<T> {
    /// Creates an empty pool with its own single-uniform layout.
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            layout: uniform_layout(device, label),
            label,
            entries: Vec::new(),
        }
    }

    /// Layout for pipeline construction.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Grows the pool to hold at least `count` entries.
    pub fn ensure(&mut self, device: &wgpu::Device, count: usize) {
        while self.entries.len() < count {
            let buffer = UniformBuffer::<T>::new(device, self.label);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(self.label),
                layout: &self.layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.buffer().as_entire_binding(),
                }],
            });
            self.entries.push((buffer, bind_group));
        }
    }

    /// Uploads `value` to entry `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` was never reserved through
    /// [`ObjectUniformPool::ensure`].
    pub fn write(&self, queue: &wgpu::Queue, index: usize, value: &T) {
        self.entries[index].0.write(queue, value);
    }

    /// Bind group of entry `index`.
    #[inline]
    #[must_use]
    pub fn bind_group(&self, index: usize) -> &wgpu::BindGroup {
        &self.entries[index].1
    }
}

/// The sampler set shared by the pipeline, created once.
pub struct Samplers {
    /// Clamped bilinear.
    pub linear: wgpu::Sampler,
    /// Clamped nearest, for the position and material G-buffer planes.
    pub nearest: wgpu::Sampler,
    /// Repeating nearest, for the AO rotation-noise tile.
    pub repeat: wgpu::Sampler,
    /// Less-equal comparison, for shadow maps.
    pub comparison: wgpu::Sampler,
}

impl Samplers {
    /// Creates all four samplers.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let clamp = wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        };
        Self {
            linear: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Linear Sampler"),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..clamp.clone()
            }),
            nearest: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Nearest Sampler"),
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                ..clamp.clone()
            }),
            repeat: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Repeat Sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            }),
            comparison: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Shadow Comparison Sampler"),
                compare: Some(wgpu::CompareFunction::LessEqual),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..clamp
            }),
        }
    }
}

/// Builds a fullscreen-triangle pipeline over `module` with the given
/// color targets.
#[must_use]
pub fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    targets: &[Option<wgpu::ColorTargetState>],
) -> wgpu::RenderPipeline {
    let bind_group_layouts: Vec<Option<&wgpu::BindGroupLayout>> =
        bind_group_layouts.iter().map(|l| Some(*l)).collect();
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &bind_group_layouts,
        immediate_size: 0,
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// HDR color target with replace blending.
#[must_use]
pub fn hdr_color_target() -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format: crate::HDR_TEXTURE_FORMAT,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })
}

/// Begins a single-target fullscreen color pass clearing to black.
#[must_use]
pub fn begin_fullscreen_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
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
    })
}

/// Bind-group layout for one fragment-visible texture binding.
#[must_use]
pub fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind-group layout for one fragment-visible filtering sampler.
#[must_use]
pub fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Bind-group layout for one fragment-visible uniform buffer.
#[must_use]
pub fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
