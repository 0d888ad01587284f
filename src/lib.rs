#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod graph;
pub mod post;
pub mod renderer;
pub mod settings;
pub mod shaders;
pub mod targets;

pub use errors::{RenderError, Result};
pub use graph::extracted::{
    ExtractedCamera, ExtractedLight, ExtractedMesh, ExtractedScene, LightKind, MaterialParams,
};
pub use post::tone::ToneMapping;
pub use renderer::Renderer;
pub use settings::{
    BlurKernel, BloomSettings, GraphicsSettings, MotionBlurSettings, ShadingModel, ShadowQuality,
    SsaoSettings,
};
pub use targets::{Framebuffer, RenderTargetSet, TargetName};

/// HDR color attachment format shared by every color render target.
pub const HDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Depth format for shadow maps and the G-buffer depth attachment.
pub const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Combined depth-stencil format for the multisample framebuffer.
pub const DEPTH_STENCIL_TEXTURE_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Depth24PlusStencil8;

/// Sample count used by multisampled framebuffers.
pub const MSAA_SAMPLE_COUNT: u32 = 4;
