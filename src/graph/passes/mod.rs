//! Render Pass Nodes
//!
//! Each submodule implements one stage of the deferred pipeline as a
//! [`RenderNode`](crate::graph::node::RenderNode). The renderer assembles
//! them into a [`FrameGraph`](crate::graph::frame::FrameGraph) in fixed
//! order:
//!
//! | Node | Reads | Writes |
//! | --- | --- | --- |
//! | [`DirectionalShadowPass`] | casters | `DirectionalShadow(.)` |
//! | [`OmniShadowPass`] | casters | `OmniShadow(.)` |
//! | [`GeometryPass`] | meshes | `GBuffer` |
//! | [`SsaoPass`] | `GBuffer` | `AmbientOcclusion(.)` |
//! | [`ColorPass`] | meshes, shadow maps, `AmbientOcclusion(0)` | `Multisample` → `SceneColor(.)` |
//! | [`BloomPass`] | `SceneColor(1)` | `BloomDown/PingPong/UpSample/BloomAccum` |
//! | [`VolumetricPass`] | `GBuffer`, shadow map | `Volumetric(.)` |
//! | [`MotionBlurPass`] | `SceneColor(0)`, `GBuffer` | `MotionBlur` |
//! | [`SceneCompositePass`] | scene, bloom, volumetric | `Composite(0)` |
//! | [`UiCompositePass`] | `Composite(0)`, `Ui` | `Composite(1)` |
//! | [`FinalPass`] | `Composite(1)` | swapchain |

mod bloom;
mod color;
mod common;
mod compositing;
mod final_pass;
mod geometry;
mod motion_blur;
mod shadow;
mod ssao;
mod volumetric;

pub use bloom::BloomPass;
pub use color::ColorPass;
pub use compositing::{SceneCompositePass, UiCompositePass};
pub use final_pass::FinalPass;
pub use geometry::GeometryPass;
pub use motion_blur::MotionBlurPass;
pub use shadow::{DirectionalShadowPass, OmniShadowPass};
pub use ssao::SsaoPass;
pub use volumetric::VolumetricPass;
