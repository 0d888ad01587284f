//! Render-Target Resource Model
//!
//! | Layer | Role |
//! |---|---|
//! | [`attachment`] | Framebuffers and their GPU attachments |
//! | [`layout`] | Pure size/shape plan for the whole target set |
//! | [`set`] | Realized set, resize and shadow-quality updates |

pub mod attachment;
pub mod layout;
pub mod set;

pub use attachment::{
    Attachment, AttachmentDesc, AttachmentKind, AttachmentTarget, FilterMode, Framebuffer,
};
pub use layout::{
    plan_targets, FramebufferPlan, TargetName, TargetPlan, AVATAR_RESOLUTION, BLOOM_LEVELS,
    SHADOW_SLOTS,
};
pub use set::RenderTargetSet;
