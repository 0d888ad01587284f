//! Error Types
//!
//! The main error type [`RenderError`] covers the failure modes of the
//! rendering layer. The taxonomy is deliberately small:
//!
//! - **Fatal startup failures** (shader compilation, device acquisition)
//!   are returned as `Err` from constructors; the caller reports them and
//!   terminates, since rendering cannot proceed without them.
//! - **Configuration-range errors** never reach this enum: they are clamped
//!   at the setter with a `log::warn!` and execution continues.
//! - **Per-frame invariant violations** (incomplete framebuffer wiring,
//!   mismatched attachment resolutions) are programming errors, asserted
//!   rather than propagated.

use thiserror::Error;

/// The main error type for the rendering layer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// A pass shader failed to compile or validate. Fatal at startup.
    #[error("Shader compilation failed for `{label}`: {message}")]
    ShaderCompile {
        /// Which shader program failed
        label: &'static str,
        /// Validation message from the WGSL front end
        message: String,
    },
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
