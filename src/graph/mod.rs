//! Frame Graph
//!
//! The render loop is organized as a linear list of nodes, each a
//! self-contained pass with a `prepare` phase (uniform uploads and bind
//! group maintenance) and a `run` phase (command encoding). See
//! [`frame::FrameGraph`] for the driver and [`passes`] for the node
//! implementations.

pub mod context;
pub mod extracted;
pub mod frame;
pub mod node;
pub mod passes;
pub mod shadow_math;

pub use context::{ExecuteContext, PrepareContext};
pub use extracted::{
    vertex_buffer_layout, ExtractedCamera, ExtractedLight, ExtractedMesh, ExtractedScene,
    LightKind, MaterialParams,
};
pub use frame::FrameGraph;
pub use node::RenderNode;
