//! Resource module
//!
//! CPU-side descriptions of the GPU resources batches refer to:
//! geometries (draw ranges), shaders and materials with per-pass state.
//! The renderer only reads these; uploading them is the submitter's job.

pub mod geometry;
pub mod material;
pub mod shader;
mod resource_registry;

pub use geometry::{Geometry, GeometryDesc, GeometryKey};
pub use material::{
    Material, MaterialDesc, MaterialKey,
    Pass, PassDesc, PassRef, PassType, BlendMode,
};
pub use shader::{Shader, ShaderDesc, ShaderKey, ShaderProgram, ProgramBits};
pub use resource_registry::ResourceRegistry;
