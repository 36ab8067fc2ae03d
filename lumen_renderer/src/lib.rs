/*!
# Lumen Renderer

CPU-side decision pipeline of a forward 3D renderer.

Every frame the renderer decides what to draw, in which order, with which
lights and where shadows live, then hands sorted batches to a caller-supplied
[`DrawSubmitter`](lumen::render::DrawSubmitter). It never touches a GPU.

## Architecture

- **AreaAllocator**: 2D rectangle packer carving shadow views out of atlases
- **LightListCache**: shares one packed light list between renderables lit
  by the same ordered set of lights
- **ShadowMap / ShadowView**: atlases, per-light rectangles and caster queues
- **BatchQueue**: sort keys, back-to-front alpha ordering and instancing
- **Renderer**: the per-frame state machine tying it all together

Scene nodes, lights and resources are plain data owned by the caller
(`Scene`, `ResourceRegistry`). Visibility and light interaction are
strategies behind traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod math;
pub mod camera;
pub mod utils;
pub mod resource;
pub mod scene;
pub mod renderer;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Global logger facade
    pub use crate::engine::Engine;

    // Renderer
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Render sub-module with all pipeline types
    pub mod render {
        pub use crate::renderer::*;
    }

    pub mod math {
        pub use crate::math::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
