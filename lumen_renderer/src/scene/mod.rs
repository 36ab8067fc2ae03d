//! Scene module
//!
//! Geometry nodes and lights the renderer consumes, plus the
//! visibility and light-interaction strategies that feed a frame.

mod bounds;
mod geometry_node;
mod light;
mod scene;
mod culler;
mod light_interaction;

pub use bounds::AABB;
pub use geometry_node::{GeometryNode, GeometryType, NodeKey, SourceBatch};
pub use light::{
    Light, LightKey, LightType,
    DEFAULT_RANGE, DEFAULT_SPOT_FOV, DEFAULT_SHADOW_MAP_SIZE, DEFAULT_SHADOW_SPLITS,
    DEFAULT_FADE_START, DEFAULT_DEPTH_BIAS, DEFAULT_SLOPE_SCALED_DEPTH_BIAS,
};
pub(crate) use light::up_for;
pub use scene::Scene;
pub use culler::{VisibilityQuery, VisibleNode, VisibleSet, BruteForceCuller, FrustumCuller};
pub use light_interaction::{LightInteraction, VolumeLightInteraction};
