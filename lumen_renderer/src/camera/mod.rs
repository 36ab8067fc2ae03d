//! Camera module - camera and frustum.
//!
//! Cameras are owned and driven by the caller. The renderer only reads
//! them: view/projection for sort distances and shadow split fitting,
//! the frustum for visibility culling.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
