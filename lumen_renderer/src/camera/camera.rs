/// Camera - view and projection as seen by the renderer.
///
/// The caller owns and drives the camera. The renderer reads it to
/// cull nodes, compute sort distances and fit directional shadow splits
/// around the view.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

/// View/projection pair with its clip range and derived frustum.
///
/// Projections are expected in glam's right-handed, [0, 1] depth form
/// (`Mat4::perspective_rh`, `Mat4::orthographic_rh`).
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
    near_clip: f32,
    far_clip: f32,
}

impl Camera {
    /// Create a camera. The frustum is extracted from `projection * view`.
    pub fn new(view: Mat4, projection: Mat4, near_clip: f32, far_clip: f32) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            frustum: Frustum::from_view_projection(&(projection * view)),
            near_clip,
            far_clip,
        }
    }

    /// Perspective camera at `eye` looking at `target`.
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near_clip: f32,
        far_clip: f32,
    ) -> Self {
        Self::new(
            Mat4::look_at_rh(eye, target, up),
            Mat4::perspective_rh(fov_y, aspect, near_clip, far_clip),
            near_clip,
            far_clip,
        )
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn near_clip(&self) -> f32 {
        self.near_clip
    }

    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        self.view_matrix.inverse().w_axis.truncate()
    }

    /// World-space viewing direction (unit length).
    pub fn forward(&self) -> Vec3 {
        (-self.view_matrix.inverse().z_axis.truncate()).normalize_or_zero()
    }

    /// View-space depth of a world point (distance along the view axis).
    pub fn distance(&self, world_point: Vec3) -> f32 {
        -self.view_matrix.transform_point3(world_point).z
    }

    /// World-space corners of the view volume between two view depths.
    ///
    /// Order: near (bl, br, tr, tl), then far (bl, br, tr, tl). Depths are
    /// clamped to the camera clip range.
    pub fn split_corners(&self, near: f32, far: f32) -> [Vec3; 8] {
        let range = (self.far_clip - self.near_clip).max(f32::EPSILON);
        let t_near = ((near - self.near_clip) / range).clamp(0.0, 1.0);
        let t_far = ((far - self.near_clip) / range).clamp(0.0, 1.0);

        let inv_vp = self.view_projection_matrix().inverse();
        let ndc_xy = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut corners = [Vec3::ZERO; 8];
        for (i, &(x, y)) in ndc_xy.iter().enumerate() {
            let near_point = inv_vp.project_point3(Vec3::new(x, y, 0.0));
            let far_point = inv_vp.project_point3(Vec3::new(x, y, 1.0));
            corners[i] = near_point.lerp(far_point, t_near);
            corners[i + 4] = near_point.lerp(far_point, t_far);
        }
        corners
    }

    // ===== SETTERS =====

    /// Set the view matrix and re-derive the frustum.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }

    /// Set the projection and clip range and re-derive the frustum.
    pub fn set_projection(&mut self, matrix: Mat4, near_clip: f32, far_clip: f32) {
        self.projection_matrix = matrix;
        self.near_clip = near_clip;
        self.far_clip = far_clip;
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }

    /// Override the culling frustum (e.g. a frozen debug frustum).
    pub fn set_frustum(&mut self, frustum: Frustum) {
        self.frustum = frustum;
    }
}

impl Default for Camera {
    /// Identity view and projection over a [0, 1] depth range
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
