/// Shadow maps and shadow views.
///
/// A ShadowMap is an atlas texture whose area is handed out to shadow
/// views through an AreaAllocator. Each view renders its casters from
/// one light viewpoint (a directional split, a point light cube face or a
/// spot cone) into its own rectangle of the atlas, and owns one BatchQueue
/// slot of the map. Maps persist across frames; `clear` releases the
/// rectangles and rewinds the queue slots without freeing them.

use glam::{IVec2, Mat4, Vec3, Vec4};
use crate::camera::{Camera, Frustum};
use crate::math::{AreaAllocator, IntRect};
use crate::scene::{up_for, Light, LightKey};
use super::batch::{BatchQueue, SortMode};
use super::config::ShadowFormat;

/// Map holding directional light views
pub const DIRECTIONAL_SHADOW_MAP: usize = 0;
/// Atlas shared by point and spot lights
pub const SHARED_SHADOW_MAP: usize = 1;

/// Backing texture of a shadow map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowTextureDesc {
    pub width: i32,
    pub height: i32,
    pub format: ShadowFormat,
}

impl ShadowTextureDesc {
    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    /// Texture memory footprint
    pub fn byte_size(&self) -> u64 {
        self.width.max(0) as u64 * self.height.max(0) as u64 * self.format.bytes_per_texel() as u64
    }
}

/// Handle of a shadow view, valid until the next `begin_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowViewHandle(pub(crate) u32);

impl ShadowViewHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One shadow-casting viewpoint inside a shadow map
#[derive(Debug, Clone)]
pub struct ShadowView {
    pub(crate) light: LightKey,
    pub(crate) map: usize,
    pub(crate) viewport: IntRect,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) frustum: Frustum,
    pub(crate) shadow_matrix: Mat4,
    pub(crate) depth_bias: f32,
    pub(crate) slope_scaled_depth_bias: f32,
    pub(crate) far_clip: f32,
    pub(crate) split: Option<(f32, f32)>,
    pub(crate) queue: usize,
    pub(crate) collected: bool,
}

impl ShadowView {
    pub fn light(&self) -> LightKey {
        self.light
    }

    /// Index of the shadow map holding this view
    pub fn map(&self) -> usize {
        self.map
    }

    /// Rectangle of the atlas rendered by this view
    pub fn viewport(&self) -> IntRect {
        self.viewport
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Casters outside this volume are not rendered
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// World space to atlas texture coordinates of this view
    pub fn shadow_matrix(&self) -> &Mat4 {
        &self.shadow_matrix
    }

    pub fn depth_bias(&self) -> f32 {
        self.depth_bias
    }

    pub fn slope_scaled_depth_bias(&self) -> f32 {
        self.slope_scaled_depth_bias
    }

    /// Far plane distance of the shadow camera
    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    /// Camera depth range covered by a directional split
    pub fn split(&self) -> Option<(f32, f32)> {
        self.split
    }

    /// BatchQueue slot in the owning shadow map
    pub fn queue(&self) -> usize {
        self.queue
    }

    /// Whether the caster queue was filled this frame
    pub fn is_collected(&self) -> bool {
        self.collected
    }
}

/// Atlas texture, rectangle allocator and per-view batch queues
#[derive(Debug)]
pub struct ShadowMap {
    allocator: AreaAllocator,
    texture: ShadowTextureDesc,
    views: Vec<ShadowViewHandle>,
    queues: Vec<BatchQueue>,
    free_queue_idx: usize,
}

impl ShadowMap {
    pub fn new(texture: ShadowTextureDesc) -> Self {
        Self {
            allocator: AreaAllocator::new(texture.width, texture.height),
            texture,
            views: Vec::new(),
            queues: Vec::new(),
            free_queue_idx: 0,
        }
    }

    pub fn texture(&self) -> &ShadowTextureDesc {
        &self.texture
    }

    pub fn size(&self) -> IVec2 {
        self.texture.size()
    }

    /// Release all rectangles and views, rewind the queue slots.
    pub fn clear(&mut self) {
        self.allocator.reset();
        self.views.clear();
        self.free_queue_idx = 0;
    }

    /// Reserve a rectangle of the atlas. `None` when the atlas is full.
    pub fn allocate_rect(&mut self, width: i32, height: i32) -> Option<IntRect> {
        self.allocator.allocate(width, height)
    }

    /// Take the next queue slot, cleared. Grows the pool when exhausted.
    pub fn acquire_queue(&mut self) -> usize {
        if self.free_queue_idx == self.queues.len() {
            self.queues.push(BatchQueue::new(SortMode::State));
        } else {
            self.queues[self.free_queue_idx].clear();
        }
        let index = self.free_queue_idx;
        self.free_queue_idx += 1;
        index
    }

    pub(crate) fn add_view(&mut self, view: ShadowViewHandle) {
        self.views.push(view);
    }

    /// Views of this frame, in allocation order
    pub fn views(&self) -> &[ShadowViewHandle] {
        &self.views
    }

    pub fn queue(&self, index: usize) -> Option<&BatchQueue> {
        self.queues[..self.free_queue_idx].get(index)
    }

    pub(crate) fn queue_mut(&mut self, index: usize) -> Option<&mut BatchQueue> {
        self.queues[..self.free_queue_idx].get_mut(index)
    }

    /// Queue slots handed out this frame
    pub fn used_queues(&self) -> usize {
        self.free_queue_idx
    }

    /// Queue slots allocated across all frames
    pub fn queue_pool_size(&self) -> usize {
        self.queues.len()
    }

    pub fn allocator(&self) -> &AreaAllocator {
        &self.allocator
    }
}

/// Matrix from clip space to the texture coordinates of `viewport`.
///
/// Y is flipped, depth stays in [0, 1].
pub fn shadow_adjust_matrix(viewport: IntRect, atlas_size: IVec2) -> Mat4 {
    let atlas = atlas_size.max(IVec2::ONE).as_vec2();
    let scale_x = 0.5 * viewport.width() as f32 / atlas.x;
    let scale_y = 0.5 * viewport.height() as f32 / atlas.y;
    let offset_x = viewport.left as f32 / atlas.x + scale_x;
    let offset_y = viewport.top as f32 / atlas.y + scale_y;

    Mat4::from_cols(
        Vec4::new(scale_x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -scale_y, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(offset_x, offset_y, 0.0, 1.0),
    )
}

/// Orthographic shadow camera fitted around one camera split.
///
/// The projection is a cube around the bounding sphere of the split
/// slice, pulled back towards the light so that casters between the light
/// and the slice are kept. Returns (view, projection, far clip).
pub(crate) fn directional_split_camera(
    light: &Light,
    camera: &Camera,
    near: f32,
    far: f32,
) -> (Mat4, Mat4, f32) {
    let corners = camera.split_corners(near, far);
    let center = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
    let radius = corners
        .iter()
        .map(|corner| corner.distance(center))
        .fold(0.0f32, f32::max)
        .max(f32::EPSILON);
    let extrusion = light.max_shadow_distance().max(radius);

    let direction = light.direction();
    let eye = center - direction * (radius + extrusion);
    let far_clip = 2.0 * radius + extrusion;

    let view = Mat4::look_to_rh(eye, direction, up_for(direction));
    let projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, far_clip);
    (view, projection, far_clip)
}

#[cfg(test)]
#[path = "shadow_tests.rs"]
mod tests;
