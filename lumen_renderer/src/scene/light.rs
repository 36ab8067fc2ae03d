/// Light - a dynamic light source in the scene.
///
/// Besides its lighting parameters, a light describes how its shadow
/// views are laid out when it gets a rectangle in a shadow atlas:
///
/// - Directional: one view per split (1 to 4), tiled 1x1, 2x1 or 2x2
/// - Point: six cube faces, tiled 3x2
/// - Spot: one perspective view

use glam::{IVec2, Mat4, Vec3, Vec4};
use crate::camera::Frustum;
use crate::utils::next_power_of_two;
use super::bounds::AABB;

slotmap::new_key_type! {
    /// Stable key for a light in a Scene
    pub struct LightKey;
}

pub const DEFAULT_RANGE: f32 = 10.0;
pub const DEFAULT_SPOT_FOV: f32 = 30.0;
pub const DEFAULT_SHADOW_MAP_SIZE: i32 = 512;
pub const DEFAULT_SHADOW_SPLITS: [f32; 4] = [10.0, 50.0, 150.0, 0.0];
pub const DEFAULT_FADE_START: f32 = 0.9;
pub const DEFAULT_DEPTH_BIAS: f32 = 5.0;
pub const DEFAULT_SLOPE_SCALED_DEPTH_BIAS: f32 = 0.5;

/// Near clip of point and spot shadow cameras, relative to range
const SHADOW_NEAR_FACTOR: f32 = 0.01;

/// Light type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LightType {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightType {
    /// Shader light-slot bits: type + 1, so 0 marks an empty slot
    pub fn bits(self) -> u8 {
        self as u8 + 1
    }
}

/// Point light cube faces: +X, -X, +Y, -Y, +Z, -Z with their up vectors
const POINT_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

#[derive(Debug, Clone)]
pub struct Light {
    light_type: LightType,
    /// RGB color, alpha is specular intensity
    color: Vec4,
    position: Vec3,
    direction: Vec3,
    range: f32,
    /// Spot cone angle in degrees
    fov: f32,
    light_mask: u32,
    cast_shadows: bool,
    shadow_map_size: i32,
    shadow_splits: [f32; 4],
    shadow_fade_start: f32,
    shadow_max_strength: f32,
    depth_bias: f32,
    slope_scaled_depth_bias: f32,
    enabled: bool,
}

impl Light {
    fn with_type(light_type: LightType) -> Self {
        Self {
            light_type,
            color: Vec4::new(1.0, 1.0, 1.0, 0.5),
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            range: DEFAULT_RANGE,
            fov: DEFAULT_SPOT_FOV,
            light_mask: u32::MAX,
            cast_shadows: false,
            shadow_map_size: DEFAULT_SHADOW_MAP_SIZE,
            shadow_splits: DEFAULT_SHADOW_SPLITS,
            shadow_fade_start: DEFAULT_FADE_START,
            shadow_max_strength: 0.0,
            depth_bias: DEFAULT_DEPTH_BIAS,
            slope_scaled_depth_bias: DEFAULT_SLOPE_SCALED_DEPTH_BIAS,
            enabled: true,
        }
    }

    pub fn directional(direction: Vec3) -> Self {
        let mut light = Self::with_type(LightType::Directional);
        light.set_direction(direction);
        light
    }

    pub fn point(position: Vec3, range: f32) -> Self {
        let mut light = Self::with_type(LightType::Point);
        light.position = position;
        light.set_range(range);
        light
    }

    /// Spot light with a cone of `fov` degrees.
    pub fn spot(position: Vec3, direction: Vec3, range: f32, fov: f32) -> Self {
        let mut light = Self::with_type(LightType::Spot);
        light.position = position;
        light.set_direction(direction);
        light.set_range(range);
        light.set_fov(fov);
        light
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Enable shadows with the given face size (rounded up to a power of two).
    pub fn with_shadows(mut self, shadow_map_size: i32) -> Self {
        self.cast_shadows = true;
        self.set_shadow_map_size(shadow_map_size);
        self
    }

    pub fn with_shadow_splits(mut self, splits: [f32; 4]) -> Self {
        self.shadow_splits = splits;
        self
    }

    pub fn with_depth_bias(mut self, constant: f32, slope_scaled: f32) -> Self {
        self.set_depth_bias(constant, slope_scaled);
        self
    }

    pub fn with_light_mask(mut self, light_mask: u32) -> Self {
        self.light_mask = light_mask;
        self
    }

    // ===== GETTERS =====

    pub fn light_type(&self) -> LightType {
        self.light_type
    }

    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit direction the light points to
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Cosine of the spot half-angle
    pub fn cutoff(&self) -> f32 {
        (self.fov * 0.5).to_radians().cos()
    }

    pub fn light_mask(&self) -> u32 {
        self.light_mask
    }

    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    pub fn shadow_map_size(&self) -> i32 {
        self.shadow_map_size
    }

    pub fn shadow_splits(&self) -> [f32; 4] {
        self.shadow_splits
    }

    pub fn shadow_fade_start(&self) -> f32 {
        self.shadow_fade_start
    }

    pub fn shadow_max_strength(&self) -> f32 {
        self.shadow_max_strength
    }

    pub fn depth_bias(&self) -> f32 {
        self.depth_bias
    }

    pub fn slope_scaled_depth_bias(&self) -> f32 {
        self.slope_scaled_depth_bias
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ===== SETTERS =====

    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the direction. A zero vector keeps the previous direction.
    pub fn set_direction(&mut self, direction: Vec3) {
        let normalized = direction.normalize_or_zero();
        if normalized != Vec3::ZERO {
            self.direction = normalized;
        }
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.0, 180.0);
    }

    pub fn set_light_mask(&mut self, light_mask: u32) {
        self.light_mask = light_mask;
    }

    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.cast_shadows = cast_shadows;
    }

    /// Set the shadow face size, rounded up to the next power of two.
    pub fn set_shadow_map_size(&mut self, size: i32) {
        self.shadow_map_size = next_power_of_two(size.max(1));
    }

    pub fn set_shadow_splits(&mut self, splits: [f32; 4]) {
        self.shadow_splits = splits;
    }

    /// Shadow fade start (fraction of max shadow distance) and
    /// strength of a fully shadowed pixel (0 = black).
    pub fn set_shadow_fade(&mut self, fade_start: f32, max_strength: f32) {
        self.shadow_fade_start = fade_start.clamp(0.0, 1.0);
        self.shadow_max_strength = max_strength.clamp(0.0, 1.0);
    }

    pub fn set_depth_bias(&mut self, constant: f32, slope_scaled: f32) {
        self.depth_bias = constant.max(0.0);
        self.slope_scaled_depth_bias = slope_scaled.max(0.0);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    // ===== SHADOW LAYOUT =====

    /// Directional split count: a split <= 0 ends the list.
    pub fn num_shadow_splits(&self) -> usize {
        if self.shadow_splits[1] <= 0.0 {
            1
        } else if self.shadow_splits[2] <= 0.0 {
            2
        } else if self.shadow_splits[3] <= 0.0 {
            3
        } else {
            4
        }
    }

    /// Far distance of a directional split
    pub fn shadow_split(&self, index: usize) -> f32 {
        self.shadow_splits[index.min(3)]
    }

    /// Distance up to which shadows are rendered
    pub fn max_shadow_distance(&self) -> f32 {
        match self.light_type {
            LightType::Directional => self.shadow_split(self.num_shadow_splits() - 1),
            LightType::Point | LightType::Spot => self.range,
        }
    }

    /// Number of shadow views, 0 if the light does not cast shadows
    pub fn num_shadow_views(&self) -> usize {
        if !self.cast_shadows {
            return 0;
        }
        match self.light_type {
            LightType::Directional => self.num_shadow_splits(),
            LightType::Point => 6,
            LightType::Spot => 1,
        }
    }

    /// Atlas tiles (columns, rows) used by all views of this light
    pub fn shadow_tiles(&self) -> IVec2 {
        match self.light_type {
            LightType::Directional => match self.num_shadow_splits() {
                1 => IVec2::new(1, 1),
                2 => IVec2::new(2, 1),
                _ => IVec2::new(2, 2),
            },
            LightType::Point => IVec2::new(3, 2),
            LightType::Spot => IVec2::new(1, 1),
        }
    }

    /// Total atlas rectangle size for a given face size
    pub fn total_shadow_map_size(&self, face_size: i32) -> IVec2 {
        self.shadow_tiles() * face_size
    }

    /// Tile position of one view inside the light's rectangle
    pub fn shadow_view_tile(&self, index: usize) -> IVec2 {
        let i = index as i32;
        match self.light_type {
            LightType::Directional => IVec2::new(i & 1, (i >> 1) & 1),
            LightType::Point => IVec2::new(i >> 1, i & 1),
            LightType::Spot => IVec2::ZERO,
        }
    }

    // ===== VOLUMES =====

    /// Near clip of point and spot shadow cameras
    pub fn shadow_near_clip(&self) -> f32 {
        self.range.max(f32::EPSILON) * SHADOW_NEAR_FACTOR
    }

    /// View matrix looking along the light direction
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.direction, up_for(self.direction))
    }

    /// Perspective projection of a spot light's shadow camera
    pub fn spot_projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians().max(f32::EPSILON),
            1.0,
            self.shadow_near_clip(),
            self.range.max(f32::EPSILON),
        )
    }

    /// View matrix of one point light cube face
    pub fn point_face_view(&self, face: usize) -> Mat4 {
        let (direction, up) = POINT_FACES[face % 6];
        Mat4::look_to_rh(self.position, direction, up)
    }

    /// 90° perspective projection of a point light cube face
    pub fn point_face_projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            self.shadow_near_clip(),
            self.range.max(f32::EPSILON),
        )
    }

    /// Spot light volume
    pub fn world_frustum(&self) -> Frustum {
        Frustum::from_view_projection(&(self.spot_projection() * self.view_matrix()))
    }

    /// World-space box enclosing the lit volume
    pub fn world_bounding_box(&self) -> AABB {
        match self.light_type {
            LightType::Directional => AABB::INFINITE,
            LightType::Point => AABB::from_center_half_size(self.position, Vec3::splat(self.range)),
            LightType::Spot => {
                let inv = (self.spot_projection() * self.view_matrix()).inverse();
                let mut corners = vec![self.position];
                for &(x, y) in &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                    corners.push(inv.project_point3(Vec3::new(x, y, 1.0)));
                }
                AABB::from_points(&corners)
            }
        }
    }
}

/// Up vector that is not parallel to `direction`
pub(crate) fn up_for(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
