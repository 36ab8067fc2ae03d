/// GeometryNode - a renderable object placed in the scene.
///
/// Owns a world transform, a local bounding box and a list of source
/// batches (geometry + material pairs). The renderer turns each source
/// batch into one batch per requested pass.

use glam::{Mat4, Vec3};
use crate::resource::{GeometryKey, MaterialKey};
use super::bounds::AABB;

slotmap::new_key_type! {
    /// Stable key for a geometry node in a Scene
    pub struct NodeKey;
}

/// How a node's geometry is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryType {
    /// Rigid geometry drawn with a world transform only; can be instanced
    Static,
    /// Skinned geometry; per-object bone matrices
    Skinned,
    /// Node-specific draw path (procedural, billboards...)
    Custom,
}

impl GeometryType {
    /// Only rigid geometry can share a draw through the instance buffer
    pub fn is_instanceable(self) -> bool {
        self == GeometryType::Static
    }
}

/// One geometry/material pair of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBatch {
    pub geometry: GeometryKey,
    pub material: MaterialKey,
}

#[derive(Debug, Clone)]
pub struct GeometryNode {
    world_transform: Mat4,
    bounding_box: AABB,
    geometry_type: GeometryType,
    sources: Vec<SourceBatch>,
    layer_mask: u32,
    cast_shadows: bool,
    enabled: bool,
}

impl GeometryNode {
    /// Enabled static node on all layers that does not cast shadows.
    pub fn new(world_transform: Mat4, bounding_box: AABB, sources: Vec<SourceBatch>) -> Self {
        Self {
            world_transform,
            bounding_box,
            geometry_type: GeometryType::Static,
            sources,
            layer_mask: u32::MAX,
            cast_shadows: false,
            enabled: true,
        }
    }

    pub fn with_geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = geometry_type;
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    // ===== GETTERS =====

    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// Local-space bounding box
    pub fn bounding_box(&self) -> &AABB {
        &self.bounding_box
    }

    pub fn world_bounding_box(&self) -> AABB {
        self.bounding_box.transformed(&self.world_transform)
    }

    /// Center of the world bounding box (used for sort distances)
    pub fn world_center(&self) -> Vec3 {
        self.world_bounding_box().center()
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn sources(&self) -> &[SourceBatch] {
        &self.sources
    }

    pub fn layer_mask(&self) -> u32 {
        self.layer_mask
    }

    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ===== SETTERS =====

    pub fn set_world_transform(&mut self, world_transform: Mat4) {
        self.world_transform = world_transform;
    }

    pub fn set_bounding_box(&mut self, bounding_box: AABB) {
        self.bounding_box = bounding_box;
    }

    pub fn set_sources(&mut self, sources: Vec<SourceBatch>) {
        self.sources = sources;
    }

    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.cast_shadows = cast_shadows;
    }

    pub fn set_layer_mask(&mut self, layer_mask: u32) {
        self.layer_mask = layer_mask;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
