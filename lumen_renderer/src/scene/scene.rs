/// Scene - geometry nodes and lights for rendering.
///
/// Uses SlotMaps for O(1) insert/remove with stable keys.
/// Nodes and lights are stored contiguously for cache-friendly iteration.

use glam::Vec4;
use slotmap::SlotMap;
use super::geometry_node::{GeometryNode, NodeKey};
use super::light::{Light, LightKey};

pub struct Scene {
    nodes: SlotMap<NodeKey, GeometryNode>,
    lights: SlotMap<LightKey, Light>,
    ambient_color: Vec4,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            ambient_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
        }
    }

    // ===== NODES =====

    pub fn add_node(&mut self, node: GeometryNode) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Remove a node. Returns the node if the key was valid.
    pub fn remove_node(&mut self, key: NodeKey) -> Option<GeometryNode> {
        self.nodes.remove(key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&GeometryNode> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut GeometryNode> {
        self.nodes.get_mut(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &GeometryNode)> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ===== LIGHTS =====

    pub fn add_light(&mut self, light: Light) -> LightKey {
        self.lights.insert(light)
    }

    pub fn remove_light(&mut self, key: LightKey) -> Option<Light> {
        self.lights.remove(key)
    }

    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.lights.get(key)
    }

    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut Light> {
        self.lights.get_mut(key)
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightKey, &Light)> {
        self.lights.iter()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    // ===== ENVIRONMENT =====

    pub fn ambient_color(&self) -> Vec4 {
        self.ambient_color
    }

    pub fn set_ambient_color(&mut self, color: Vec4) {
        self.ambient_color = color;
    }

    /// Remove all nodes and lights. Existing keys become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lights.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
