/// Visibility strategies.
///
/// A VisibilityQuery determines which nodes and lights are visible from
/// a camera. Implementations range from brute-force (everything enabled)
/// to frustum tests; spatial indices plug in behind the same trait.

use crate::camera::Camera;
use super::geometry_node::NodeKey;
use super::light::{LightKey, LightType};
use super::scene::Scene;

/// A visible node and its view depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleNode {
    pub key: NodeKey,
    /// Camera view depth of the world bounding box center
    pub distance: f32,
}

/// Output of a visibility query, reused across frames
#[derive(Debug, Clone, Default)]
pub struct VisibleSet {
    pub nodes: Vec<VisibleNode>,
    pub lights: Vec<LightKey>,
}

impl VisibleSet {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lights.clear();
    }
}

/// Strategy for determining visible nodes and lights from a camera.
///
/// Called once per frame. `&mut self` allows stateful implementations
/// (e.g. caching) to keep state across frames.
pub trait VisibilityQuery {
    /// Fill `out` (already cleared) with what the camera sees.
    fn query(&mut self, scene: &Scene, camera: &Camera, out: &mut VisibleSet);
}

/// Brute-force query: every enabled node and light is visible.
///
/// Suitable for small scenes or as a baseline for comparison.
pub struct BruteForceCuller;

impl BruteForceCuller {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BruteForceCuller {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityQuery for BruteForceCuller {
    fn query(&mut self, scene: &Scene, camera: &Camera, out: &mut VisibleSet) {
        for (key, node) in scene.nodes().filter(|(_, n)| n.is_enabled()) {
            out.nodes.push(VisibleNode {
                key,
                distance: camera.distance(node.world_center()),
            });
        }
        out.lights.extend(
            scene.lights().filter(|(_, l)| l.is_enabled()).map(|(k, _)| k),
        );
    }
}

/// Frustum query: tests world bounding boxes against the camera frustum.
///
/// Directional lights are always visible.
pub struct FrustumCuller;

impl FrustumCuller {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FrustumCuller {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityQuery for FrustumCuller {
    fn query(&mut self, scene: &Scene, camera: &Camera, out: &mut VisibleSet) {
        let frustum = camera.frustum();

        for (key, node) in scene.nodes() {
            if !node.is_enabled() {
                continue;
            }
            let world_box = node.world_bounding_box();
            if frustum.intersects_aabb(&world_box) {
                out.nodes.push(VisibleNode {
                    key,
                    distance: camera.distance(world_box.center()),
                });
            }
        }

        for (key, light) in scene.lights() {
            if !light.is_enabled() {
                continue;
            }
            let visible = match light.light_type() {
                LightType::Directional => true,
                LightType::Point => frustum.intersects_sphere(light.position(), light.range()),
                LightType::Spot => frustum.intersects_aabb(&light.world_bounding_box()),
            };
            if visible {
                out.lights.push(key);
            }
        }
    }
}

#[cfg(test)]
#[path = "culler_tests.rs"]
mod tests;
