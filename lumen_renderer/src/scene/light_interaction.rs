/// Light interaction strategies.
///
/// Decide which nodes a light affects and which nodes cast shadows into a
/// shadow view. The default tests light volumes against node bounding
/// boxes; spatial indices plug in behind the same trait.

use crate::camera::Frustum;
use super::culler::VisibleNode;
use super::geometry_node::NodeKey;
use super::light::{Light, LightType};
use super::scene::Scene;

pub trait LightInteraction {
    /// Append the visible nodes lit by `light` to `out`.
    fn affected_nodes(
        &mut self,
        scene: &Scene,
        light: &Light,
        visible: &[VisibleNode],
        out: &mut Vec<NodeKey>,
    );

    /// Append the enabled shadow-casting nodes inside a shadow view
    /// frustum to `out`, visible or not.
    fn shadow_casters(
        &mut self,
        scene: &Scene,
        light: &Light,
        view_frustum: &Frustum,
        out: &mut Vec<NodeKey>,
    );
}

/// Volume tests against world bounding boxes.
///
/// - Directional: every node on a matching layer
/// - Point: light sphere against the node box
/// - Spot: light frustum against the node box
pub struct VolumeLightInteraction;

impl VolumeLightInteraction {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VolumeLightInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl LightInteraction for VolumeLightInteraction {
    fn affected_nodes(
        &mut self,
        scene: &Scene,
        light: &Light,
        visible: &[VisibleNode],
        out: &mut Vec<NodeKey>,
    ) {
        let spot_frustum = match light.light_type() {
            LightType::Spot => Some(light.world_frustum()),
            _ => None,
        };

        for visible_node in visible {
            let Some(node) = scene.node(visible_node.key) else {
                continue;
            };
            if node.layer_mask() & light.light_mask() == 0 {
                continue;
            }
            let lit = match light.light_type() {
                LightType::Directional => true,
                LightType::Point => node
                    .world_bounding_box()
                    .intersects_sphere(light.position(), light.range()),
                LightType::Spot => spot_frustum
                    .as_ref()
                    .is_some_and(|f| f.intersects_aabb(&node.world_bounding_box())),
            };
            if lit {
                out.push(visible_node.key);
            }
        }
    }

    fn shadow_casters(
        &mut self,
        scene: &Scene,
        light: &Light,
        view_frustum: &Frustum,
        out: &mut Vec<NodeKey>,
    ) {
        for (key, node) in scene.nodes() {
            if !node.is_enabled() || !node.cast_shadows() {
                continue;
            }
            if node.layer_mask() & light.light_mask() == 0 {
                continue;
            }
            let world_box = node.world_bounding_box();
            let in_range = match light.light_type() {
                LightType::Directional => true,
                LightType::Point | LightType::Spot => {
                    world_box.intersects_sphere(light.position(), light.range())
                }
            };
            if in_range && view_frustum.intersects_aabb(&world_box) {
                out.push(key);
            }
        }
    }
}

#[cfg(test)]
#[path = "light_interaction_tests.rs"]
mod tests;
