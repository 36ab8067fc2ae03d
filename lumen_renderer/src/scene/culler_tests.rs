use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::scene::{AABB, GeometryNode, Light, Scene};
use super::*;

fn camera() -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_2,
        1.0,
        0.1,
        100.0,
    )
}

fn node_at(position: Vec3) -> GeometryNode {
    GeometryNode::new(
        Mat4::from_translation(position),
        AABB::from_center_half_size(Vec3::ZERO, Vec3::splat(0.5)),
        Vec::new(),
    )
}

fn populated_scene() -> (Scene, Vec<crate::scene::NodeKey>) {
    let mut scene = Scene::new();
    let keys = vec![
        scene.add_node(node_at(Vec3::ZERO)),
        scene.add_node(node_at(Vec3::new(0.0, 0.0, 30.0))), // behind camera
        scene.add_node(node_at(Vec3::new(0.0, 0.0, -20.0))),
    ];
    (scene, keys)
}

#[test]
fn test_brute_force_returns_all_enabled() {
    let (mut scene, keys) = populated_scene();
    scene.node_mut(keys[2]).unwrap().set_enabled(false);
    scene.add_light(Light::point(Vec3::new(500.0, 0.0, 0.0), 1.0));

    let mut out = VisibleSet::default();
    BruteForceCuller::new().query(&scene, &camera(), &mut out);

    let visible: Vec<_> = out.nodes.iter().map(|n| n.key).collect();
    assert_eq!(visible, vec![keys[0], keys[1]]);
    assert_eq!(out.lights.len(), 1);
}

#[test]
fn test_frustum_culls_nodes_and_records_distance() {
    let (scene, keys) = populated_scene();

    let mut out = VisibleSet::default();
    FrustumCuller::new().query(&scene, &camera(), &mut out);

    assert_eq!(out.nodes.len(), 2);
    assert_eq!(out.nodes[0].key, keys[0]);
    assert!((out.nodes[0].distance - 10.0).abs() < 1e-4);
    assert_eq!(out.nodes[1].key, keys[2]);
    assert!((out.nodes[1].distance - 30.0).abs() < 1e-4);
}

#[test]
fn test_frustum_light_visibility() {
    let mut scene = Scene::new();
    let sun = scene.add_light(Light::directional(Vec3::NEG_Y));
    let near_lamp = scene.add_light(Light::point(Vec3::ZERO, 2.0));
    let far_lamp = scene.add_light(Light::point(Vec3::new(0.0, 0.0, 50.0), 2.0));
    let disabled = scene.add_light(Light::point(Vec3::ZERO, 2.0));
    scene.light_mut(disabled).unwrap().set_enabled(false);

    let mut out = VisibleSet::default();
    FrustumCuller::new().query(&scene, &camera(), &mut out);

    assert_eq!(out.lights, vec![sun, near_lamp]);
    assert!(!out.lights.contains(&far_lamp));
}

#[test]
fn test_visible_set_clear() {
    let (scene, _) = populated_scene();
    let mut out = VisibleSet::default();
    BruteForceCuller::new().query(&scene, &camera(), &mut out);
    out.clear();
    assert!(out.nodes.is_empty() && out.lights.is_empty());
}
