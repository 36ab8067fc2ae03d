//! Integration tests for whole renderer frames
//!
//! Drives the public Renderer API frame after frame against a recording
//! submitter. No GPU involved.
//!
//! Run with: cargo test --test frame_integration_tests


use lumen_renderer::glam::Vec3;
use lumen_renderer::lumen::{Error, Renderer};
use lumen_renderer::lumen::render::{FramePhase, InstancingMode, RendererConfig};
use lumen_renderer::lumen::resource::PassType;
use lumen_renderer::lumen::scene::{BruteForceCuller, Light};
use test_utils::{Recorded, RecordingSubmitter, TestWorld};

// ============================================================================
// FRAME LOOP TESTS
// ============================================================================

#[test]
fn test_integration_frame_loop_is_repeatable() {
    let mut world = TestWorld::new();
    world.add_caster(Vec3::ZERO);
    world.add(Vec3::new(2.0, 0.0, 0.0), world.cube, world.glass);
    world.scene.add_light(
        Light::spot(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 30.0, 60.0).with_shadows(512),
    );

    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    let mut previous = None;
    for _ in 0..3 {
        let mut submitter = RecordingSubmitter::new();
        world.run_frame(&mut renderer, &mut submitter).unwrap();
        assert_eq!(renderer.phase(), FramePhase::Idle);

        let stats = *renderer.frame_stats();
        if let Some(previous) = previous {
            assert_eq!(stats, previous);
        }
        previous = Some(stats);
    }

    // Pools stop growing once the scene is stable
    assert_eq!(renderer.light_lists().pool_size(), 1);
}

#[test]
fn test_integration_queue_order() {
    let mut world = TestWorld::new();
    world.add_caster(Vec3::ZERO);
    world.add(Vec3::new(2.0, 0.0, 0.0), world.cube, world.glass);
    for i in 0..5 {
        world.scene.add_light(Light::point(Vec3::new(i as f32 - 2.0, 1.0, 0.0), 6.0));
    }
    world.scene.add_light(
        Light::spot(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 30.0, 60.0).with_shadows(512),
    );

    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    let mut submitter = RecordingSubmitter::new();
    world.run_frame(&mut renderer, &mut submitter).unwrap();

    let queues: Vec<PassType> = submitter
        .events
        .iter()
        .filter_map(|e| match e {
            Recorded::Queue(pass_type, _) => Some(*pass_type),
            _ => None,
        })
        .collect();
    assert_eq!(
        queues,
        vec![PassType::Shadow, PassType::Opaque, PassType::OpaqueAdditive, PassType::Alpha]
    );
    assert_eq!(
        submitter.events.first(),
        Some(&Recorded::ShadowView {
            map_index: 1,
            viewport: renderer.shadow_views()[0].viewport(),
        })
    );
}

#[test]
fn test_integration_out_of_order_calls_are_rejected() {
    let world = TestWorld::new();
    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    let mut submitter = RecordingSubmitter::new();

    let result = renderer.render_alpha(&world.scene, &world.resources, &mut submitter);
    assert!(matches!(result, Err(Error::InvalidPhase { actual: FramePhase::Idle, .. })));

    renderer
        .prepare_view(&world.scene, &world.resources, &world.camera, true)
        .unwrap();
    let result = renderer.prepare_view(&world.scene, &world.resources, &world.camera, true);
    assert!(matches!(result, Err(Error::InvalidPhase { .. })));
    assert_eq!(renderer.phase(), FramePhase::Sorted);

    renderer.abandon_frame();
    world.run_frame(&mut renderer, &mut submitter).unwrap();
}

#[test]
fn test_integration_resize_abandons_frame() {
    let mut world = TestWorld::new();
    world.add(Vec3::ZERO, world.cube, world.stone);
    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    let mut submitter = RecordingSubmitter::new();

    renderer
        .prepare_view(&world.scene, &world.resources, &world.camera, true)
        .unwrap();
    renderer.abandon_frame();
    renderer
        .setup_shadow_maps(1024, 1024, RendererConfig::default().shadow_format)
        .unwrap();

    world.run_frame(&mut renderer, &mut submitter).unwrap();
    assert_eq!(submitter.draws().len(), 1);
}

// ============================================================================
// INSTANCING TESTS
// ============================================================================

#[test]
fn test_integration_two_instanced_groups() {
    let mut world = TestWorld::new();
    for x in [-4.0, -2.0, 0.0] {
        world.add(Vec3::new(x, 0.0, 0.0), world.cube, world.stone);
    }
    for x in [2.0, 4.0] {
        world.add(Vec3::new(x, 0.0, 0.0), world.sphere, world.stone);
    }

    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    let mut submitter = RecordingSubmitter::new();
    world.run_frame(&mut renderer, &mut submitter).unwrap();

    let opaque = renderer.opaque_batches();
    assert_eq!(opaque.len(), 2);
    let mut counts: Vec<(String, u32)> = opaque
        .iter()
        .map(|batch| {
            let name = world.resources.geometry(batch.geometry).unwrap().name().to_string();
            (name, batch.instances().unwrap().count)
        })
        .collect();
    counts.sort();
    assert_eq!(counts, vec![("cube".to_string(), 3), ("sphere".to_string(), 2)]);

    assert_eq!(submitter.uploads(), 1);
    assert_eq!(renderer.instance_buffer().len(), 5);
    assert_eq!(renderer.frame_stats().draw_calls, 2);
}

#[test]
fn test_integration_instancing_off_draws_every_node() {
    let mut world = TestWorld::new();
    for x in [-4.0, -2.0, 0.0, 2.0, 4.0] {
        world.add(Vec3::new(x, 0.0, 0.0), world.cube, world.stone);
    }

    let mut renderer = Renderer::new(
        RendererConfig::default().with_instancing(InstancingMode::Disabled),
    )
    .unwrap();
    let mut submitter = RecordingSubmitter::new();
    world.run_frame(&mut renderer, &mut submitter).unwrap();

    assert_eq!(submitter.draws().len(), 5);
    assert_eq!(submitter.uploads(), 0);
    assert_eq!(renderer.frame_stats().state_changes, 1);
}

#[test]
fn test_integration_submitter_capabilities() {
    let mut world = TestWorld::new();
    for x in [-2.0, 0.0, 2.0] {
        world.add(Vec3::new(x, 0.0, 0.0), world.cube, world.stone);
    }

    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    let mut submitter = RecordingSubmitter::without_instancing();
    renderer.detect_capabilities(&submitter);
    world.run_frame(&mut renderer, &mut submitter).unwrap();

    for draw in submitter.draws() {
        let Recorded::Draw { instances, .. } = draw else { unreachable!() };
        assert_eq!(*instances, 0);
    }
    assert_eq!(submitter.draws().len(), 3);
}

// ============================================================================
// STRATEGY TESTS
// ============================================================================

#[test]
fn test_integration_brute_force_visibility() {
    let mut world = TestWorld::new();
    world.add(Vec3::ZERO, world.cube, world.stone);
    // Behind the camera
    world.add(Vec3::new(0.0, 0.0, 40.0), world.cube, world.stone);

    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    renderer
        .prepare_view(&world.scene, &world.resources, &world.camera, false)
        .unwrap();
    assert_eq!(renderer.frame_stats().visible_nodes, 1);
    renderer.abandon_frame();

    renderer.set_visibility_query(Box::new(BruteForceCuller::new()));
    renderer
        .prepare_view(&world.scene, &world.resources, &world.camera, false)
        .unwrap();
    assert_eq!(renderer.frame_stats().visible_nodes, 2);
}

#[test]
fn test_integration_disabled_nodes_and_lights_are_ignored() {
    let mut world = TestWorld::new();
    let node = world.add(Vec3::ZERO, world.cube, world.stone);
    let hidden = world.add(Vec3::new(2.0, 0.0, 0.0), world.cube, world.stone);
    let light = world.scene.add_light(Light::point(Vec3::ZERO, 5.0));
    world.scene.node_mut(hidden).unwrap().set_enabled(false);
    world.scene.light_mut(light).unwrap().set_enabled(false);

    let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
    renderer
        .prepare_view(&world.scene, &world.resources, &world.camera, true)
        .unwrap();

    assert_eq!(renderer.frame_stats().visible_nodes, 1);
    assert_eq!(renderer.frame_stats().visible_lights, 0);
    assert!(renderer.node_light_list(node).is_none());
}
