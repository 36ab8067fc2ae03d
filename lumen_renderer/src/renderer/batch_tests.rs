use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use crate::resource::{GeometryKey, MaterialKey, PassRef, PassType, ShaderKey, ShaderProgram};
use crate::scene::{AABB, GeometryNode, GeometryType, NodeKey, Scene};
use crate::renderer::{InstanceBuffer, LightListHandle, LightPassRef};
use super::*;

// ============================================================================
// TEST HELPERS
// ============================================================================

struct Fixture {
    scene: Scene,
    geometries: Vec<GeometryKey>,
    materials: Vec<MaterialKey>,
    shaders: Vec<ShaderKey>,
}

impl Fixture {
    fn new() -> Self {
        let mut geometries: SlotMap<GeometryKey, ()> = SlotMap::with_key();
        let mut materials: SlotMap<MaterialKey, ()> = SlotMap::with_key();
        let mut shaders: SlotMap<ShaderKey, ()> = SlotMap::with_key();
        Self {
            scene: Scene::new(),
            geometries: (0..2).map(|_| geometries.insert(())).collect(),
            materials: (0..2).map(|_| materials.insert(())).collect(),
            shaders: (0..2).map(|_| shaders.insert(())).collect(),
        }
    }

    fn node(&mut self, x: f32) -> NodeKey {
        self.scene.add_node(GeometryNode::new(
            Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
            AABB::from_center_half_size(Vec3::ZERO, Vec3::splat(0.5)),
            Vec::new(),
        ))
    }

    /// Static batch with state variant `state` (0 or 1) at `distance`
    fn batch(&mut self, state: usize, distance: f32) -> Batch {
        let node = self.node(distance);
        Batch {
            light_pass: None,
            program: ShaderProgram::new(self.shaders[state]),
            pass: PassRef { material: self.materials[state], pass: PassType::Opaque },
            geometry: self.geometries[state],
            geometry_type: GeometryType::Static,
            distance,
            sort_key: SortKey::Unsorted,
            owner: BatchOwner::Transform(node),
        }
    }
}

fn distances(queue: &BatchQueue) -> Vec<f32> {
    queue.iter().map(|b| b.distance).collect()
}

// ============================================================================
// STATE SORT
// ============================================================================

#[test]
fn test_state_sort_groups_states_front_to_back() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    for &(state, distance) in &[(0, 30.0), (1, 5.0), (0, 10.0), (1, 2.0), (0, 20.0)] {
        let batch = fx.batch(state, distance);
        queue.push(batch);
    }

    queue.sort(100.0);

    // Equal states are contiguous: exactly one state change
    let batches = queue.batches();
    let changes = batches.windows(2).filter(|w| w[0].state() != w[1].state()).count();
    assert_eq!(changes, 1);

    // Front to back inside each state group
    for pair in batches.windows(2) {
        if pair[0].state() == pair[1].state() {
            assert!(pair[0].distance < pair[1].distance);
        }
    }
    assert!(queue.iter().all(|b| matches!(b.sort_key, SortKey::State(_))));
}

#[test]
fn test_state_sort_is_stable_under_resort() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    // Equal quantized distances: order falls back to sequence
    for &(state, distance) in &[(1, 7.0), (0, 7.0), (1, 7.0), (0, 3.0), (0, 7.0)] {
        let batch = fx.batch(state, distance);
        queue.push(batch);
    }

    queue.sort(100.0);
    let once: Vec<Option<NodeKey>> = queue.iter().map(Batch::node).collect();
    queue.sort(100.0);
    let twice: Vec<Option<NodeKey>> = queue.iter().map(Batch::node).collect();
    assert_eq!(once, twice);
}

#[test]
fn test_equal_batches_keep_collection_order() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    let batches: Vec<Batch> = (0..4).map(|_| fx.batch(0, 5.0)).collect();
    for batch in &batches {
        queue.push(*batch);
    }
    queue.sort(100.0);
    let nodes: Vec<Option<NodeKey>> = queue.iter().map(Batch::node).collect();
    let expected: Vec<Option<NodeKey>> = batches.iter().map(Batch::node).collect();
    assert_eq!(nodes, expected);
}

#[test]
fn test_state_sort_beyond_16_bit_ranks_keeps_groups() {
    let mut fx = Fixture::new();
    let mut geometries: SlotMap<GeometryKey, ()> = SlotMap::with_key();
    let keys: Vec<GeometryKey> = (0..70_000).map(|_| geometries.insert(())).collect();
    let template = fx.batch(0, 50.0);
    let last = *keys.last().unwrap();

    let mut queue = BatchQueue::new(SortMode::State);
    queue.push(Batch { geometry: last, distance: 99.0, ..template });
    for &geometry in &keys {
        queue.push(Batch { geometry, distance: 50.0, ..template });
    }
    queue.push(Batch { geometry: last, distance: 1.0, ..template });

    queue.sort(100.0);

    // Every state forms one contiguous group
    let batches = queue.batches();
    let changes = batches.windows(2).filter(|w| w[0].state() != w[1].state()).count();
    assert_eq!(changes, keys.len() - 1);

    let positions: Vec<usize> = batches
        .iter()
        .enumerate()
        .filter(|(_, b)| b.geometry == last)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[2] - positions[0], 2);
    assert_eq!(batches[positions[0]].distance, 1.0);
    assert_eq!(batches[positions[2]].distance, 99.0);

    // The run still instances
    let mut instances = InstanceBuffer::new();
    assert_eq!(queue.convert_to_instances(&fx.scene, &mut instances), 1);
    assert_eq!(instances.len(), 3);
}

// ============================================================================
// ALPHA SORT
// ============================================================================

#[test]
fn test_alpha_sort_back_to_front() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::BackToFront);
    for &(state, distance) in &[(0, 3.0), (1, 12.0), (0, 7.5), (1, 0.5), (0, 12.0)] {
        let batch = fx.batch(state, distance);
        queue.push(batch);
    }
    let tie_first = queue.batches()[1].node();
    let tie_second = queue.batches()[4].node();

    queue.sort(100.0);

    assert_eq!(distances(&queue), vec![12.0, 12.0, 7.5, 3.0, 0.5]);
    assert_eq!(queue.batches()[0].node(), tie_first);
    assert_eq!(queue.batches()[1].node(), tie_second);
    assert_eq!(queue.batches()[2].sort_key, SortKey::Distance(7.5));
}

#[test]
fn test_alpha_queue_is_never_instanced() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::BackToFront);
    for distance in [1.0, 2.0, 3.0] {
        let batch = fx.batch(0, distance);
        queue.push(batch);
    }
    queue.sort(100.0);

    let mut instances = InstanceBuffer::new();
    assert_eq!(queue.convert_to_instances(&fx.scene, &mut instances), 0);
    assert_eq!(queue.len(), 3);
    assert!(instances.is_empty());
}

// ============================================================================
// INSTANCING
// ============================================================================

#[test]
fn test_five_batches_merge_into_two_instanced() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    for &(state, distance) in &[(0, 1.0), (1, 2.0), (0, 3.0), (1, 4.0), (0, 5.0)] {
        let batch = fx.batch(state, distance);
        queue.push(batch);
    }
    queue.sort(100.0);
    let expected_transforms: Vec<Mat4> = queue
        .iter()
        .map(|b| *fx.scene.node(b.node().unwrap()).unwrap().world_transform())
        .collect();

    let mut instances = InstanceBuffer::new();
    instances.begin_frame();
    let created = queue.convert_to_instances(&fx.scene, &mut instances);

    assert_eq!(created, 2);
    assert_eq!(queue.len(), 2);
    let counts: Vec<u32> = queue.iter().map(|b| b.instances().unwrap().count).collect();
    let mut sorted_counts = counts.clone();
    sorted_counts.sort();
    assert_eq!(sorted_counts, vec![2, 3]);
    assert!(queue.iter().all(|b| b.program.is_instanced()));

    // Lossless: ranges cover the original transforms in order
    assert_eq!(instances.transforms(), expected_transforms.as_slice());
    let first = queue.batches()[0].instances().unwrap();
    let second = queue.batches()[1].instances().unwrap();
    assert_eq!(first.start, 0);
    assert_eq!(second.start, first.count);
}

#[test]
fn test_single_batches_stay_individual() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    let a = fx.batch(0, 1.0);
    let b = fx.batch(1, 2.0);
    queue.push(a);
    queue.push(b);
    queue.sort(100.0);

    let mut instances = InstanceBuffer::new();
    assert_eq!(queue.convert_to_instances(&fx.scene, &mut instances), 0);
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|b| matches!(b.owner, BatchOwner::Transform(_))));
}

#[test]
fn test_skinned_batches_are_not_merged() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    for distance in [1.0, 2.0, 3.0] {
        let mut batch = fx.batch(0, distance);
        batch.geometry_type = GeometryType::Skinned;
        batch.owner = BatchOwner::Node(batch.node().unwrap());
        queue.push(batch);
    }
    queue.sort(100.0);

    let mut instances = InstanceBuffer::new();
    assert_eq!(queue.convert_to_instances(&fx.scene, &mut instances), 0);
    assert_eq!(queue.len(), 3);
}

#[test]
fn test_different_light_pass_breaks_run() {
    let mut fx = Fixture::new();
    let mut queue = BatchQueue::new(SortMode::State);
    for i in 0..4u32 {
        let mut batch = fx.batch(0, i as f32);
        batch.light_pass = Some(LightPassRef {
            list: LightListHandle(i % 2),
            pass: 0,
        });
        queue.push(batch);
    }
    queue.sort(100.0);

    let mut instances = InstanceBuffer::new();
    assert_eq!(queue.convert_to_instances(&fx.scene, &mut instances), 2);
    assert_eq!(queue.len(), 2);
    assert_ne!(queue.batches()[0].light_pass, queue.batches()[1].light_pass);
    assert_eq!(instances.len(), 4);
}
