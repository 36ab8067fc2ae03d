/// Renderer - the per-frame decision pipeline.
///
/// The renderer owns every cache that lives across frames: the light list
/// pool, the shadow maps with their queue slots, the shadow view pool, the
/// batch queues and the instance buffer. Nothing is global.
///
/// A frame is a fixed sequence of steps, each checked against the current
/// `FramePhase`:
///
/// ```text
/// begin_frame → collect_visible → collect_light_interactions
///   → collect_shadow_batches (per view, optional) → collect_node_batches
///   → sort_node_batches → render_shadow_maps (optional) → render_opaque
///   → render_alpha → end_frame
/// ```
///
/// `prepare_view` runs everything up to the sort in one call.
/// `abandon_frame` drops a frame in progress (e.g. on resize).
///
/// # Example
///
/// ```
/// use lumen_renderer::lumen::render::{Renderer, RendererConfig};
/// use lumen_renderer::lumen::resource::ResourceRegistry;
/// use lumen_renderer::lumen::scene::Scene;
/// use lumen_renderer::lumen::camera::Camera;
/// use lumen_renderer::glam::Vec3;
///
/// let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
/// let scene = Scene::new();
/// let resources = ResourceRegistry::new();
/// let camera = Camera::perspective(
///     Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, Vec3::Y, 1.0, 1.5, 0.1, 100.0,
/// );
///
/// renderer.prepare_view(&scene, &resources, &camera, true).unwrap();
/// assert!(renderer.opaque_batches().is_empty());
/// renderer.abandon_frame();
/// ```

use glam::{IVec2, Mat4, Vec2, Vec4};
use rustc_hash::FxHashMap;
use crate::camera::{Camera, Frustum};
use crate::error::{Error, Result};
use crate::math::IntRect;
use crate::resource::{
    GeometryKey, Pass, PassRef, PassType, ProgramBits, ResourceRegistry, ShaderProgram,
};
use crate::scene::{
    FrustumCuller, GeometryNode, GeometryType, LightInteraction, LightKey, LightType, NodeKey,
    Scene, VisibilityQuery, VisibleSet, VolumeLightInteraction,
};
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};
use super::batch::{Batch, BatchOwner, BatchQueue, BatchState, SortKey, SortMode};
use super::config::{InstancingMode, RendererConfig, ShadowFormat};
use super::draw_submitter::{DrawCall, DrawSubmitter};
use super::frame_phase::FramePhase;
use super::instance_buffer::InstanceBuffer;
use super::light_list::{
    LightList, LightListCache, LightListHandle, LightPass, LightPassRef, LightShadowData,
};
use super::shadow::{
    directional_split_camera, shadow_adjust_matrix, ShadowMap, ShadowTextureDesc, ShadowView,
    ShadowViewHandle, DIRECTIONAL_SHADOW_MAP, SHARED_SHADOW_MAP,
};
use super::stats::FrameStats;

/// Shadow views and light-data matrix of one shadow-casting light
#[derive(Debug, Clone, Copy)]
struct LightShadows {
    first_view: usize,
    view_count: usize,
    shadow: LightShadowData,
}

pub struct Renderer {
    config: RendererConfig,
    phase: FramePhase,
    instancing_supported: bool,

    // Strategies
    visibility: Box<dyn VisibilityQuery>,
    interaction: Box<dyn LightInteraction>,

    // Frame inputs
    camera: Camera,
    visible: VisibleSet,
    node_index: FxHashMap<NodeKey, u32>,

    // Light lists
    light_lists: LightListCache,
    node_light_lists: Vec<Option<LightListHandle>>,
    interactions: Vec<(u32, LightKey)>,
    lit_lights: Vec<LightKey>,

    // Shadows
    shadow_maps: Vec<ShadowMap>,
    shadow_views: Vec<ShadowView>,
    used_shadow_views: usize,
    light_shadows: FxHashMap<LightKey, LightShadows>,

    // Batches
    opaque: BatchQueue,
    opaque_additive: BatchQueue,
    alpha: BatchQueue,
    instances: InstanceBuffer,

    // Scratch
    node_scratch: Vec<NodeKey>,
    light_scratch: Vec<LightKey>,

    stats: FrameStats,
}

impl Renderer {
    /// Create a renderer and its shadow maps.
    pub fn new(config: RendererConfig) -> Result<Self> {
        config.validate()?;
        let shadow_maps = create_shadow_maps(&config);
        Ok(Self {
            config,
            phase: FramePhase::Idle,
            instancing_supported: true,
            visibility: Box::new(FrustumCuller::new()),
            interaction: Box::new(VolumeLightInteraction::new()),
            camera: Camera::default(),
            visible: VisibleSet::default(),
            node_index: FxHashMap::default(),
            light_lists: LightListCache::new(),
            node_light_lists: Vec::new(),
            interactions: Vec::new(),
            lit_lights: Vec::new(),
            shadow_maps,
            shadow_views: Vec::new(),
            used_shadow_views: 0,
            light_shadows: FxHashMap::default(),
            opaque: BatchQueue::new(SortMode::State),
            opaque_additive: BatchQueue::new(SortMode::State),
            alpha: BatchQueue::new(SortMode::BackToFront),
            instances: InstanceBuffer::new(),
            node_scratch: Vec::new(),
            light_scratch: Vec::new(),
            stats: FrameStats::default(),
        })
    }

    // ===== CONFIGURATION =====

    /// Replace the visibility strategy (default: `FrustumCuller`)
    pub fn set_visibility_query(&mut self, visibility: Box<dyn VisibilityQuery>) {
        self.visibility = visibility;
    }

    /// Replace the light interaction strategy (default: `VolumeLightInteraction`)
    pub fn set_light_interaction(&mut self, interaction: Box<dyn LightInteraction>) {
        self.interaction = interaction;
    }

    /// Recreate the shadow maps. Only allowed between frames.
    pub fn setup_shadow_maps(
        &mut self,
        directional_size: i32,
        atlas_size: i32,
        format: ShadowFormat,
    ) -> Result<()> {
        self.phase.require("setup_shadow_maps", &[FramePhase::Idle])?;

        let config = self
            .config
            .clone()
            .with_directional_shadow_size(directional_size)
            .with_shadow_atlas_size(atlas_size)
            .with_shadow_format(format);
        config.validate()?;

        self.shadow_maps = create_shadow_maps(&config);
        self.config = config;
        engine_info!(
            "lumen::Renderer",
            "Shadow maps: directional {}x{}, atlas {}x{}, {:?}",
            directional_size, directional_size, atlas_size, atlas_size, format
        );
        Ok(())
    }

    /// Global depth bias multipliers applied to every shadow view.
    ///
    /// Negative values clamp to zero. Takes effect at the next shadow
    /// allocation.
    pub fn set_shadow_depth_bias_mul(&mut self, constant: f32, slope_scaled: f32) {
        self.config.depth_bias_mul = constant.max(0.0);
        self.config.slope_scale_bias_mul = slope_scaled.max(0.0);
    }

    /// Query the submitter's capabilities (instancing support).
    pub fn detect_capabilities(&mut self, submitter: &dyn DrawSubmitter) {
        let supported = submitter.supports_instancing();
        if !supported && self.instancing_supported {
            engine_info!(
                "lumen::Renderer",
                "Instancing not supported by the draw submitter, drawing batches one by one"
            );
        }
        self.instancing_supported = supported;
    }

    /// Whether runs of identical batches are merged this frame
    pub fn is_instancing_enabled(&self) -> bool {
        self.config.instancing == InstancingMode::Auto && self.instancing_supported
    }

    // ===== FRAME STEPS =====

    /// Start a frame: reset light lists, shadow maps, queues and stats.
    pub fn begin_frame(&mut self, camera: &Camera) -> Result<()> {
        self.phase.require("begin_frame", &[FramePhase::Idle])?;

        self.camera = camera.clone();
        self.reset_transient_state();
        self.phase = FramePhase::Begun;
        engine_trace!("lumen::Renderer", "Frame begun");
        Ok(())
    }

    /// Run the visibility query.
    pub fn collect_visible(&mut self, scene: &Scene) -> Result<()> {
        self.phase.require("collect_visible", &[FramePhase::Begun])?;

        self.visible.clear();
        self.visibility.query(scene, &self.camera, &mut self.visible);

        self.node_index.clear();
        for (index, node) in self.visible.nodes.iter().enumerate() {
            self.node_index.insert(node.key, index as u32);
        }

        self.stats.visible_nodes = self.visible.nodes.len() as u32;
        self.stats.visible_lights = self.visible.lights.len() as u32;
        self.phase = FramePhase::VisibleCollected;
        Ok(())
    }

    /// Build light lists for the visible nodes, allocate shadow views for
    /// shadow-casting lights (when `use_shadows`) and write light data.
    pub fn collect_light_interactions(&mut self, scene: &Scene, use_shadows: bool) -> Result<()> {
        self.phase.require("collect_light_interactions", &[FramePhase::VisibleCollected])?;

        self.interactions.clear();
        self.lit_lights.clear();
        for &light_key in &self.visible.lights {
            let Some(light) = scene.light(light_key) else {
                continue;
            };
            self.node_scratch.clear();
            self.interaction
                .affected_nodes(scene, light, &self.visible.nodes, &mut self.node_scratch);
            if self.node_scratch.is_empty() {
                continue;
            }
            self.lit_lights.push(light_key);
            for node in &self.node_scratch {
                if let Some(&index) = self.node_index.get(node) {
                    self.interactions.push((index, light_key));
                }
            }
        }

        // Stable: each node keeps the visible light order
        self.interactions.sort_by_key(|&(index, _)| index);

        self.node_light_lists.clear();
        self.node_light_lists.resize(self.visible.nodes.len(), None);
        let mut start = 0;
        while start < self.interactions.len() {
            let index = self.interactions[start].0;
            let mut end = start + 1;
            while end < self.interactions.len() && self.interactions[end].0 == index {
                end += 1;
            }
            self.light_scratch.clear();
            self.light_scratch
                .extend(self.interactions[start..end].iter().map(|&(_, light)| light));
            self.node_light_lists[index as usize] =
                self.light_lists.get_or_create(&self.light_scratch, scene);
            start = end;
        }

        if use_shadows {
            for i in 0..self.lit_lights.len() {
                let light_key = self.lit_lights[i];
                if scene.light(light_key).is_some_and(|light| light.cast_shadows()) {
                    self.allocate_shadow_map(scene, light_key);
                }
            }
        }

        let light_shadows = &self.light_shadows;
        self.light_lists
            .write_light_data(scene, |key| light_shadows.get(&key).map(|entry| entry.shadow));

        self.stats.light_lists = self.light_lists.used() as u32;
        self.phase = FramePhase::LightsCollected;
        Ok(())
    }

    /// Give a shadow-casting light its rectangle in a shadow map.
    ///
    /// Creates one shadow view per split or face, each with its own queue
    /// slot. Returns `false` when the light casts no shadows or its atlas
    /// is full; the light then renders unshadowed this frame. Must run
    /// before light data is written (`collect_light_interactions` calls it).
    pub fn allocate_shadow_map(&mut self, scene: &Scene, light_key: LightKey) -> bool {
        if !matches!(self.phase, FramePhase::Begun | FramePhase::VisibleCollected) {
            engine_error!(
                "lumen::ShadowMap",
                "allocate_shadow_map called in phase {:?}",
                self.phase
            );
            return false;
        }
        let Some(light) = scene.light(light_key) else {
            return false;
        };
        let view_count = light.num_shadow_views();
        if view_count == 0 {
            return false;
        }
        if self.light_shadows.contains_key(&light_key) {
            return true;
        }

        let map_index = match light.light_type() {
            LightType::Directional => DIRECTIONAL_SHADOW_MAP,
            LightType::Point | LightType::Spot => SHARED_SHADOW_MAP,
        };
        let Some(map) = self.shadow_maps.get_mut(map_index) else {
            return false;
        };

        // Halve the face size until the light's tiles fit the atlas
        let atlas = map.size();
        let tiles = light.shadow_tiles();
        let mut face = light.shadow_map_size();
        while face > 1 && (tiles.x * face > atlas.x || tiles.y * face > atlas.y) {
            face /= 2;
        }
        let total = light.total_shadow_map_size(face);

        let Some(rect) = map.allocate_rect(total.x, total.y) else {
            engine_debug!(
                "lumen::ShadowMap",
                "No room for a {}x{} shadow rect in map {}, light renders unshadowed",
                total.x, total.y, map_index
            );
            self.stats.failed_shadow_allocations += 1;
            return false;
        };

        let first_view = self.used_shadow_views;
        for i in 0..view_count {
            let tile = light.shadow_view_tile(i);
            let viewport = IntRect::from_pos_size(
                rect.left + tile.x * face,
                rect.top + tile.y * face,
                face,
                face,
            );

            let (view_matrix, projection_matrix, far_clip, split, bias_scale) =
                match light.light_type() {
                    LightType::Directional => {
                        let near = if i == 0 {
                            self.camera.near_clip()
                        } else {
                            light.shadow_split(i - 1)
                        };
                        let far = light.shadow_split(i).min(self.camera.far_clip()).max(near);
                        let (view, projection, far_clip) =
                            directional_split_camera(light, &self.camera, near, far);
                        (view, projection, far_clip, Some((near, far)), (i + 1) as f32)
                    }
                    LightType::Point => (
                        light.point_face_view(i),
                        light.point_face_projection(),
                        light.range(),
                        None,
                        1.0,
                    ),
                    LightType::Spot => (
                        light.view_matrix(),
                        light.spot_projection(),
                        light.range(),
                        None,
                        1.0,
                    ),
                };

            let view_projection = projection_matrix * view_matrix;
            let view = ShadowView {
                light: light_key,
                map: map_index,
                viewport,
                view_matrix,
                projection_matrix,
                frustum: Frustum::from_view_projection(&view_projection),
                shadow_matrix: shadow_adjust_matrix(viewport, atlas) * view_projection,
                depth_bias: light.depth_bias() * self.config.depth_bias_mul * bias_scale,
                slope_scaled_depth_bias: light.slope_scaled_depth_bias()
                    * self.config.slope_scale_bias_mul,
                far_clip,
                split,
                queue: map.acquire_queue(),
                collected: false,
            };

            let handle = ShadowViewHandle(self.used_shadow_views as u32);
            if handle.index() == self.shadow_views.len() {
                self.shadow_views.push(view);
            } else {
                self.shadow_views[handle.index()] = view;
            }
            self.used_shadow_views += 1;
            map.add_view(handle);
        }

        // Directional lights sample through their first split, point lights
        // through their whole cube-face rectangle
        let matrix = match light.light_type() {
            LightType::Point => point_shadow_matrix(rect, atlas, light.shadow_near_clip(), light.range()),
            LightType::Directional | LightType::Spot => self.shadow_views[first_view].shadow_matrix,
        };
        self.light_shadows.insert(
            light_key,
            LightShadows {
                first_view,
                view_count,
                shadow: LightShadowData {
                    matrix,
                    texel_size: Vec2::ONE / atlas.max(IVec2::ONE).as_vec2(),
                },
            },
        );
        self.stats.shadow_views += view_count as u32;
        true
    }

    /// Collect, sort and instance the shadow casters of one view.
    ///
    /// Casters come from the whole scene, visible or not. A view is
    /// collected once per frame; repeated calls for it leave its queue and
    /// the instance buffer untouched.
    pub fn collect_shadow_batches(
        &mut self,
        scene: &Scene,
        resources: &ResourceRegistry,
        view: ShadowViewHandle,
    ) -> Result<()> {
        self.phase.require(
            "collect_shadow_batches",
            &[FramePhase::LightsCollected, FramePhase::ShadowsCollected],
        )?;

        let Some(shadow_view) = self.shadow_views[..self.used_shadow_views].get(view.index()) else {
            return Err(invalid_resource(format!("unknown shadow view {}", view.index())));
        };
        if shadow_view.collected {
            engine_debug!(
                "lumen::Renderer",
                "Shadow view {} already collected this frame",
                view.index()
            );
            return Ok(());
        }
        let (light_key, map_index, queue_index) =
            (shadow_view.light, shadow_view.map, shadow_view.queue);
        let (frustum, view_matrix, far_clip) =
            (shadow_view.frustum, shadow_view.view_matrix, shadow_view.far_clip);

        let Some(light) = scene.light(light_key) else {
            return Err(invalid_resource(format!("shadow view light {:?} left the scene", light_key)));
        };

        self.node_scratch.clear();
        self.interaction
            .shadow_casters(scene, light, &frustum, &mut self.node_scratch);

        let instancing = self.is_instancing_enabled();
        let Some(queue) = self
            .shadow_maps
            .get_mut(map_index)
            .and_then(|map| map.queue_mut(queue_index))
        else {
            return Err(invalid_resource(format!("shadow view {} has no queue", view.index())));
        };
        queue.clear();

        for &node_key in &self.node_scratch {
            let Some(node) = scene.node(node_key) else {
                continue;
            };
            let distance = -view_matrix.transform_point3(node.world_center()).z;
            for source in node.sources() {
                let Some(material) = resources.material(source.material) else {
                    engine_warn!("lumen::Renderer", "Node {:?} uses an unknown material", node_key);
                    continue;
                };
                let Some(pass) = material.pass(PassType::Shadow) else {
                    continue;
                };
                if resources.geometry(source.geometry).is_none() {
                    engine_warn!("lumen::Renderer", "Node {:?} uses an unknown geometry", node_key);
                    continue;
                }
                let pass_ref = PassRef { material: source.material, pass: PassType::Shadow };
                queue.push(node_batch(node_key, node, source.geometry, pass_ref, pass, None, false, distance));
            }
        }

        queue.sort(far_clip);
        if instancing {
            self.stats.instanced_batches += queue.convert_to_instances(scene, &mut self.instances);
        }
        self.shadow_views[view.index()].collected = true;

        self.phase = FramePhase::ShadowsCollected;
        Ok(())
    }

    /// Collect opaque, opaque-additive and alpha batches of visible nodes.
    ///
    /// The first light pass of a node is drawn by its base batch, together
    /// with ambient light; every further pass adds an additive batch.
    pub fn collect_node_batches(&mut self, scene: &Scene, resources: &ResourceRegistry) -> Result<()> {
        self.phase.require(
            "collect_node_batches",
            &[FramePhase::LightsCollected, FramePhase::ShadowsCollected],
        )?;

        for (index, visible) in self.visible.nodes.iter().enumerate() {
            let Some(node) = scene.node(visible.key) else {
                continue;
            };
            let list = self
                .node_light_lists
                .get(index)
                .copied()
                .flatten()
                .and_then(|handle| self.light_lists.list(handle).map(|list| (handle, list)));
            let pass_count = list.map_or(0, |(_, list)| list.passes().len());
            let light_pass = |i: usize| light_pass_at(list, i);

            for source in node.sources() {
                let Some(material) = resources.material(source.material) else {
                    engine_warn!("lumen::Renderer", "Node {:?} uses an unknown material", visible.key);
                    continue;
                };
                if resources.geometry(source.geometry).is_none() {
                    engine_warn!("lumen::Renderer", "Node {:?} uses an unknown geometry", visible.key);
                    continue;
                }

                if let Some(pass) = material.pass(PassType::Alpha) {
                    let pass_ref = PassRef { material: source.material, pass: PassType::Alpha };
                    for i in 0..pass_count.max(1) {
                        self.alpha.push(node_batch(
                            visible.key, node, source.geometry, pass_ref, pass,
                            light_pass(i), i == 0, visible.distance,
                        ));
                    }
                } else if let Some(pass) = material.pass(PassType::Opaque) {
                    let pass_ref = PassRef { material: source.material, pass: PassType::Opaque };
                    self.opaque.push(node_batch(
                        visible.key, node, source.geometry, pass_ref, pass,
                        light_pass(0), true, visible.distance,
                    ));

                    if let Some(additive) = material.pass(PassType::OpaqueAdditive) {
                        let additive_ref = PassRef {
                            material: source.material,
                            pass: PassType::OpaqueAdditive,
                        };
                        for i in 1..pass_count {
                            self.opaque_additive.push(node_batch(
                                visible.key, node, source.geometry, additive_ref, additive,
                                light_pass(i), false, visible.distance,
                            ));
                        }
                    }
                }
            }
        }

        self.phase = FramePhase::NodeBatchesCollected;
        Ok(())
    }

    /// Sort the node queues and merge instanceable runs.
    pub fn sort_node_batches(&mut self, scene: &Scene) -> Result<()> {
        self.phase.require("sort_node_batches", &[FramePhase::NodeBatchesCollected])?;

        let max_distance = self.sort_distance();
        self.opaque.sort(max_distance);
        self.opaque_additive.sort(max_distance);
        self.alpha.sort(max_distance);

        if self.is_instancing_enabled() {
            self.stats.instanced_batches += self.opaque.convert_to_instances(scene, &mut self.instances);
            self.stats.instanced_batches +=
                self.opaque_additive.convert_to_instances(scene, &mut self.instances);
        }
        self.instances.finish();

        let shadow_batches: usize = self
            .shadow_maps
            .iter()
            .flat_map(|map| (0..map.used_queues()).filter_map(move |i| map.queue(i)))
            .map(BatchQueue::len)
            .sum();
        self.stats.batches =
            (self.opaque.len() + self.opaque_additive.len() + self.alpha.len() + shadow_batches) as u32;
        self.stats.instances = self.instances.len() as u32;

        self.phase = FramePhase::Sorted;
        Ok(())
    }

    /// Everything from `begin_frame` to `sort_node_batches` in one call.
    pub fn prepare_view(
        &mut self,
        scene: &Scene,
        resources: &ResourceRegistry,
        camera: &Camera,
        use_shadows: bool,
    ) -> Result<()> {
        self.begin_frame(camera)?;
        self.collect_visible(scene)?;
        self.collect_light_interactions(scene, use_shadows)?;
        for i in 0..self.used_shadow_views {
            self.collect_shadow_batches(scene, resources, ShadowViewHandle(i as u32))?;
        }
        self.collect_node_batches(scene, resources)?;
        self.sort_node_batches(scene)
    }

    /// Draw every shadow view into its atlas rectangle.
    pub fn render_shadow_maps(
        &mut self,
        scene: &Scene,
        resources: &ResourceRegistry,
        submitter: &mut dyn DrawSubmitter,
    ) -> Result<()> {
        self.phase.require("render_shadow_maps", &[FramePhase::Sorted])?;
        self.upload_instances(submitter)?;

        let ctx = SubmitContext {
            scene,
            resources,
            light_lists: &self.light_lists,
            instances: &self.instances,
        };
        for (map_index, map) in self.shadow_maps.iter().enumerate() {
            for &handle in map.views() {
                let view = &self.shadow_views[handle.index()];
                submitter.begin_shadow_view(map_index, map.texture(), view)?;
                if let Some(queue) = map.queue(view.queue) {
                    submit_queue(submitter, PassType::Shadow, queue, &ctx, &mut self.stats)?;
                }
            }
        }

        self.phase = FramePhase::ShadowsRendered;
        Ok(())
    }

    /// Draw the opaque queue, then the opaque-additive queue.
    pub fn render_opaque(
        &mut self,
        scene: &Scene,
        resources: &ResourceRegistry,
        submitter: &mut dyn DrawSubmitter,
    ) -> Result<()> {
        self.phase.require(
            "render_opaque",
            &[FramePhase::Sorted, FramePhase::ShadowsRendered],
        )?;
        self.upload_instances(submitter)?;

        let ctx = SubmitContext {
            scene,
            resources,
            light_lists: &self.light_lists,
            instances: &self.instances,
        };
        submit_queue(submitter, PassType::Opaque, &self.opaque, &ctx, &mut self.stats)?;
        submit_queue(submitter, PassType::OpaqueAdditive, &self.opaque_additive, &ctx, &mut self.stats)?;

        self.phase = FramePhase::OpaqueRendered;
        Ok(())
    }

    /// Draw the alpha queue, back to front.
    pub fn render_alpha(
        &mut self,
        scene: &Scene,
        resources: &ResourceRegistry,
        submitter: &mut dyn DrawSubmitter,
    ) -> Result<()> {
        self.phase.require("render_alpha", &[FramePhase::OpaqueRendered])?;

        let ctx = SubmitContext {
            scene,
            resources,
            light_lists: &self.light_lists,
            instances: &self.instances,
        };
        submit_queue(submitter, PassType::Alpha, &self.alpha, &ctx, &mut self.stats)?;

        self.phase = FramePhase::AlphaRendered;
        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<()> {
        self.phase.require("end_frame", &[FramePhase::AlphaRendered])?;
        self.phase = FramePhase::Idle;
        engine_trace!(
            "lumen::Renderer",
            "Frame ended: {} batches ({} instanced), {} draws, {} state changes",
            self.stats.batches, self.stats.instanced_batches, self.stats.draw_calls, self.stats.state_changes
        );
        Ok(())
    }

    /// Drop the frame in progress, whatever its phase.
    pub fn abandon_frame(&mut self) {
        if self.phase.is_in_frame() {
            engine_debug!("lumen::Renderer", "Frame abandoned in phase {:?}", self.phase);
        }
        self.reset_transient_state();
        self.phase = FramePhase::Idle;
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn light_lists(&self) -> &LightListCache {
        &self.light_lists
    }

    /// Light list of a visible node this frame
    pub fn node_light_list(&self, node: NodeKey) -> Option<LightListHandle> {
        let index = *self.node_index.get(&node)?;
        self.node_light_lists.get(index as usize).copied().flatten()
    }

    pub fn shadow_maps(&self) -> &[ShadowMap] {
        &self.shadow_maps
    }

    /// Shadow views of this frame
    pub fn shadow_views(&self) -> &[ShadowView] {
        &self.shadow_views[..self.used_shadow_views]
    }

    pub fn shadow_view(&self, handle: ShadowViewHandle) -> Option<&ShadowView> {
        self.shadow_views().get(handle.index())
    }

    /// Handles of this frame's shadow views, in allocation order.
    ///
    /// Feed these to `collect_shadow_batches` when stepping a frame by hand.
    pub fn shadow_view_handles(&self) -> impl Iterator<Item = ShadowViewHandle> {
        (0..self.used_shadow_views as u32).map(ShadowViewHandle)
    }

    /// Shadow views of one light, empty when it renders unshadowed
    pub fn light_shadow_views(&self, light: LightKey) -> &[ShadowView] {
        match self.light_shadows.get(&light) {
            Some(entry) => &self.shadow_views[entry.first_view..entry.first_view + entry.view_count],
            None => &[],
        }
    }

    /// Handles of one light's shadow views, empty when it renders unshadowed
    pub fn light_shadow_view_handles(&self, light: LightKey) -> impl Iterator<Item = ShadowViewHandle> {
        let range = self
            .light_shadows
            .get(&light)
            .map_or(0..0, |entry| entry.first_view..entry.first_view + entry.view_count);
        range.map(|index| ShadowViewHandle(index as u32))
    }

    pub fn opaque_batches(&self) -> &BatchQueue {
        &self.opaque
    }

    pub fn opaque_additive_batches(&self) -> &BatchQueue {
        &self.opaque_additive
    }

    pub fn alpha_batches(&self) -> &BatchQueue {
        &self.alpha
    }

    pub fn instance_buffer(&self) -> &InstanceBuffer {
        &self.instances
    }

    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    // ===== INTERNALS =====

    fn reset_transient_state(&mut self) {
        self.visible.clear();
        self.node_index.clear();
        self.node_light_lists.clear();
        self.interactions.clear();
        self.lit_lights.clear();
        self.light_lists.begin_frame();
        for map in &mut self.shadow_maps {
            map.clear();
        }
        self.used_shadow_views = 0;
        self.light_shadows.clear();
        self.opaque.clear();
        self.opaque_additive.clear();
        self.alpha.clear();
        self.instances.begin_frame();
        self.stats.reset();
    }

    /// Distance range for sort key quantization
    fn sort_distance(&self) -> f32 {
        let far = self.camera.far_clip();
        if far.is_finite() && far > 0.0 {
            far
        } else {
            self.config.max_sort_distance
        }
    }

    fn upload_instances(&mut self, submitter: &mut dyn DrawSubmitter) -> Result<()> {
        if self.instances.is_dirty() {
            submitter.upload_instances(self.instances.as_bytes(), self.instances.len())?;
            self.instances.mark_uploaded();
        }
        Ok(())
    }
}

fn create_shadow_maps(config: &RendererConfig) -> Vec<ShadowMap> {
    let mut maps = Vec::with_capacity(2);
    for size in [config.directional_shadow_size, config.shadow_atlas_size] {
        maps.push(ShadowMap::new(ShadowTextureDesc {
            width: size,
            height: size,
            format: config.shadow_format,
        }));
    }
    maps
}

/// Light-data "matrix" of a point light: the atlas rectangle of its six
/// faces in texture coordinates, then its shadow camera clip range.
fn point_shadow_matrix(rect: IntRect, atlas: IVec2, near: f32, far: f32) -> Mat4 {
    let atlas = atlas.max(IVec2::ONE).as_vec2();
    let rows = Mat4::from_cols(
        Vec4::new(
            rect.left as f32 / atlas.x,
            rect.top as f32 / atlas.y,
            rect.width() as f32 / atlas.x,
            rect.height() as f32 / atlas.y,
        ),
        Vec4::new(near, far, 0.0, 0.0),
        Vec4::ZERO,
        Vec4::ZERO,
    );
    rows.transpose()
}

#[allow(clippy::too_many_arguments)]
fn node_batch(
    node_key: NodeKey,
    node: &GeometryNode,
    geometry: GeometryKey,
    pass_ref: PassRef,
    pass: &Pass,
    light_pass: Option<(LightPassRef, &LightPass)>,
    ambient: bool,
    distance: f32,
) -> Batch {
    let geometry_type = node.geometry_type();
    let mut bits = ProgramBits::empty();
    if ambient {
        bits |= ProgramBits::AMBIENT;
    }
    if geometry_type == GeometryType::Skinned {
        bits |= ProgramBits::SKINNED;
    }
    let mut program = ShaderProgram::new(pass.shader()).with_bits(bits);
    if let Some((_, lights)) = light_pass {
        program = program.with_lights(lights.light_bits(), lights.shadow_bits());
    }

    Batch {
        light_pass: light_pass.map(|(pass_ref, _)| pass_ref),
        program,
        pass: pass_ref,
        geometry,
        geometry_type,
        distance,
        sort_key: SortKey::Unsorted,
        owner: if geometry_type.is_instanceable() {
            BatchOwner::Transform(node_key)
        } else {
            BatchOwner::Node(node_key)
        },
    }
}

fn light_pass_at(
    list: Option<(LightListHandle, &LightList)>,
    pass: usize,
) -> Option<(LightPassRef, &LightPass)> {
    let (handle, list) = list?;
    let light_pass = list.passes().get(pass)?;
    Some((LightPassRef { list: handle, pass: pass as u32 }, light_pass))
}

fn invalid_resource(message: String) -> Error {
    engine_error!("lumen::Renderer", "{}", message);
    Error::InvalidResource(message)
}

struct SubmitContext<'a> {
    scene: &'a Scene,
    resources: &'a ResourceRegistry,
    light_lists: &'a LightListCache,
    instances: &'a InstanceBuffer,
}

fn submit_queue(
    submitter: &mut dyn DrawSubmitter,
    pass_type: PassType,
    queue: &BatchQueue,
    ctx: &SubmitContext<'_>,
    stats: &mut FrameStats,
) -> Result<()> {
    if queue.is_empty() {
        return Ok(());
    }
    submitter.begin_queue(pass_type, queue.len())?;

    let mut previous: Option<BatchState> = None;
    for batch in queue.iter() {
        let Some(geometry) = ctx.resources.geometry(batch.geometry) else {
            return Err(invalid_resource(format!("geometry {:?} removed during the frame", batch.geometry)));
        };
        let Some(pass) = ctx.resources.pass(batch.pass) else {
            return Err(invalid_resource(format!("material pass {:?} removed during the frame", batch.pass)));
        };
        let instance_transforms = batch
            .instances()
            .and_then(|range| {
                let start = range.start as usize;
                ctx.instances.transforms().get(start..start + range.count as usize)
            })
            .unwrap_or(&[]);

        submitter.draw(&DrawCall {
            batch,
            geometry,
            pass,
            world_transform: batch
                .node()
                .and_then(|node| ctx.scene.node(node))
                .map(|node| *node.world_transform()),
            light_pass: batch.light_pass.and_then(|pass_ref| ctx.light_lists.pass(pass_ref)),
            instance_transforms,
        })?;

        stats.draw_calls += 1;
        let state = batch.state();
        if previous != Some(state) {
            stats.state_changes += 1;
            previous = Some(state);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
