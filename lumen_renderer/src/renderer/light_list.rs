/// Light list cache.
///
/// Renderables lit by the same ordered set of lights share one `LightList`.
/// Lists are built once per frame from a pool that survives across frames:
/// `begin_frame` rewinds the pool watermark and clears the key map, but
/// keeps every list's storage.
///
/// The key is a 64-bit order-sensitive hash of the light keys. Equal keys
/// do not imply equal light sets: lists sharing a key are chained in one
/// bucket and the light sequence is compared before a list is reused.

use std::hash::{Hash, Hasher};
use glam::{Mat4, Vec2, Vec4};
use rustc_hash::{FxHashMap, FxHasher};
use crate::scene::{LightKey, LightType, Scene};

/// Lights packed into one LightPass
pub const MAX_LIGHTS_PER_PASS: usize = 4;

/// Vec4 parameters per light slot in a LightPass
///
/// Layout: position, negated direction, attenuation, color, shadow
/// parameters, then the four rows of the shadow matrix.
pub const LIGHT_DATA_VECTORS: usize = 9;

/// Handle of a LightList, valid until the next `begin_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightListHandle(pub(crate) u32);

impl LightListHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reference to one pass of a LightList
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightPassRef {
    pub list: LightListHandle,
    pub pass: u32,
}

/// Shadow data of a light that owns shadow views this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadowData {
    /// World to atlas texture space
    pub matrix: Mat4,
    /// Size of one atlas texel in texture coordinates
    pub texel_size: Vec2,
}

/// Up to four lights rendered by a single shader invocation
#[derive(Debug, Clone)]
pub struct LightPass {
    lights: [LightKey; MAX_LIGHTS_PER_PASS],
    count: usize,
    light_bits: u8,
    shadow_bits: u8,
    ambient: bool,
    data: [Vec4; MAX_LIGHTS_PER_PASS * LIGHT_DATA_VECTORS],
}

impl LightPass {
    fn new(ambient: bool) -> Self {
        Self {
            lights: [LightKey::default(); MAX_LIGHTS_PER_PASS],
            count: 0,
            light_bits: 0,
            shadow_bits: 0,
            ambient,
            data: [Vec4::ZERO; MAX_LIGHTS_PER_PASS * LIGHT_DATA_VECTORS],
        }
    }

    fn push(&mut self, key: LightKey, light_type: LightType) {
        self.light_bits |= light_type.bits() << (self.count * 2);
        self.lights[self.count] = key;
        self.count += 1;
    }

    pub fn lights(&self) -> &[LightKey] {
        &self.lights[..self.count]
    }

    pub fn light_count(&self) -> usize {
        self.count
    }

    /// Two bits per slot: light type + 1, 0 for an empty slot
    pub fn light_bits(&self) -> u8 {
        self.light_bits
    }

    /// One bit per slot whose light samples a shadow map
    pub fn shadow_bits(&self) -> u8 {
        self.shadow_bits
    }

    /// First pass of a list: also applies ambient light
    pub fn is_ambient(&self) -> bool {
        self.ambient
    }

    /// Flat parameter block, `LIGHT_DATA_VECTORS` Vec4s per slot
    pub fn data(&self) -> &[Vec4] {
        &self.data
    }

    /// Parameters of one slot
    pub fn slot_data(&self, slot: usize) -> &[Vec4] {
        let start = slot.min(MAX_LIGHTS_PER_PASS - 1) * LIGHT_DATA_VECTORS;
        &self.data[start..start + LIGHT_DATA_VECTORS]
    }
}

/// Lights affecting a renderable, split into passes
#[derive(Debug, Clone, Default)]
pub struct LightList {
    key: u64,
    use_count: u32,
    lights: Vec<LightKey>,
    passes: Vec<LightPass>,
    next_in_bucket: Option<LightListHandle>,
}

impl LightList {
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Number of renderables sharing this list this frame
    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    /// Lights in the order they were supplied
    pub fn lights(&self) -> &[LightKey] {
        &self.lights
    }

    /// Passes, shadow-casting lights first
    pub fn passes(&self) -> &[LightPass] {
        &self.passes
    }
}

/// Order-sensitive 64-bit key of a light sequence.
pub fn light_list_key(lights: &[LightKey]) -> u64 {
    let mut hasher = FxHasher::default();
    for light in lights {
        light.hash(&mut hasher);
    }
    hasher.finish()
}

/// Pool of light lists, reused frame after frame
#[derive(Debug, Default)]
pub struct LightListCache {
    pool: Vec<LightList>,
    used: usize,
    buckets: FxHashMap<u64, LightListHandle>,
    valid_lights: Vec<LightKey>,
    ordered_lights: Vec<LightKey>,
}

impl LightListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget this frame's lists, keep their storage.
    pub fn begin_frame(&mut self) {
        self.used = 0;
        self.buckets.clear();
    }

    /// Light list for an ordered light set.
    ///
    /// Lights missing from the scene are ignored; `None` when no light is
    /// left. An equal sequence seen earlier this frame returns the same
    /// handle and bumps its use count.
    pub fn get_or_create(&mut self, lights: &[LightKey], scene: &Scene) -> Option<LightListHandle> {
        self.valid_lights.clear();
        self.valid_lights
            .extend(lights.iter().copied().filter(|&key| scene.light(key).is_some()));
        if self.valid_lights.is_empty() {
            return None;
        }

        let key = light_list_key(&self.valid_lights);
        let head = self.buckets.get(&key).copied();

        let mut probe = head;
        while let Some(handle) = probe {
            let list = &mut self.pool[handle.index()];
            if list.lights == self.valid_lights {
                list.use_count += 1;
                return Some(handle);
            }
            probe = list.next_in_bucket;
        }

        // Shadow casters first, supplied order otherwise (stable sort)
        self.ordered_lights.clear();
        self.ordered_lights.extend_from_slice(&self.valid_lights);
        self.ordered_lights
            .sort_by_key(|&light| !scene.light(light).is_some_and(|l| l.cast_shadows()));

        if self.used == self.pool.len() {
            self.pool.push(LightList::default());
        }
        let handle = LightListHandle(self.used as u32);
        self.used += 1;

        let list = &mut self.pool[handle.index()];
        list.key = key;
        list.use_count = 1;
        list.next_in_bucket = head;
        list.lights.clear();
        list.lights.extend_from_slice(&self.valid_lights);
        list.passes.clear();

        for (i, &light_key) in self.ordered_lights.iter().enumerate() {
            if i % MAX_LIGHTS_PER_PASS == 0 {
                list.passes.push(LightPass::new(i == 0));
            }
            if let (Some(pass), Some(light)) = (list.passes.last_mut(), scene.light(light_key)) {
                pass.push(light_key, light.light_type());
            }
        }

        self.buckets.insert(key, handle);
        Some(handle)
    }

    /// List behind a handle of this frame
    pub fn list(&self, handle: LightListHandle) -> Option<&LightList> {
        self.pool[..self.used].get(handle.index())
    }

    pub fn pass(&self, pass_ref: LightPassRef) -> Option<&LightPass> {
        self.list(pass_ref.list)?.passes.get(pass_ref.pass as usize)
    }

    /// Lists handed out this frame
    pub fn used(&self) -> usize {
        self.used
    }

    /// Lists allocated across all frames
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Fill the parameter block and shadow bits of every pass in use.
    ///
    /// `shadow` returns the shadow data of lights that own shadow views
    /// this frame.
    pub fn write_light_data<F>(&mut self, scene: &Scene, shadow: F)
    where
        F: Fn(LightKey) -> Option<LightShadowData>,
    {
        for list in &mut self.pool[..self.used] {
            for pass in &mut list.passes {
                pass.shadow_bits = 0;
                pass.data = [Vec4::ZERO; MAX_LIGHTS_PER_PASS * LIGHT_DATA_VECTORS];

                for slot in 0..pass.count {
                    let key = pass.lights[slot];
                    let Some(light) = scene.light(key) else {
                        continue;
                    };
                    let base = slot * LIGHT_DATA_VECTORS;
                    let data = &mut pass.data[base..base + LIGHT_DATA_VECTORS];

                    let cutoff = light.cutoff();
                    let spot_scale = if cutoff < 1.0 { 1.0 / (1.0 - cutoff) } else { 0.0 };
                    data[0] = light.position().extend(1.0);
                    data[1] = (-light.direction()).extend(0.0);
                    data[2] = Vec4::new(1.0 / light.range().max(f32::EPSILON), cutoff, spot_scale, 0.0);
                    data[3] = light.color();

                    if let Some(shadow) = shadow(key) {
                        pass.shadow_bits |= 1 << slot;
                        data[4] = Vec4::new(
                            shadow.texel_size.x,
                            shadow.texel_size.y,
                            light.shadow_fade_start(),
                            light.shadow_max_strength(),
                        );
                        for row in 0..4 {
                            data[5 + row] = shadow.matrix.row(row);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "light_list_tests.rs"]
mod tests;
