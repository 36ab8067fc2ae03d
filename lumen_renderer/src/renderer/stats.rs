/// Per-frame renderer counters, reset by `begin_frame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub visible_nodes: u32,
    pub visible_lights: u32,
    /// Light lists in use (cache hits do not count)
    pub light_lists: u32,
    pub shadow_views: u32,
    /// Shadow-casting lights that found no room in their atlas
    pub failed_shadow_allocations: u32,
    /// Batches in all queues after instancing
    pub batches: u32,
    /// Batches produced by merging instanceable runs
    pub instanced_batches: u32,
    /// Transforms written to the instance buffer
    pub instances: u32,
    pub draw_calls: u32,
    /// Draws whose state differs from the previous draw of the same queue
    pub state_changes: u32,
}

impl FrameStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
