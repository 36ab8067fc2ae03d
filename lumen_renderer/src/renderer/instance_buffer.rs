/// Per-instance world transforms of instanced batches.
///
/// Rebuilt every frame. The buffer is only flagged dirty when this frame's
/// transforms differ from the last upload, so a static scene uploads once.

use glam::Mat4;

#[derive(Debug, Default)]
pub struct InstanceBuffer {
    transforms: Vec<Mat4>,
    uploaded: Vec<Mat4>,
    peak: usize,
    dirty: bool,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame: drop the transforms, keep the storage.
    pub fn begin_frame(&mut self) {
        self.transforms.clear();
        self.dirty = false;
    }

    /// Append transforms, returning the index of the first one.
    pub fn extend<I>(&mut self, transforms: I) -> u32
    where
        I: IntoIterator<Item = Mat4>,
    {
        let start = self.transforms.len() as u32;
        self.transforms.extend(transforms);
        self.peak = self.peak.max(self.transforms.len());
        start
    }

    /// Compare against the last upload and update the dirty flag.
    pub fn finish(&mut self) {
        self.dirty = self.transforms != self.uploaded;
    }

    /// Record that the current contents reached the GPU.
    pub fn mark_uploaded(&mut self) {
        self.uploaded.clone_from(&self.transforms);
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    /// Transforms as raw bytes, column-major f32
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.transforms)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Largest instance count seen in any frame
    pub fn peak(&self) -> usize {
        self.peak
    }
}

#[cfg(test)]
#[path = "instance_buffer_tests.rs"]
mod tests;
