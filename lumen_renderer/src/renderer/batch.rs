/// Batches and batch queues.
///
/// A Batch describes one draw: geometry, material pass, shader program,
/// optional light pass and who provides the world transform. Queues are
/// filled every frame, sorted, and optionally have runs of identical
/// static batches merged into instanced draws.
///
/// # Sort keys
///
/// State queues (opaque, opaque-additive, shadow) sort by the key:
///
/// ```text
/// | state rank (16) | quantized distance (16) | sequence (32) |
/// ```
///
/// The state rank is the position of the batch's state tuple among the
/// distinct states of the queue, so equal states end up contiguous and
/// state changes dominate over front-to-back order. Queues with more than
/// 65536 distinct states widen the rank to 32 bits above the same low
/// 48 bits, so ranks never saturate. Alpha queues sort
/// strictly back to front, ties broken by sequence.

use glam::Mat4;
use rdst::{RadixKey, RadixSort};
use crate::resource::{GeometryKey, PassRef, ProgramBits, ShaderProgram};
use crate::scene::{GeometryType, NodeKey, Scene};
use crate::utils::{ordered_f32_bits, quantize_distance};
use super::instance_buffer::InstanceBuffer;
use super::light_list::LightPassRef;

/// Range of the instance buffer drawn by an instanced batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceRange {
    pub start: u32,
    pub count: u32,
}

/// Provider of a batch's world transform(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOwner {
    /// Static geometry: the node's world transform
    Transform(NodeKey),
    /// Skinned or custom geometry: per-node state the submitter reads
    Node(NodeKey),
    /// Instanced draw over a range of the instance buffer
    Instances(InstanceRange),
}

/// Sort key written by `BatchQueue::sort`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey {
    Unsorted,
    /// `rank << 48 | quantized distance << 32 | sequence`, rank up to 32 bits
    State(u128),
    Distance(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// State first, then front to back
    State,
    /// Strictly back to front
    BackToFront,
}

/// The state a batch binds. Equal states can be instanced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchState {
    pub program: ShaderProgram,
    pub pass: PassRef,
    pub light_pass: Option<LightPassRef>,
    pub geometry: GeometryKey,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch {
    pub light_pass: Option<LightPassRef>,
    pub program: ShaderProgram,
    pub pass: PassRef,
    pub geometry: GeometryKey,
    pub geometry_type: GeometryType,
    /// View depth used for sorting
    pub distance: f32,
    pub sort_key: SortKey,
    pub owner: BatchOwner,
}

impl Batch {
    pub fn state(&self) -> BatchState {
        BatchState {
            program: self.program,
            pass: self.pass,
            light_pass: self.light_pass,
            geometry: self.geometry,
        }
    }

    /// Static, not yet instanced, transform-owned
    pub fn is_instanceable(&self) -> bool {
        self.geometry_type.is_instanceable()
            && matches!(self.owner, BatchOwner::Transform(_))
            && !self.program.is_instanced()
    }

    /// Node of a single-object batch
    pub fn node(&self) -> Option<NodeKey> {
        match self.owner {
            BatchOwner::Transform(node) | BatchOwner::Node(node) => Some(node),
            BatchOwner::Instances(_) => None,
        }
    }

    pub fn instances(&self) -> Option<InstanceRange> {
        match self.owner {
            BatchOwner::Instances(range) => Some(range),
            _ => None,
        }
    }

    fn world_transform(&self, scene: &Scene) -> Mat4 {
        self.node()
            .and_then(|node| scene.node(node))
            .map_or(Mat4::IDENTITY, |node| *node.world_transform())
    }
}

#[derive(Debug, Clone, Copy)]
struct SortEntry {
    key: u64,
    index: u32,
}

impl RadixKey for SortEntry {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.key >> (level * 8)) as u8
    }
}

/// Sort entry for queues whose state ranks need more than 16 bits
#[derive(Debug, Clone, Copy)]
struct WideSortEntry {
    key: u128,
    index: u32,
}

impl RadixKey for WideSortEntry {
    // 32-bit rank above the 48 distance and sequence bits
    const LEVELS: usize = 10;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.key >> (level * 8)) as u8
    }
}

/// Batches destined for one render pass
#[derive(Debug)]
pub struct BatchQueue {
    mode: SortMode,
    batches: Vec<Batch>,
    states: Vec<BatchState>,
    entries: Vec<SortEntry>,
    wide_entries: Vec<WideSortEntry>,
    scratch: Vec<Batch>,
}

impl BatchQueue {
    pub fn new(mode: SortMode) -> Self {
        Self {
            mode,
            batches: Vec::new(),
            states: Vec::new(),
            entries: Vec::new(),
            wide_entries: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn push(&mut self, batch: Batch) {
        self.batches.push(batch);
    }

    /// Drop the batches, keep the storage.
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn has_batches(&self) -> bool {
        !self.batches.is_empty()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// Sort the queue. `max_distance` scales distance quantization.
    ///
    /// Sorting an already sorted queue keeps its order.
    pub fn sort(&mut self, max_distance: f32) {
        if self.batches.is_empty() {
            return;
        }

        if self.mode == SortMode::State {
            self.states.clear();
            self.states.extend(self.batches.iter().map(Batch::state));
            self.states.sort_unstable();
            self.states.dedup();
        }

        let wide = self.states.len() > usize::from(u16::MAX) + 1;
        self.entries.clear();
        self.wide_entries.clear();
        for (sequence, batch) in self.batches.iter_mut().enumerate() {
            let key = match self.mode {
                SortMode::State => {
                    let rank = self.states.binary_search(&batch.state()).unwrap_or(0) as u128;
                    let depth = quantize_distance(batch.distance, max_distance) as u128;
                    let key = rank << 48 | depth << 32 | sequence as u128;
                    batch.sort_key = SortKey::State(key);
                    key
                }
                SortMode::BackToFront => {
                    batch.sort_key = SortKey::Distance(batch.distance);
                    ((!ordered_f32_bits(batch.distance)) as u128) << 32 | sequence as u128
                }
            };
            let index = sequence as u32;
            if wide {
                self.wide_entries.push(WideSortEntry { key, index });
            } else {
                self.entries.push(SortEntry { key: key as u64, index });
            }
        }

        self.scratch.clear();
        if wide {
            self.wide_entries.radix_sort_unstable();
            self.scratch
                .extend(self.wide_entries.iter().map(|entry| self.batches[entry.index as usize]));
        } else {
            self.entries.radix_sort_unstable();
            self.scratch
                .extend(self.entries.iter().map(|entry| self.batches[entry.index as usize]));
        }
        std::mem::swap(&mut self.batches, &mut self.scratch);
    }

    /// Merge runs of identical instanceable batches into instanced batches.
    ///
    /// The run's world transforms are appended, in order, to `instances`.
    /// Back-to-front queues are never instanced. Returns the number of
    /// instanced batches created.
    pub fn convert_to_instances(&mut self, scene: &Scene, instances: &mut InstanceBuffer) -> u32 {
        if self.mode != SortMode::State || self.batches.len() < 2 {
            return 0;
        }

        self.scratch.clear();
        let mut created = 0;
        let mut start = 0;
        while start < self.batches.len() {
            let first = self.batches[start];
            let mut end = start + 1;
            if first.is_instanceable() {
                let state = first.state();
                while end < self.batches.len()
                    && self.batches[end].is_instanceable()
                    && self.batches[end].state() == state
                {
                    end += 1;
                }
            }

            if end - start >= 2 {
                let run = &self.batches[start..end];
                let first_instance = instances.extend(run.iter().map(|b| b.world_transform(scene)));
                let mut merged = first;
                merged.program = merged.program.with_bits(ProgramBits::INSTANCED);
                merged.owner = BatchOwner::Instances(InstanceRange {
                    start: first_instance,
                    count: run.len() as u32,
                });
                self.scratch.push(merged);
                created += 1;
            } else {
                self.scratch.extend_from_slice(&self.batches[start..end]);
            }
            start = end;
        }

        std::mem::swap(&mut self.batches, &mut self.scratch);
        created
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
