/// Draw submission boundary.
///
/// The renderer never talks to a GPU. It walks its sorted queues and hands
/// every batch, with everything needed to bind its state, to a
/// `DrawSubmitter` supplied by the caller.

use glam::Mat4;
use crate::error::Result;
use crate::resource::{Geometry, Pass, PassType};
use super::batch::Batch;
use super::light_list::LightPass;
use super::shadow::{ShadowTextureDesc, ShadowView};

/// Everything needed to issue one draw
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub batch: &'a Batch,
    pub geometry: &'a Geometry,
    pub pass: &'a Pass,
    /// World transform of a single-object batch
    pub world_transform: Option<Mat4>,
    /// Lights applied by this draw, if any
    pub light_pass: Option<&'a LightPass>,
    /// Transforms of an instanced batch, in instance order
    pub instance_transforms: &'a [Mat4],
}

/// Consumer of the renderer's sorted batches
pub trait DrawSubmitter {
    /// Whether instanced draws are available
    fn supports_instancing(&self) -> bool {
        true
    }

    /// Upload the instance buffer (column-major 4x4 f32 matrices).
    fn upload_instances(&mut self, data: &[u8], instance_count: usize) -> Result<()>;

    /// Bind a shadow view: the atlas, its viewport and depth bias.
    fn begin_shadow_view(
        &mut self,
        map_index: usize,
        texture: &ShadowTextureDesc,
        view: &ShadowView,
    ) -> Result<()>;

    /// Start drawing a queue of `batch_count` batches.
    fn begin_queue(&mut self, pass_type: PassType, batch_count: usize) -> Result<()>;

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;
}
