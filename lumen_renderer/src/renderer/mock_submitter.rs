/// Recording DrawSubmitter for unit tests

#[cfg(test)]
use glam::Mat4;
#[cfg(test)]
use crate::error::Result;
#[cfg(test)]
use crate::engine_bail;
#[cfg(test)]
use crate::math::IntRect;
#[cfg(test)]
use crate::resource::PassType;
#[cfg(test)]
use crate::renderer::{Batch, DrawCall, DrawSubmitter, ShadowTextureDesc, ShadowView};

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitEvent {
    Upload { instance_count: usize, byte_len: usize },
    ShadowView { map_index: usize, viewport: IntRect },
    Queue { pass_type: PassType, batch_count: usize },
    Draw {
        batch: Batch,
        world_transform: Option<Mat4>,
        light_count: usize,
        instance_transforms: Vec<Mat4>,
    },
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockSubmitter {
    pub events: Vec<SubmitEvent>,
    pub instancing: bool,
    /// Fail the n-th draw call (0-based)
    pub fail_draw_at: Option<usize>,
    draws: usize,
}

#[cfg(test)]
impl MockSubmitter {
    pub fn new() -> Self {
        Self {
            instancing: true,
            ..Self::default()
        }
    }

    pub fn without_instancing() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> Vec<&SubmitEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, SubmitEvent::Draw { .. }))
            .collect()
    }

    pub fn queues(&self) -> Vec<PassType> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SubmitEvent::Queue { pass_type, .. } => Some(*pass_type),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl DrawSubmitter for MockSubmitter {
    fn supports_instancing(&self) -> bool {
        self.instancing
    }

    fn upload_instances(&mut self, data: &[u8], instance_count: usize) -> Result<()> {
        self.events.push(SubmitEvent::Upload { instance_count, byte_len: data.len() });
        Ok(())
    }

    fn begin_shadow_view(
        &mut self,
        map_index: usize,
        _texture: &ShadowTextureDesc,
        view: &ShadowView,
    ) -> Result<()> {
        self.events.push(SubmitEvent::ShadowView { map_index, viewport: view.viewport() });
        Ok(())
    }

    fn begin_queue(&mut self, pass_type: PassType, batch_count: usize) -> Result<()> {
        self.events.push(SubmitEvent::Queue { pass_type, batch_count });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        if self.fail_draw_at == Some(self.draws) {
            engine_bail!("lumen::MockSubmitter", "draw {} rejected", self.draws);
        }
        self.draws += 1;
        self.events.push(SubmitEvent::Draw {
            batch: *call.batch,
            world_transform: call.world_transform,
            light_count: call.light_pass.map_or(0, |p| p.light_count()),
            instance_transforms: call.instance_transforms.to_vec(),
        });
        Ok(())
    }
}
