/// Renderer module - frame pipeline, light lists, shadows and batches

// Module declarations
mod frame_phase;
mod config;
mod stats;
mod light_list;
mod shadow;
mod batch;
mod instance_buffer;
mod draw_submitter;
mod renderer;
mod mock_submitter;

pub use frame_phase::FramePhase;
pub use config::{RendererConfig, ShadowFormat, InstancingMode};
pub use stats::FrameStats;
pub use light_list::{
    LightListCache, LightList, LightPass, LightListHandle, LightPassRef, LightShadowData,
    light_list_key, MAX_LIGHTS_PER_PASS, LIGHT_DATA_VECTORS,
};
pub use shadow::{
    ShadowMap, ShadowView, ShadowViewHandle, ShadowTextureDesc, shadow_adjust_matrix,
    DIRECTIONAL_SHADOW_MAP, SHARED_SHADOW_MAP,
};
pub use batch::{Batch, BatchOwner, BatchQueue, BatchState, InstanceRange, SortKey, SortMode};
pub use instance_buffer::InstanceBuffer;
pub use draw_submitter::{DrawCall, DrawSubmitter};
pub use renderer::Renderer;

#[cfg(test)]
pub(crate) use mock_submitter::{MockSubmitter, SubmitEvent};
