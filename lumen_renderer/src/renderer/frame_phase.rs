/// Frame phases of the renderer.
///
/// A frame walks through the phases in order:
///
/// ```text
/// Idle → Begun → VisibleCollected → LightsCollected → ShadowsCollected
///      → NodeBatchesCollected → Sorted → ShadowsRendered → OpaqueRendered
///      → AlphaRendered → Idle
/// ```
///
/// `ShadowsCollected` and `ShadowsRendered` are optional. Every renderer step
/// checks the current phase and rejects out-of-order calls.

use crate::error::{Error, Result};
use crate::engine_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramePhase {
    /// No frame in progress
    #[default]
    Idle,
    Begun,
    VisibleCollected,
    LightsCollected,
    /// At least one shadow view has collected its casters
    ShadowsCollected,
    NodeBatchesCollected,
    Sorted,
    ShadowsRendered,
    OpaqueRendered,
    AlphaRendered,
}

impl FramePhase {
    /// Whether a frame is in progress
    pub fn is_in_frame(self) -> bool {
        self != FramePhase::Idle
    }

    /// Check that `self` is one of `expected`.
    ///
    /// Logs and returns `Error::InvalidPhase` otherwise.
    pub(crate) fn require(
        self,
        operation: &'static str,
        expected: &'static [FramePhase],
    ) -> Result<()> {
        if expected.contains(&self) {
            return Ok(());
        }
        engine_error!(
            "lumen::Renderer",
            "{} called in phase {:?}, expected one of {:?}",
            operation, self, expected
        );
        Err(Error::InvalidPhase {
            operation,
            expected,
            actual: self,
        })
    }
}

#[cfg(test)]
#[path = "frame_phase_tests.rs"]
mod tests;
