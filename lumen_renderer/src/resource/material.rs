/// Resource-level material type.
///
/// A Material is a set of render passes, one per pass type. Each pass
/// names the shader used and the fixed-function state the submitter sets
/// (blending, depth writes). Batches reference a pass through `PassRef`.
///
/// Pass types:
/// - `Shadow`: depth-only rendering into shadow views
/// - `Opaque`: base pass, first light pass plus ambient
/// - `OpaqueAdditive`: additional light passes, blended additively
/// - `Alpha`: transparent geometry, sorted back to front

use crate::error::{Error, Result};
use super::shader::ShaderKey;

slotmap::new_key_type! {
    /// Stable key for a material in the ResourceRegistry
    pub struct MaterialKey;
}

/// Render pass type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassType {
    Shadow,
    Opaque,
    OpaqueAdditive,
    Alpha,
}

impl PassType {
    pub const COUNT: usize = 4;

    pub const ALL: [PassType; Self::COUNT] = [
        PassType::Shadow,
        PassType::Opaque,
        PassType::OpaqueAdditive,
        PassType::Alpha,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Blend state of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendMode {
    Replace,
    Add,
    Alpha,
}

/// Pass creation descriptor
#[derive(Debug, Clone)]
pub struct PassDesc {
    pub pass_type: PassType,
    pub shader: ShaderKey,
    pub blend_mode: BlendMode,
    pub depth_write: bool,
}

impl PassDesc {
    /// Descriptor with the usual state for a pass type.
    pub fn new(pass_type: PassType, shader: ShaderKey) -> Self {
        let (blend_mode, depth_write) = match pass_type {
            PassType::Shadow | PassType::Opaque => (BlendMode::Replace, true),
            PassType::OpaqueAdditive => (BlendMode::Add, false),
            PassType::Alpha => (BlendMode::Alpha, false),
        };
        Self { pass_type, shader, blend_mode, depth_write }
    }
}

/// One render pass of a material
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    shader: ShaderKey,
    blend_mode: BlendMode,
    depth_write: bool,
}

impl Pass {
    pub fn shader(&self) -> ShaderKey {
        self.shader
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn depth_write(&self) -> bool {
        self.depth_write
    }
}

/// Reference to one pass of one material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassRef {
    pub material: MaterialKey,
    pub pass: PassType,
}

/// Material creation descriptor
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub name: String,
    pub passes: Vec<PassDesc>,
}

/// Set of render passes
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    passes: [Option<Pass>; PassType::COUNT],
}

impl Material {
    /// Create material from descriptor (internal use by ResourceRegistry)
    ///
    /// Shader keys are checked by the registry, not here.
    pub(crate) fn from_desc(desc: MaterialDesc) -> Result<Self> {
        let mut passes: [Option<Pass>; PassType::COUNT] = Default::default();

        for pass_desc in desc.passes {
            let slot = &mut passes[pass_desc.pass_type.index()];
            if slot.is_some() {
                let msg = format!(
                    "Material '{}': duplicate {:?} pass",
                    desc.name, pass_desc.pass_type
                );
                crate::engine_error!("lumen::Material", "{}", msg);
                return Err(Error::InvalidResource(msg));
            }
            *slot = Some(Pass {
                shader: pass_desc.shader,
                blend_mode: pass_desc.blend_mode,
                depth_write: pass_desc.depth_write,
            });
        }

        Ok(Self { name: desc.name, passes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pass(&self, pass_type: PassType) -> Option<&Pass> {
        self.passes[pass_type.index()].as_ref()
    }

    pub fn has_pass(&self, pass_type: PassType) -> bool {
        self.passes[pass_type.index()].is_some()
    }

    /// Iterate over defined passes
    pub fn passes(&self) -> impl Iterator<Item = (PassType, &Pass)> + '_ {
        PassType::ALL
            .into_iter()
            .filter_map(move |t| self.pass(t).map(|p| (t, p)))
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
