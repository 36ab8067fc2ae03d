//! Shaders and shader program variations.
//!
//! A `Shader` is a named source known to the submitter. The renderer picks
//! a variation of it per batch: the `ShaderProgram` is the shader plus the
//! bits that select compile-time features (instancing, light types and
//! shadows per light slot).

use bitflags::bitflags;
use crate::error::{Error, Result};

slotmap::new_key_type! {
    /// Stable key for a shader in the ResourceRegistry
    pub struct ShaderKey;
}

bitflags! {
    /// Feature bits of a shader variation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ProgramBits: u8 {
        /// World transforms come from the instance buffer
        const INSTANCED = 1 << 0;
        /// Per-object skinning matrices
        const SKINNED = 1 << 1;
        /// Ambient lighting is added in this pass
        const AMBIENT = 1 << 2;
    }
}

/// Shader creation descriptor
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Unique name
    pub name: String,
    /// Base defines applied to every variation
    pub defines: Vec<String>,
}

/// Named shader source
#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    defines: Vec<String>,
}

impl Shader {
    pub(crate) fn from_desc(desc: ShaderDesc) -> Result<Self> {
        if desc.name.is_empty() {
            crate::engine_error!("lumen::Shader", "Shader name must not be empty");
            return Err(Error::InvalidResource("Shader name must not be empty".to_string()));
        }
        Ok(Self { name: desc.name, defines: desc.defines })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }
}

/// A shader variation: what the submitter binds for a batch.
///
/// Two batches with equal programs can share a bind. `light_bits` holds
/// two bits per light slot (light type + 1, 0 = empty slot); `shadow_bits`
/// one bit per slot whose light samples a shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderProgram {
    pub shader: ShaderKey,
    pub bits: ProgramBits,
    pub light_bits: u8,
    pub shadow_bits: u8,
}

impl ShaderProgram {
    /// Base variation of a shader (unlit, not instanced).
    pub fn new(shader: ShaderKey) -> Self {
        Self {
            shader,
            bits: ProgramBits::empty(),
            light_bits: 0,
            shadow_bits: 0,
        }
    }

    pub fn with_bits(mut self, bits: ProgramBits) -> Self {
        self.bits |= bits;
        self
    }

    pub fn with_lights(mut self, light_bits: u8, shadow_bits: u8) -> Self {
        self.light_bits = light_bits;
        self.shadow_bits = shadow_bits;
        self
    }

    pub fn is_instanced(&self) -> bool {
        self.bits.contains(ProgramBits::INSTANCED)
    }

    /// Define strings for this variation, after the shader's base defines.
    pub fn defines(&self, shader: &Shader) -> Vec<String> {
        let mut defines = shader.defines().to_vec();
        if self.bits.contains(ProgramBits::INSTANCED) {
            defines.push("INSTANCED".to_string());
        }
        if self.bits.contains(ProgramBits::SKINNED) {
            defines.push("SKINNED".to_string());
        }
        if self.bits.contains(ProgramBits::AMBIENT) {
            defines.push("AMBIENT".to_string());
        }
        for slot in 0..4 {
            let light_type = (self.light_bits >> (slot * 2)) & 0b11;
            if light_type != 0 {
                defines.push(format!("LIGHT{}={}", slot, light_type - 1));
                if self.shadow_bits & (1 << slot) != 0 {
                    defines.push(format!("SHADOW{}", slot));
                }
            }
        }
        defines
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
