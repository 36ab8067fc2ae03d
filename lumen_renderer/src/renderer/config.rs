/// Renderer configuration

use crate::error::{Error, Result};

/// Depth format of the shadow map atlases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowFormat {
    D16,
    D24S8,
    D32F,
}

impl ShadowFormat {
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            ShadowFormat::D16 => 2,
            ShadowFormat::D24S8 | ShadowFormat::D32F => 4,
        }
    }
}

/// Instancing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstancingMode {
    /// Instance when the draw submitter supports it
    Auto,
    /// Always draw batches one by one
    Disabled,
}

/// Renderer configuration
///
/// # Example
///
/// ```
/// use lumen_renderer::lumen::render::{RendererConfig, ShadowFormat, InstancingMode};
///
/// let config = RendererConfig::default()
///     .with_shadow_atlas_size(4096)
///     .with_shadow_format(ShadowFormat::D32F)
///     .with_instancing(InstancingMode::Disabled);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Size of the shadow map reserved for directional lights
    pub directional_shadow_size: i32,
    /// Size of the atlas shared by point and spot lights
    pub shadow_atlas_size: i32,
    pub shadow_format: ShadowFormat,
    /// Global multiplier of each light's constant depth bias
    pub depth_bias_mul: f32,
    /// Global multiplier of each light's slope-scaled depth bias
    pub slope_scale_bias_mul: f32,
    pub instancing: InstancingMode,
    /// Distance range used to quantize sort keys when the camera far
    /// clip is not usable
    pub max_sort_distance: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            directional_shadow_size: 2048,
            shadow_atlas_size: 2048,
            shadow_format: ShadowFormat::D16,
            depth_bias_mul: 1.0,
            slope_scale_bias_mul: 1.0,
            instancing: InstancingMode::Auto,
            max_sort_distance: 1000.0,
        }
    }
}

impl RendererConfig {
    pub fn with_directional_shadow_size(mut self, size: i32) -> Self {
        self.directional_shadow_size = size;
        self
    }

    pub fn with_shadow_atlas_size(mut self, size: i32) -> Self {
        self.shadow_atlas_size = size;
        self
    }

    pub fn with_shadow_format(mut self, format: ShadowFormat) -> Self {
        self.shadow_format = format;
        self
    }

    pub fn with_depth_bias_mul(mut self, constant: f32, slope_scaled: f32) -> Self {
        self.depth_bias_mul = constant;
        self.slope_scale_bias_mul = slope_scaled;
        self
    }

    pub fn with_instancing(mut self, instancing: InstancingMode) -> Self {
        self.instancing = instancing;
        self
    }

    pub fn with_max_sort_distance(mut self, distance: f32) -> Self {
        self.max_sort_distance = distance;
        self
    }

    /// Check sizes and multipliers.
    pub fn validate(&self) -> Result<()> {
        if self.directional_shadow_size <= 0 || self.shadow_atlas_size <= 0 {
            return Err(Error::InvalidConfig(format!(
                "shadow map sizes must be positive (directional {}, atlas {})",
                self.directional_shadow_size, self.shadow_atlas_size
            )));
        }
        if !(self.depth_bias_mul.is_finite() && self.depth_bias_mul >= 0.0)
            || !(self.slope_scale_bias_mul.is_finite() && self.slope_scale_bias_mul >= 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "depth bias multipliers must be finite and non-negative ({}, {})",
                self.depth_bias_mul, self.slope_scale_bias_mul
            )));
        }
        if !(self.max_sort_distance.is_finite() && self.max_sort_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max sort distance must be positive, got {}",
                self.max_sort_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
