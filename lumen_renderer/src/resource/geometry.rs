//! Resource-level geometry type.
//!
//! A `Geometry` is a drawable range inside vertex/index buffers owned by
//! the draw submitter. Batches reference it by `GeometryKey`; two batches
//! with the same key draw the same range and can be instanced together.

use crate::error::{Error, Result};

slotmap::new_key_type! {
    /// Stable key for a geometry in the ResourceRegistry
    pub struct GeometryKey;
}

/// Geometry creation descriptor
#[derive(Debug, Clone)]
pub struct GeometryDesc {
    /// Unique name
    pub name: String,
    /// Vertices in the backing vertex buffer
    pub vertex_count: u32,
    /// Indices in the backing index buffer (0 = non-indexed)
    pub index_count: u32,
    /// First vertex or index of the draw range
    pub draw_start: u32,
    /// Vertices or indices drawn
    pub draw_count: u32,
}

/// Drawable range within shared buffers
#[derive(Debug, Clone)]
pub struct Geometry {
    name: String,
    vertex_count: u32,
    index_count: u32,
    draw_start: u32,
    draw_count: u32,
}

impl Geometry {
    /// Create geometry from descriptor (internal use by ResourceRegistry)
    pub(crate) fn from_desc(desc: GeometryDesc) -> Result<Self> {
        let limit = if desc.index_count > 0 { desc.index_count } else { desc.vertex_count };
        let end = desc.draw_start as u64 + desc.draw_count as u64;

        if desc.draw_count == 0 || end > limit as u64 {
            let msg = format!(
                "Geometry '{}': draw range {}..{} outside 0..{}",
                desc.name, desc.draw_start, end, limit
            );
            crate::engine_error!("lumen::Geometry", "{}", msg);
            return Err(Error::InvalidResource(msg));
        }

        Ok(Self {
            name: desc.name,
            vertex_count: desc.vertex_count,
            index_count: desc.index_count,
            draw_start: desc.draw_start,
            draw_count: desc.draw_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_count > 0
    }

    pub fn draw_start(&self) -> u32 {
        self.draw_start
    }

    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
