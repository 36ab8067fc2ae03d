//! Integer math for atlas packing.
//!
//! Floating-point math (vectors, matrices) comes from `glam`.

mod int_rect;
mod area_allocator;

pub use int_rect::IntRect;
pub use area_allocator::AreaAllocator;
