/// AreaAllocator - 2D rectangle packer for shadow atlases.
///
/// Keeps a list of disjoint free regions. An allocation takes the
/// best-fitting region (smallest area that fits, then topmost, then
/// leftmost) and splits what is left guillotine-style into a right and a
/// bottom remainder. Rectangles handed out are never shared until the
/// next `reset()`.
///
/// An allocator created with `with_max_size` grows when nothing fits,
/// doubling its width and height alternately (width first) until the
/// maximum is reached.

use glam::IVec2;
use super::int_rect::IntRect;

#[derive(Debug, Clone)]
pub struct AreaAllocator {
    size: IVec2,
    max_size: IVec2,
    double_width: bool,
    free_regions: Vec<IntRect>,
}

impl AreaAllocator {
    /// Fixed-size allocator covering `width` x `height`.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_max_size(width, height, width, height)
    }

    /// Growable allocator starting at `width` x `height`.
    pub fn with_max_size(width: i32, height: i32, max_width: i32, max_height: i32) -> Self {
        let size = IVec2::new(width.max(0), height.max(0));
        let mut allocator = Self {
            size,
            max_size: size.max(IVec2::new(max_width, max_height)),
            double_width: true,
            free_regions: Vec::new(),
        };
        allocator.reset();
        allocator
    }

    /// Release every allocation: one free region covering the container.
    pub fn reset(&mut self) {
        self.free_regions.clear();
        self.double_width = true;
        let whole = IntRect::new(0, 0, self.size.x, self.size.y);
        if !whole.is_empty() {
            self.free_regions.push(whole);
        }
    }

    /// Resize the container and release every allocation.
    pub fn reset_to(&mut self, width: i32, height: i32) {
        self.size = IVec2::new(width.max(0), height.max(0));
        self.max_size = self.max_size.max(self.size);
        self.reset();
    }

    /// Reserve a `width` x `height` rectangle.
    ///
    /// Negative sizes are clamped to zero. Returns `None` when no free
    /// region is large enough and the container cannot grow further.
    pub fn allocate(&mut self, width: i32, height: i32) -> Option<IntRect> {
        let width = width.max(0);
        let height = height.max(0);

        let best = loop {
            match self.best_fit(width, height) {
                Some(index) => break index,
                None => {
                    if !self.grow() {
                        return None;
                    }
                }
            }
        };

        let free = self.free_regions.swap_remove(best);
        let reserved = IntRect::from_pos_size(free.left, free.top, width, height);

        let right_full_height = (free.right - reserved.right) as i64 * free.height() as i64;
        let bottom_full_width = free.width() as i64 * (free.bottom - reserved.bottom) as i64;

        let (right, bottom) = if right_full_height > bottom_full_width {
            (
                IntRect::new(reserved.right, free.top, free.right, free.bottom),
                IntRect::new(free.left, reserved.bottom, reserved.right, free.bottom),
            )
        } else {
            (
                IntRect::new(reserved.right, free.top, free.right, reserved.bottom),
                IntRect::new(free.left, reserved.bottom, free.right, free.bottom),
            )
        };

        for remainder in [right, bottom] {
            if !remainder.is_empty() {
                self.free_regions.push(remainder);
            }
        }

        Some(reserved)
    }

    /// Current container size.
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Size the container may grow to.
    pub fn max_size(&self) -> IVec2 {
        self.max_size
    }

    /// Total free pixels.
    pub fn free_area(&self) -> i64 {
        self.free_regions.iter().map(IntRect::area).sum()
    }

    pub fn free_regions(&self) -> &[IntRect] {
        &self.free_regions
    }

    fn best_fit(&self, width: i32, height: i32) -> Option<usize> {
        self.free_regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.width() >= width && r.height() >= height)
            .min_by_key(|(_, r)| (r.area(), r.top, r.left))
            .map(|(index, _)| index)
    }

    /// Double one dimension, preferring the alternating axis.
    fn grow(&mut self) -> bool {
        let can_width = self.size.x < self.max_size.x;
        let can_height = self.size.y < self.max_size.y;

        let grow_width = match (can_width, can_height) {
            (false, false) => return false,
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.double_width,
        };

        if grow_width {
            let old = self.size.x;
            self.size.x = old.saturating_mul(2).max(1).min(self.max_size.x);
            self.push_free(IntRect::new(old, 0, self.size.x, self.size.y));
        } else {
            let old = self.size.y;
            self.size.y = old.saturating_mul(2).max(1).min(self.max_size.y);
            self.push_free(IntRect::new(0, old, self.size.x, self.size.y));
        }

        self.double_width = !grow_width;
        true
    }

    fn push_free(&mut self, region: IntRect) {
        if !region.is_empty() {
            self.free_regions.push(region);
        }
    }
}

#[cfg(test)]
#[path = "area_allocator_tests.rs"]
mod tests;
