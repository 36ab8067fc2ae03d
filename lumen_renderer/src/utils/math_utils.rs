/// Numeric helpers for sizes and sort keys.

/// Smallest power of two >= `value` (1 for values <= 1).
pub fn next_power_of_two(value: i32) -> i32 {
    if value <= 1 {
        return 1;
    }
    (value as u32).next_power_of_two().min(1 << 30) as i32
}

/// Map a distance in `0..=max_distance` to `0..=u16::MAX`.
///
/// Negative distances clamp to 0, distances past the maximum to
/// `u16::MAX`. A non-positive or non-finite maximum yields 0.
pub fn quantize_distance(distance: f32, max_distance: f32) -> u16 {
    if !(max_distance.is_finite() && max_distance > 0.0) || distance.is_nan() {
        return 0;
    }
    let t = (distance / max_distance).clamp(0.0, 1.0);
    (t * u16::MAX as f32).round() as u16
}

/// Bits of an f32 whose unsigned order matches the float order.
pub fn ordered_f32_bits(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 { !bits } else { bits | 0x8000_0000 }
}

#[cfg(test)]
#[path = "math_utils_tests.rs"]
mod tests;
