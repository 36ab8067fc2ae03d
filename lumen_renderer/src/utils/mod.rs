//! Small helpers shared by the renderer modules.

mod math_utils;

pub use math_utils::{next_power_of_two, quantize_distance, ordered_f32_bits};
