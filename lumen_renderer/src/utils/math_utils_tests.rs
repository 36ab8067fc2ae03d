use super::*;

#[test]
fn test_next_power_of_two() {
    assert_eq!(next_power_of_two(-4), 1);
    assert_eq!(next_power_of_two(0), 1);
    assert_eq!(next_power_of_two(1), 1);
    assert_eq!(next_power_of_two(3), 4);
    assert_eq!(next_power_of_two(512), 512);
    assert_eq!(next_power_of_two(513), 1024);
    assert_eq!(next_power_of_two(i32::MAX), 1 << 30);
}

#[test]
fn test_quantize_distance() {
    assert_eq!(quantize_distance(0.0, 100.0), 0);
    assert_eq!(quantize_distance(-5.0, 100.0), 0);
    assert_eq!(quantize_distance(100.0, 100.0), u16::MAX);
    assert_eq!(quantize_distance(500.0, 100.0), u16::MAX);
    assert_eq!(quantize_distance(50.0, 100.0), 32768);
    assert_eq!(quantize_distance(10.0, f32::INFINITY), 0);
    assert_eq!(quantize_distance(10.0, 0.0), 0);
}

#[test]
fn test_quantize_distance_is_monotonic() {
    let mut last = 0;
    for i in 0..1000 {
        let q = quantize_distance(i as f32 * 0.1, 100.0);
        assert!(q >= last);
        last = q;
    }
}

#[test]
fn test_ordered_f32_bits_preserves_order() {
    let values = [f32::NEG_INFINITY, -100.0, -1.5, -0.0, 0.0, 1e-6, 1.0, 2.5, 1e9, f32::INFINITY];
    for pair in values.windows(2) {
        assert!(ordered_f32_bits(pair[0]) <= ordered_f32_bits(pair[1]), "{:?}", pair);
    }
    assert!(ordered_f32_bits(-1.0) < ordered_f32_bits(1.0));
}
