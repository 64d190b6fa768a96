//! 本末电机控制量量化的属性测试

use proptest::prelude::*;
use rm_protocol::{Mode, QuantizationTable};

fn any_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::VoltageOpenLoop),
        Just(Mode::Current),
        Just(Mode::Speed),
        Just(Mode::Position),
    ]
}

/// 模式 + 限幅内的值
fn mode_and_value() -> impl Strategy<Value = (Mode, f32)> {
    any_mode().prop_flat_map(|mode| {
        let limit = QuantizationTable::default().get(mode).limit;
        (Just(mode), -limit..=limit)
    })
}

proptest! {
    /// 测试限幅内的量化往返误差不超过一个量化单位
    #[test]
    fn quantize_roundtrip_within_one_unit((mode, value) in mode_and_value()) {
        let table = QuantizationTable::default();
        let raw = table.quantize(mode, value);
        let back = table.dequantize(mode, raw);
        let unit = 1.0 / table.get(mode).scale;
        prop_assert!((back - value).abs() <= unit, "{mode:?}: {value} -> {raw} -> {back}");
    }

    /// 测试超限值饱和为 sign(v) * limit * scale
    #[test]
    fn quantize_saturates_exactly(
        mode in any_mode(),
        excess in 0.001f32..1.0e6,
        negative in any::<bool>(),
    ) {
        let table = QuantizationTable::default();
        let limit = table.get(mode);
        let sign = if negative { -1.0 } else { 1.0 };
        let value = sign * (limit.limit + excess);

        let expected = (sign * limit.limit * limit.scale) as i16;
        prop_assert_eq!(table.quantize(mode, value), expected);
    }

    /// 测试量化单调不减
    #[test]
    fn quantize_is_monotonic(mode in any_mode(), a in -500.0f32..500.0, b in -500.0f32..500.0) {
        let table = QuantizationTable::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(table.quantize(mode, lo) <= table.quantize(mode, hi));
    }
}
