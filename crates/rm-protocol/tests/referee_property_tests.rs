//! 裁判系统帧解码的属性测试
//!
//! 使用 proptest 验证合法帧写入、噪声后的重同步以及未知命令码的安全性。

use proptest::prelude::*;
use rm_protocol::referee::{
    FieldSlot, FrameDecoder, FRAME_MAX_LEN, RefereeStateV170, V170, cmd, encode_frame,
};
use rm_protocol::{Revision, StateImage};

/// V1.7.0 字段表中的任意一个槽位
fn any_slot() -> impl Strategy<Value = FieldSlot> {
    let slots = V170::registry().slots();
    (0..slots.len()).prop_map(move |i| slots[i])
}

/// 槽位 + 恰好填满该槽位的 payload
fn slot_and_payload() -> impl Strategy<Value = (FieldSlot, Vec<u8>)> {
    any_slot().prop_flat_map(|slot| (Just(slot), prop::collection::vec(any::<u8>(), slot.len)))
}

fn field(state: &RefereeStateV170, slot: FieldSlot) -> &[u8] {
    &state.as_bytes()[slot.offset..slot.end()]
}

proptest! {
    /// 测试合法帧的 payload 原样写入字段
    #[test]
    fn valid_frame_lands_at_registered_offset(
        (slot, payload) in slot_and_payload(),
        seq in any::<u8>(),
    ) {
        let frame = encode_frame(seq, slot.cmd_id, &payload).unwrap();
        let mut decoder = FrameDecoder::<V170>::new();
        decoder.extend(&frame);

        prop_assert_eq!(field(decoder.current_state(), slot), payload.as_slice());
        prop_assert_eq!(decoder.stats().frames_applied, 1);
        prop_assert!(decoder.is_idle());
    }

    /// 测试任意噪声之后的合法帧仍能被解出
    ///
    /// 噪声中可能含有帧头校验恰好通过的假起始，尾部补零保证其最终被判定失败并触发重扫描。
    #[test]
    fn resync_after_garbage(
        garbage in prop::collection::vec(any::<u8>(), 0..96),
        (slot, payload) in slot_and_payload(),
    ) {
        let frame = encode_frame(7, slot.cmd_id, &payload).unwrap();
        let mut decoder = FrameDecoder::<V170>::new();
        decoder.extend(&garbage);
        decoder.extend(&frame);
        decoder.extend(&[0u8; FRAME_MAX_LEN]);

        prop_assert_eq!(field(decoder.current_state(), slot), payload.as_slice());
    }

    /// 测试结构合法但未注册的命令码不修改状态，也不影响后续帧
    #[test]
    fn unknown_cmd_id_is_harmless(
        cmd_id in any::<u16>(),
        junk in prop::collection::vec(any::<u8>(), 0..32),
        status in prop::collection::vec(any::<u8>(), 13),
    ) {
        prop_assume!(V170::registry().lookup(cmd_id).is_none());

        let mut decoder = FrameDecoder::<V170>::new();
        decoder.extend(&encode_frame(0, cmd_id, &junk).unwrap());
        prop_assert_eq!(decoder.current_state(), &RefereeStateV170::default());
        prop_assert_eq!(decoder.stats().unknown_cmd_ids, 1);

        decoder.extend(&encode_frame(1, cmd::ROBOT_STATUS, &status).unwrap());
        let slot = V170::registry().lookup(cmd::ROBOT_STATUS).unwrap();
        prop_assert_eq!(field(decoder.current_state(), slot), status.as_slice());
    }

    /// 测试较短的 payload 只覆盖字段前缀
    #[test]
    fn short_payload_touches_prefix_only(
        (slot, payload) in slot_and_payload(),
        cut in 0usize..8,
    ) {
        let len = payload.len().saturating_sub(cut);
        let mut decoder = FrameDecoder::<V170>::new();
        decoder.extend(&encode_frame(0, slot.cmd_id, &payload[..len]).unwrap());

        let stored = field(decoder.current_state(), slot);
        prop_assert_eq!(&stored[..len], &payload[..len]);
        prop_assert!(stored[len..].iter().all(|&b| b == 0));
    }
}
