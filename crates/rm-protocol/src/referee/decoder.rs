//! 裁判系统帧解码状态机
//!
//! 逐字节输入，状态转移：
//!
//! ```text
//! WaitSof → LenLsb → LenMsb → Seq → HeaderCrc → Payload → WaitSof
//! ```
//!
//! 状态镜像只在帧头 CRC8 与整帧 CRC16 都校验通过后才写入，
//! 任何被拒绝的帧都不会留下部分写入。

use super::{
    FRAME_MAX_LEN, FieldRegistry, FrameError, FrameInfo, HEADER_LEN, METADATA_LEN, Revision, SOF,
    StateImage,
};
use crate::crc::{CRC8_INIT, CRC16_INIT, crc8, crc16};

/// payload 在帧缓冲中的起始位置（帧头 + 命令码之后）
const PAYLOAD_OFFSET: usize = HEADER_LEN + super::CMD_ID_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    WaitSof,
    LenLsb,
    LenMsb,
    Seq,
    HeaderCrc,
    Payload,
}

/// 解码统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// 输入的总字节数（不含重扫描时的重放）
    pub bytes: u64,
    /// 成功写入状态的帧数
    pub frames_applied: u64,
    /// 声明长度越界
    pub invalid_length: u64,
    /// 帧头 CRC8 失败
    pub header_crc_errors: u64,
    /// 整帧 CRC16 失败
    pub payload_crc_errors: u64,
    /// 未注册的命令码
    pub unknown_cmd_ids: u64,
    /// payload 超出字段长度
    pub field_overflows: u64,
}

impl DecoderStats {
    fn record(&mut self, err: &FrameError) {
        match err {
            FrameError::InvalidLength { .. } => self.invalid_length += 1,
            FrameError::HeaderChecksum { .. } => self.header_crc_errors += 1,
            FrameError::PayloadChecksum { .. } => self.payload_crc_errors += 1,
            FrameError::UnknownCmdId { .. } => self.unknown_cmd_ids += 1,
            FrameError::FieldOverflow { .. } => self.field_overflows += 1,
        }
    }

    /// 被丢弃的帧总数
    pub fn frames_dropped(&self) -> u64 {
        self.invalid_length
            + self.header_crc_errors
            + self.payload_crc_errors
            + self.unknown_cmd_ids
            + self.field_overflows
    }

    /// 丢帧率（百分比），没有任何帧时返回 0.0
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_applied + self.frames_dropped();
        if total == 0 {
            return 0.0;
        }
        (self.frames_dropped() as f64 / total as f64) * 100.0
    }
}

/// 裁判系统帧解码器
///
/// 每条链路一个实例，持有全部累积状态。不做任何同步：
/// 若在多个执行上下文间共享，调用方需在外部加锁。
///
/// ```rust
/// use rm_protocol::referee::{FrameDecoder, V170, encode_frame, v170::cmd};
///
/// let mut decoder = FrameDecoder::<V170>::new();
/// for byte in encode_frame(1, cmd::GAME_RESULT, &[1]).unwrap() {
///     decoder.push(byte);
/// }
/// assert_eq!(decoder.stats().frames_applied, 1);
/// ```
pub struct FrameDecoder<R: Revision> {
    state: R::State,
    registry: FieldRegistry,
    fsm: DecodeState,
    buf: [u8; FRAME_MAX_LEN],
    idx: usize,
    data_len: usize,
    stats: DecoderStats,
}

impl<R: Revision> Default for FrameDecoder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Revision> FrameDecoder<R> {
    pub fn new() -> Self {
        Self {
            state: R::State::default(),
            registry: R::registry(),
            fsm: DecodeState::WaitSof,
            buf: [0u8; FRAME_MAX_LEN],
            idx: 0,
            data_len: 0,
            stats: DecoderStats::default(),
        }
    }

    /// 输入一个字节
    ///
    /// 最多发生一次状态转移（帧被拒绝时会重扫描已缓冲的字节），永不阻塞。
    pub fn push(&mut self, byte: u8) {
        self.push_with(byte, &mut |_| {});
    }

    /// 输入一段字节
    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// 输入一个字节，并把本字节导致的帧结果交给 `observer`
    ///
    /// 一个字节可能产生多个结果：被拒绝的帧，以及重扫描中找到的帧。
    pub fn push_with(
        &mut self,
        byte: u8,
        observer: &mut dyn FnMut(Result<FrameInfo, FrameError>),
    ) {
        self.stats.bytes += 1;
        self.step(byte, observer);
    }

    /// 当前状态镜像（最近一次校验通过的各字段值）
    pub fn current_state(&self) -> &R::State {
        &self.state
    }

    /// 解码统计
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// 是否处于帧间空闲（等待 SOF）
    pub fn is_idle(&self) -> bool {
        self.fsm == DecodeState::WaitSof
    }

    fn step(&mut self, byte: u8, observer: &mut dyn FnMut(Result<FrameInfo, FrameError>)) {
        match self.fsm {
            DecodeState::WaitSof => {
                if byte == SOF {
                    self.buf[0] = byte;
                    self.idx = 1;
                    self.fsm = DecodeState::LenLsb;
                } else {
                    self.idx = 0;
                }
            }
            DecodeState::LenLsb => {
                self.data_len = byte as usize;
                self.accept(byte);
                self.fsm = DecodeState::LenMsb;
            }
            DecodeState::LenMsb => {
                self.data_len |= (byte as usize) << 8;
                self.accept(byte);
                if self.data_len < FRAME_MAX_LEN - METADATA_LEN {
                    self.fsm = DecodeState::Seq;
                } else {
                    let err = FrameError::InvalidLength { len: self.data_len };
                    self.reject(err, observer);
                }
            }
            DecodeState::Seq => {
                self.accept(byte);
                self.fsm = DecodeState::HeaderCrc;
            }
            DecodeState::HeaderCrc => {
                self.accept(byte);
                let computed = crc8(&self.buf[..HEADER_LEN - 1], CRC8_INIT);
                let received = self.buf[HEADER_LEN - 1];
                if computed == received {
                    self.fsm = DecodeState::Payload;
                } else {
                    let err = FrameError::HeaderChecksum { computed, received };
                    self.reject(err, observer);
                }
            }
            DecodeState::Payload => {
                let total = METADATA_LEN + self.data_len;
                if self.idx < total {
                    self.accept(byte);
                }
                if self.idx >= total {
                    self.finish(total, observer);
                }
            }
        }
    }

    fn accept(&mut self, byte: u8) {
        self.buf[self.idx] = byte;
        self.idx += 1;
    }

    fn reset(&mut self) {
        self.fsm = DecodeState::WaitSof;
        self.idx = 0;
        self.data_len = 0;
    }

    fn finish(&mut self, total: usize, observer: &mut dyn FnMut(Result<FrameInfo, FrameError>)) {
        let received = u16::from_le_bytes([self.buf[total - 2], self.buf[total - 1]]);
        let computed = crc16(&self.buf[..total - 2], CRC16_INIT);
        if computed != received {
            self.reject(FrameError::PayloadChecksum { computed, received }, observer);
            return;
        }

        let data_len = self.data_len;
        let info = FrameInfo {
            seq: self.buf[3],
            cmd_id: u16::from_le_bytes([self.buf[HEADER_LEN], self.buf[HEADER_LEN + 1]]),
            len: data_len,
        };
        self.reset();

        let result = self.apply(info, data_len);
        match &result {
            Ok(_) => self.stats.frames_applied += 1,
            Err(err) => self.stats.record(err),
        }
        observer(result);
    }

    /// 把已校验的 payload 写入字段表解析出的位置
    fn apply(&mut self, info: FrameInfo, data_len: usize) -> Result<FrameInfo, FrameError> {
        let slot = self
            .registry
            .lookup(info.cmd_id)
            .ok_or(FrameError::UnknownCmdId {
                cmd_id: info.cmd_id,
            })?;

        let overflow = FrameError::FieldOverflow {
            cmd_id: info.cmd_id,
            len: data_len,
            capacity: slot.len,
        };
        if data_len > slot.len {
            return Err(overflow);
        }
        let target = self
            .state
            .as_bytes_mut()
            .get_mut(slot.offset..slot.offset + data_len)
            .ok_or(overflow)?;
        target.copy_from_slice(&self.buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + data_len]);
        Ok(info)
    }

    /// 丢弃当前候选帧，并从其 SOF 之后的字节中重新寻找帧头
    fn reject(&mut self, err: FrameError, observer: &mut dyn FnMut(Result<FrameInfo, FrameError>)) {
        self.stats.record(&err);
        observer(Err(err));

        let mut replay = [0u8; FRAME_MAX_LEN];
        let pending = self.idx.saturating_sub(1);
        replay[..pending].copy_from_slice(&self.buf[1..1 + pending]);
        self.reset();

        for &byte in &replay[..pending] {
            self.step(byte, observer);
        }
    }
}
