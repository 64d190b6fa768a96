//! 裁判系统链路指标
//!
//! 计数由解码器维护（[`DecoderStats`]），这里只是它的原子镜像：
//! 解码线程每输入一个字节同步一次，其他线程随时读取，不引入锁竞争。

use rm_protocol::referee::DecoderStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// 裁判系统链路实时指标
///
/// ```rust
/// use rm_driver::RefereeLink;
/// use rm_protocol::referee::V170;
///
/// let mut link = RefereeLink::<V170>::new();
/// let metrics = link.metrics();
/// link.feed(&[0x00, 0xA5]);
/// assert_eq!(metrics.snapshot().bytes, 2);
/// ```
#[derive(Debug, Default)]
pub struct LinkMetrics {
    bytes: AtomicU64,
    frames_applied: AtomicU64,
    invalid_length: AtomicU64,
    header_crc_errors: AtomicU64,
    payload_crc_errors: AtomicU64,
    unknown_cmd_ids: AtomicU64,
    field_overflows: AtomicU64,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同步解码器计数（只由解码线程调用）
    pub(crate) fn publish(&self, stats: &DecoderStats) {
        self.bytes.store(stats.bytes, Ordering::Relaxed);
        self.frames_applied.store(stats.frames_applied, Ordering::Relaxed);
        self.invalid_length.store(stats.invalid_length, Ordering::Relaxed);
        self.header_crc_errors.store(stats.header_crc_errors, Ordering::Relaxed);
        self.payload_crc_errors.store(stats.payload_crc_errors, Ordering::Relaxed);
        self.unknown_cmd_ids.store(stats.unknown_cmd_ids, Ordering::Relaxed);
        self.field_overflows.store(stats.field_overflows, Ordering::Relaxed);
    }

    /// 读取当前计数
    ///
    /// 各计数器分别读取，与解码线程并发时不保证彼此同一时刻。
    pub fn snapshot(&self) -> DecoderStats {
        DecoderStats {
            bytes: self.bytes.load(Ordering::Relaxed),
            frames_applied: self.frames_applied.load(Ordering::Relaxed),
            invalid_length: self.invalid_length.load(Ordering::Relaxed),
            header_crc_errors: self.header_crc_errors.load(Ordering::Relaxed),
            payload_crc_errors: self.payload_crc_errors.load(Ordering::Relaxed),
            unknown_cmd_ids: self.unknown_cmd_ids.load(Ordering::Relaxed),
            field_overflows: self.field_overflows.load(Ordering::Relaxed),
        }
    }
}
