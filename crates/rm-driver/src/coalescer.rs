//! 驱动指令合并发送
//!
//! 一条总线最多 8 台电机，每台 2 字节控制量，共 16 字节暂存区，
//! 对应两帧 8 字节的驱动指令。只有被修改过的半区会在 flush 时发出。

use rm_can::{BusFrame, CanError, TxAdapter};
use rm_protocol::ProtocolError;
use rm_protocol::directdrive::{TxHalf, check_ordinal, command_offset, drive_frame};
use smallvec::SmallVec;
use tracing::{trace, warn};

const HALVES: [TxHalf; 2] = [TxHalf::Low, TxHalf::High];

fn half_index(half: TxHalf) -> usize {
    match half {
        TxHalf::Low => 0,
        TxHalf::High => 1,
    }
}

/// 单条总线的驱动指令暂存区
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxCoalescer {
    staging: [u8; 16],
    dirty: [bool; 2],
}

impl TxCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入第 `ordinal` 号电机（1~8）的控制量，并标记所在半区
    pub fn set(&mut self, ordinal: u8, encoded: [u8; 2]) -> Result<(), ProtocolError> {
        let ordinal = check_ordinal(ordinal)?;
        let offset = command_offset(ordinal);
        self.staging[offset..offset + 2].copy_from_slice(&encoded);
        self.dirty[half_index(TxHalf::of(ordinal))] = true;
        Ok(())
    }

    pub fn is_dirty(&self, half: TxHalf) -> bool {
        self.dirty[half_index(half)]
    }

    /// 暂存区原始内容
    pub fn staging(&self) -> &[u8; 16] {
        &self.staging
    }

    /// 待发送的帧（按 1~4、5~8 的顺序）
    pub fn pending(&self) -> SmallVec<[(TxHalf, BusFrame); 2]> {
        HALVES
            .iter()
            .filter(|half| self.is_dirty(**half))
            .map(|&half| {
                let offset = half.offset();
                let mut data = [0u8; 8];
                data.copy_from_slice(&self.staging[offset..offset + 8]);
                (half, drive_frame(half, &data))
            })
            .collect()
    }

    /// 发出所有被修改的半区，返回成功写出的帧数
    ///
    /// 写入失败的半区保持脏标记，下次 flush 重发；两个半区都会尝试，返回第一个错误。
    pub fn flush<T: TxAdapter + ?Sized>(&mut self, tx: &mut T) -> Result<usize, CanError> {
        let mut written = 0;
        let mut first_error = None;

        for (half, frame) in self.pending() {
            match tx.send(frame) {
                Ok(()) => {
                    trace!("Drive frame 0x{:X} sent: {:02X?}", frame.id, frame.data);
                    self.dirty[half_index(half)] = false;
                    written += 1;
                },
                Err(e) => {
                    warn!("Drive frame 0x{:X} write failed, kept for retry: {}", frame.id, e);
                    first_error.get_or_insert(e);
                },
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}
