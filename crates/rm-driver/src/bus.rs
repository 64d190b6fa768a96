//! 本末电机总线句柄
//!
//! 一条 CAN 总线对应一个 [`DirectDriveBus`]，它独占该总线的写端和驱动指令暂存区。
//! 电机对象持有 `Arc<DirectDriveBus<_>>`，多个线程可以共享同一总线，
//! 暂存区访问由内部互斥锁保护。

use crate::DriverError;
use crate::coalescer::TxCoalescer;
use parking_lot::Mutex;
use rm_can::TxAdapter;
use rm_protocol::directdrive::{
    DISABLE, ENABLE, Mode, TxHalf, check_ordinal, mode_control_frame, set_mode_frame,
    software_reset_frame,
};
use tracing::{debug, info, trace};

struct BusInner<T> {
    tx: T,
    coalescer: TxCoalescer,
    /// 每台电机的使能字节（`0x105`）
    enable_table: [u8; 8],
    /// 每台电机的模式码（`0x106`）
    mode_table: [u8; 8],
    /// 已挂载电机的位图（bit n-1 表示 n 号）
    attached: u8,
}

/// 本末电机总线
pub struct DirectDriveBus<T: TxAdapter> {
    name: String,
    inner: Mutex<BusInner<T>>,
}

impl<T: TxAdapter> std::fmt::Debug for DirectDriveBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectDriveBus").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<T: TxAdapter> DirectDriveBus<T> {
    pub fn new(name: impl Into<String>, tx: T) -> Self {
        let name = name.into();
        info!("DirectDrive bus {} created", name);
        Self {
            name,
            inner: Mutex::new(BusInner {
                tx,
                coalescer: TxCoalescer::new(),
                enable_table: [DISABLE; 8],
                mode_table: [u8::from(Mode::Current); 8],
                attached: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 登记 `ordinal` 号电机，同一序号只能挂载一次
    pub(crate) fn attach(&self, ordinal: u8) -> Result<(), DriverError> {
        let ordinal = check_ordinal(ordinal)?;
        let mut inner = self.inner.lock();
        let bit = 1u8 << (ordinal - 1);
        if inner.attached & bit != 0 {
            return Err(DriverError::MotorAlreadyAttached {
                bus: self.name.clone(),
                id: ordinal,
            });
        }
        inner.attached |= bit;
        debug!("Motor {} attached to bus {}", ordinal, self.name);
        Ok(())
    }

    pub(crate) fn detach(&self, ordinal: u8) {
        if let Ok(ordinal) = check_ordinal(ordinal) {
            self.inner.lock().attached &= !(1u8 << (ordinal - 1));
        }
    }

    /// 暂存一台电机的控制量（不发送）
    pub fn stage(&self, ordinal: u8, raw: i16) -> Result<(), DriverError> {
        self.inner.lock().coalescer.set(ordinal, raw.to_be_bytes())?;
        Ok(())
    }

    /// 半区是否有待发送的修改
    pub fn is_dirty(&self, half: TxHalf) -> bool {
        self.inner.lock().coalescer.is_dirty(half)
    }

    /// 发出本总线上被修改的驱动指令，返回写出的帧数
    pub fn flush(&self) -> Result<usize, DriverError> {
        let mut inner = self.inner.lock();
        let BusInner { tx, coalescer, .. } = &mut *inner;
        Ok(coalescer.flush(tx)?)
    }

    /// 使能/失能一台电机（立即发送整张使能表）
    pub fn enable(&self, ordinal: u8, enabled: bool) -> Result<(), DriverError> {
        let ordinal = check_ordinal(ordinal)?;
        let mut inner = self.inner.lock();
        inner.enable_table[ordinal as usize - 1] = if enabled { ENABLE } else { DISABLE };
        let frame = mode_control_frame(&inner.enable_table);
        trace!("Bus {}: motor {} enable={}", self.name, ordinal, enabled);
        inner.tx.send(frame)?;
        Ok(())
    }

    /// 切换一台电机的工作模式（立即发送整张模式表）
    pub fn set_mode(&self, ordinal: u8, mode: Mode) -> Result<(), DriverError> {
        let ordinal = check_ordinal(ordinal)?;
        let mut inner = self.inner.lock();
        inner.mode_table[ordinal as usize - 1] = mode.into();
        let frame = set_mode_frame(&inner.mode_table);
        trace!("Bus {}: motor {} mode={:?}", self.name, ordinal, mode);
        inner.tx.send(frame)?;
        Ok(())
    }

    /// 软件复位总线上所有电机
    pub fn reset_all(&self) -> Result<(), DriverError> {
        info!("Bus {}: software reset", self.name);
        self.inner.lock().tx.send(software_reset_frame())?;
        Ok(())
    }
}

/// 依次 flush 多条总线，返回写出的总帧数
///
/// 每条总线都会尝试；任一失败时返回第一个错误，失败的半区留待下次重发。
pub fn flush_all<'a, T, I>(buses: I) -> Result<usize, DriverError>
where
    T: TxAdapter + 'a,
    I: IntoIterator<Item = &'a DirectDriveBus<T>>,
{
    let mut written = 0;
    let mut first_error = None;
    for bus in buses {
        match bus.flush() {
            Ok(n) => written += n,
            Err(e) => {
                first_error.get_or_insert(e);
            },
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(written),
    }
}
