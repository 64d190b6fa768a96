//! 内存适配器（无硬件）
//!
//! 所有写出的帧记录在共享的 [`SentLog`] 中，适配器被移入设备对象后仍可检查。

use crate::{BusFrame, CanError, RxAdapter, SerialTx, TxAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// 已写出记录（可克隆的共享句柄）
#[derive(Debug, Clone)]
pub struct SentLog<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> SentLog<T> {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, item: T) {
        self.inner.lock().push(item);
    }

    /// 取出并清空记录
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// 记录副本
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// 注入的失败次数（共享）
#[derive(Debug, Clone, Default)]
struct FailureBudget(Arc<Mutex<usize>>);

impl FailureBudget {
    fn consume(&self) -> bool {
        let mut remaining = self.0.lock();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    fn set(&self, count: usize) {
        *self.0.lock() = count;
    }
}

/// 内存 CAN 适配器
#[derive(Debug, Clone)]
pub struct MockCanAdapter {
    sent: SentLog<BusFrame>,
    receive_queue: Arc<Mutex<VecDeque<BusFrame>>>,
    failures: FailureBudget,
}

impl Default for MockCanAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCanAdapter {
    pub fn new() -> Self {
        Self {
            sent: SentLog::new(),
            receive_queue: Arc::new(Mutex::new(VecDeque::new())),
            failures: FailureBudget::default(),
        }
    }

    /// 写出记录句柄
    pub fn sent(&self) -> SentLog<BusFrame> {
        self.sent.clone()
    }

    /// 排入一帧待接收（克隆出的句柄共享同一接收队列）
    pub fn queue_frame(&self, frame: BusFrame) {
        self.receive_queue.lock().push_back(frame);
    }

    /// 接下来 `count` 次发送返回 [`CanError::BusOff`]
    pub fn fail_next(&self, count: usize) {
        self.failures.set(count);
    }

    fn write(&self, frame: BusFrame) -> Result<(), CanError> {
        if self.failures.consume() {
            return Err(CanError::BusOff);
        }
        trace!("Mock send 0x{:X}: {:02X?}", frame.id, frame.data_slice());
        self.sent.push(frame);
        Ok(())
    }
}

impl TxAdapter for MockCanAdapter {
    fn send(&mut self, frame: BusFrame) -> Result<(), CanError> {
        self.write(frame)
    }
}

impl RxAdapter for MockCanAdapter {
    fn receive(&mut self) -> Result<BusFrame, CanError> {
        self.receive_queue.lock().pop_front().ok_or(CanError::Timeout)
    }
}

/// 内存串口
#[derive(Debug, Clone)]
pub struct MockSerial {
    written: SentLog<Vec<u8>>,
    failures: FailureBudget,
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            written: SentLog::new(),
            failures: FailureBudget::default(),
        }
    }

    /// 写出记录句柄
    pub fn written(&self) -> SentLog<Vec<u8>> {
        self.written.clone()
    }

    /// 接下来 `count` 次写入返回 IO 错误
    pub fn fail_next(&self, count: usize) {
        self.failures.set(count);
    }
}

impl SerialTx for MockSerial {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CanError> {
        if self.failures.consume() {
            return Err(CanError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock serial write failure",
            )));
        }
        self.written.push(bytes.to_vec());
        Ok(())
    }
}
