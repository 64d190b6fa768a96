//! # RM CAN Adapter Layer
//!
//! 总线与串口的传输抽象。设备层只依赖这里的 trait，
//! 不关心底层是 SocketCAN、USB 转 CAN 还是测试用的内存适配器。

use thiserror::Error;

// 重新导出 rm-protocol 中的 BusFrame
pub use rm_protocol::BusFrame;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockCanAdapter, MockSerial, SentLog};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("Bus off")]
    BusOff,
}

/// 只收（总线读原语）
pub trait RxAdapter {
    /// 读取一帧，在后端的读超时内没有数据时返回 [`CanError::Timeout`]
    fn receive(&mut self) -> Result<BusFrame, CanError>;

    /// 读取一帧，没有待读帧时返回 `Ok(None)`
    ///
    /// 默认实现把超时视为无帧。
    fn try_receive(&mut self) -> Result<Option<BusFrame>, CanError> {
        match self.receive() {
            Ok(frame) => Ok(Some(frame)),
            Err(CanError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// 只发（总线写原语）
pub trait TxAdapter {
    fn send(&mut self, frame: BusFrame) -> Result<(), CanError>;
}

/// 串口写原语（点对点链路）
pub trait SerialTx {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CanError>;
}
